//! Module identities, parameters and property-change events.
//!
//! These are the shared vocabulary between the hub's module bus and the
//! program manager: a [`PropertyChange`] travels from the bus into the
//! engine's event router, which fans it out through program hooks.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Stable identity of a hosted program, usable across subsystem boundaries.
///
/// Carries both representations of "this program" that callers compare
/// against: the numeric address and an object identity token. The synchronous
/// pre-change stage suppresses self-echoes by address, the asynchronous
/// post-change stage by identity; callers constructing a [`ChangeSender`] for
/// a program must use the handle obtained from that program's record so both
/// comparisons agree.
#[derive(Debug, Clone)]
pub struct ProgramHandle {
    /// Program address (≥ `USER_SPACE_BASE`).
    pub address: u32,
    identity: Arc<()>,
}

impl ProgramHandle {
    /// Create a fresh handle with a new identity token.
    pub fn new(address: u32) -> Self {
        Self {
            address,
            identity: Arc::new(()),
        }
    }

    /// True when both handles denote the same program instance.
    pub fn same_program(&self, other: &ProgramHandle) -> bool {
        Arc::ptr_eq(&self.identity, &other.identity)
    }
}

/// Display identity of a hub module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRef {
    /// Module domain, e.g. `HomeAutomation.ZWave`.
    pub domain: String,
    /// Module address within the domain.
    pub address: String,
}

impl ModuleRef {
    pub fn new(domain: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            address: address.into(),
        }
    }
}

/// One named parameter of a module.
///
/// Pre-change and post-change hooks receive the parameter mutably; a hook
/// that rewrites `value` terminates further propagation of the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleParameter {
    /// Parameter name, e.g. `Status.Level`.
    pub name: String,
    /// Current value, stringly typed as on the bus.
    pub value: String,
}

impl ModuleParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Originator of a property change.
#[derive(Debug, Clone)]
pub enum ChangeSender {
    /// A hosted automation program (its own writes echo back on the bus).
    Program(ProgramHandle),
    /// Any other bus participant, identified by module address.
    Module(String),
}

impl ChangeSender {
    /// Address comparison, used by the synchronous pre-change stage.
    pub fn is_program_address(&self, address: u32) -> bool {
        match self {
            Self::Program(handle) => handle.address == address,
            Self::Module(_) => false,
        }
    }

    /// Identity comparison, used by the asynchronous post-change stage.
    pub fn is_same_program(&self, handle: &ProgramHandle) -> bool {
        match self {
            Self::Program(sender) => sender.same_program(handle),
            Self::Module(_) => false,
        }
    }
}

/// A module property change travelling through the event router.
#[derive(Debug, Clone)]
pub struct PropertyChange {
    /// Who produced the change.
    pub sender: ChangeSender,
    /// The module whose parameter changed.
    pub module: ModuleRef,
    /// The changed parameter; hooks may mutate its value.
    pub parameter: ModuleParameter,
}
