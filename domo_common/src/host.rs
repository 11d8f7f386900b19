//! The ScriptHost contract consumed by the program manager.
//!
//! Script language hosts compile and evaluate program code; the engine only
//! ever talks to them through this trait. The trait is deliberately thin — it
//! captures the four operations the engine needs, without mandating a
//! particular language or compilation strategy.

use crate::error::ProgramError;
use crate::module::ProgramHandle;

/// Opaque reference to a compiled script unit owned by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptHandle(pub u64);

/// Compiled condition/body references stored on a program record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptHandles {
    /// Compiled trigger condition, if any.
    pub condition: Option<ScriptHandle>,
    /// Compiled action body, if any.
    pub body: Option<ScriptHandle>,
}

/// Classification of a script fault at the host boundary.
///
/// Only [`FaultKind::User`] flows into the engine's disable pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A genuine fault in user code.
    User,
    /// A host-internal dispatch wrapper with no user-visible meaning;
    /// the engine ignores it entirely.
    Benign,
    /// The run was terminated on request (`stop`).
    Interrupted,
}

/// A fault raised while evaluating a condition or running a body.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ScriptFault {
    /// Human-readable message (may span multiple lines).
    pub message: String,
    /// Source line (0 when unknown).
    pub line: u32,
    /// Source column (0 when unknown).
    pub column: u32,
    /// Host-specific error number (0 when unknown).
    pub number: u32,
    /// Fault classification.
    pub kind: FaultKind,
}

impl ScriptFault {
    /// Build a user fault with just a message.
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: 0,
            column: 0,
            number: 0,
            kind: FaultKind::User,
        }
    }

    /// Build a benign host-internal fault.
    pub fn benign(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Benign,
            ..Self::user(message)
        }
    }

    /// Build an interruption marker for a stopped run.
    pub fn interrupted() -> Self {
        Self {
            kind: FaultKind::Interrupted,
            ..Self::user("stopped")
        }
    }
}

/// Contract between the program manager and a scripting language host.
///
/// Implementations must be safe to call from multiple engine threads: tick
/// schedulers, dispatch pool workers and body workers all reach the host
/// concurrently (for different programs).
pub trait ScriptHost: Send + Sync {
    /// Compile the program's condition and body.
    ///
    /// Returns compile diagnostics; an empty list means success. Compile
    /// errors never auto-disable a program.
    fn compile(&self, program: &ProgramHandle) -> Vec<ProgramError>;

    /// Evaluate the trigger condition.
    ///
    /// A host whose script yields no value reports `Ok(false)`.
    fn evaluate_condition(&self, program: &ProgramHandle) -> Result<bool, ScriptFault>;

    /// Execute the action body with the given options string.
    ///
    /// Blocks until the body finishes, faults, or is stopped; a stopped run
    /// reports a fault with [`FaultKind::Interrupted`].
    fn run(
        &self,
        program: &ProgramHandle,
        options: Option<&str>,
    ) -> Result<Option<serde_json::Value>, ScriptFault>;

    /// Request termination of any active body run for this program.
    fn stop(&self, program: &ProgramHandle);
}
