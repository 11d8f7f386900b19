//! The ModuleBus contract and published property names.
//!
//! The hub-wide module registry and event bus live outside this workspace;
//! the engine only needs two things from them: a way to raise events for the
//! properties it publishes, and a parameter-set side effect on each program's
//! mirror module.

use crate::module::ProgramHandle;

/// Event source name used for everything the program manager publishes.
pub const EVENT_SOURCE: &str = "Automation Program";

/// Published property: program lifecycle status.
pub const PROP_PROGRAM_STATUS: &str = "ProgramStatus";

/// Published property: last runtime error ("TC: …" / "CR: …").
pub const PROP_RUNTIME_ERROR: &str = "RuntimeError";

/// Observable program status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramStatus {
    /// No body is executing.
    Idle,
    /// A body is executing.
    Running,
    /// A body was terminated on request.
    Interrupted,
    /// The program was switched on.
    Enabled,
    /// The program was switched off.
    Disabled,
}

impl ProgramStatus {
    /// The string value published on the bus.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Interrupted => "Interrupted",
            Self::Enabled => "Enabled",
            Self::Disabled => "Disabled",
        }
    }
}

impl std::fmt::Display for ProgramStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound contract toward the hub's module bus.
///
/// Implementations must tolerate calls from any engine thread and must not
/// call back into the engine synchronously: some publications happen while a
/// program's operation lock is held.
pub trait ModuleBus: Send + Sync {
    /// Raise a hub event for a published program property.
    fn raise_event(
        &self,
        program: &ProgramHandle,
        domain: &str,
        source: &str,
        property: &str,
        value: &str,
    );

    /// Set a parameter on the program's mirror module.
    fn set_program_parameter(&self, program: &ProgramHandle, parameter: &str, value: &str);
}
