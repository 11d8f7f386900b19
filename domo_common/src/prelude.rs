//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use domo_common::prelude::*;` and get
//! the most important types without listing individual paths.

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, EngineConfig, LogLevel, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{TICK_PERIOD_S, USER_SPACE_BASE};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{CodeBlock, ProgramError, sanitize_message, serialize_errors};

// ─── Modules & Events ───────────────────────────────────────────────
pub use crate::module::{ChangeSender, ModuleParameter, ModuleRef, ProgramHandle, PropertyChange};

// ─── Contracts ──────────────────────────────────────────────────────
pub use crate::bus::{ModuleBus, ProgramStatus};
pub use crate::host::{FaultKind, ScriptFault, ScriptHandle, ScriptHandles, ScriptHost};
