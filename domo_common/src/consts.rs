//! System-wide constants for the domo workspace.
//!
//! Single source of truth for all numeric limits and default paths.
//! Imported by all crates — no duplication permitted.

/// First address available for user-authored programs.
///
/// Addresses below this value are reserved for built-in hub modules.
pub const USER_SPACE_BASE: u32 = 1000;

/// Trigger re-evaluation cadence [s] (one wall-clock minute).
pub const TICK_PERIOD_S: u64 = 60;

/// Deadline when joining a stopping scheduler worker [ms].
pub const SCHEDULER_STOP_TIMEOUT_MS: u64 = 1000;

/// Default number of workers in the post-change dispatch pool.
pub const DISPATCH_WORKERS_DEFAULT: usize = 4;

/// Minimum allowed dispatch pool size.
pub const DISPATCH_WORKERS_MIN: usize = 1;

/// Maximum allowed dispatch pool size.
pub const DISPATCH_WORKERS_MAX: usize = 64;

/// Default directory holding per-program compiled artifacts.
pub const DEFAULT_PROGRAMS_PATH: &str = "programs";

/// Subdirectory of the programs directory holding generated sources.
pub const ARDUINO_SUBDIR: &str = "arduino";

/// Default domain for program mirror modules.
pub const PROGRAMS_DOMAIN: &str = "Automation.Programs";
