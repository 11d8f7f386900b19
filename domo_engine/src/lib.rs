//! # domo Program Manager
//!
//! Hosts a collection of user-authored automation programs, each pairing a
//! trigger condition with an action body. Triggers are re-evaluated against
//! incoming module property changes and a one-minute wall-clock tick; bodies
//! execute with single-flight isolation and per-program fault containment.
//!
//! ## Architecture
//!
//! ```text
//! ModuleBus ──PropertyChange──► EventRouter ──pre-change──► program hooks
//!                                    │
//!                                    └─post-change─► DispatchPool ─► ConditionEvaluator ─► ProgramRunner
//!                                                         │
//! TickScheduler (1/min per program) ──────────────────────┘
//! ```
//!
//! ## Fault Containment
//!
//! The unit of isolation is one program: a runtime fault in its condition or
//! body disables that program and publishes a `RuntimeError`, and nothing
//! escapes into the router or the tick loop.

pub mod api;
pub mod evaluator;
pub mod manager;
pub mod pool;
pub mod publisher;
pub mod record;
pub mod registry;
pub mod router;
pub mod runner;
pub mod scheduler;

pub use api::DynamicApiRegistry;
pub use evaluator::ConditionEvaluator;
pub use manager::ProgramManager;
pub use pool::DispatchPool;
pub use record::{ConditionType, ProgramRecord};
pub use router::EventRouter;
pub use runner::ProgramRunner;
pub use scheduler::TickScheduler;
