//! domo Common Library
//!
//! This crate provides the shared contracts, constants and configuration
//! loading utilities for all domo workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - System-wide constants and default paths
//! - [`config`] - Configuration loading traits and types
//! - [`error`] - Program error records and message sanitization
//! - [`module`] - Module identities, parameters and property-change events
//! - [`host`] - The ScriptHost contract consumed by the engine
//! - [`bus`] - The ModuleBus contract and published property names
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use domo_common::prelude::*;
//! ```

pub mod bus;
pub mod config;
pub mod consts;
pub mod error;
pub mod host;
pub mod module;
pub mod prelude;
