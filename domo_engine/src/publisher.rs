//! Status and error publication toward the module bus.
//!
//! Everything the engine publishes goes through here: a hub event with
//! `source = "Automation Program"` plus the parameter-set side effect on the
//! program's mirror module.

use crate::record::ProgramRecord;
use domo_common::bus::{EVENT_SOURCE, ModuleBus, PROP_PROGRAM_STATUS, PROP_RUNTIME_ERROR, ProgramStatus};
use domo_common::error::{CodeBlock, sanitize_message};
use std::sync::Arc;
use tracing::debug;

/// Shared handle for publishing program properties.
#[derive(Clone)]
pub struct StatusPublisher {
    bus: Arc<dyn ModuleBus>,
}

impl StatusPublisher {
    pub fn new(bus: Arc<dyn ModuleBus>) -> Self {
        Self { bus }
    }

    /// Publish a `ProgramStatus` value.
    pub fn publish_status(&self, program: &ProgramRecord, status: ProgramStatus) {
        debug!(address = program.address(), %status, "program status");
        let handle = program.handle();
        self.bus.raise_event(
            &handle,
            program.domain(),
            EVENT_SOURCE,
            PROP_PROGRAM_STATUS,
            status.as_str(),
        );
        self.bus
            .set_program_parameter(&handle, PROP_PROGRAM_STATUS, status.as_str());
    }

    /// Publish a `RuntimeError` value, prefixed by code block and flattened
    /// to a single line.
    pub fn publish_runtime_error(&self, program: &ProgramRecord, block: CodeBlock, message: &str) {
        let value = format!("{}: {}", block.prefix(), sanitize_message(message));
        debug!(address = program.address(), %value, "program runtime error");
        let handle = program.handle();
        self.bus.raise_event(
            &handle,
            program.domain(),
            EVENT_SOURCE,
            PROP_RUNTIME_ERROR,
            &value,
        );
        self.bus
            .set_program_parameter(&handle, PROP_RUNTIME_ERROR, &value);
    }
}
