//! Action body execution.
//!
//! Each run gets a fresh worker thread whose lifetime is exactly one body
//! execution. The single-flight rule is enforced under the program's
//! operation lock: a start request for a program whose body is already
//! active is a silent no-op, never a queue.
//!
//! Body state machine: `Idle → Running → (Idle | Interrupted → Idle)`.

use crate::publisher::StatusPublisher;
use crate::record::{ConditionType, ProgramRecord};
use domo_common::bus::ProgramStatus;
use domo_common::error::{CodeBlock, ProgramError};
use domo_common::host::{FaultKind, ScriptFault, ScriptHost};
use std::sync::Arc;
use tracing::{debug, warn};

/// Starts and stops program bodies.
pub struct ProgramRunner {
    host: Arc<dyn ScriptHost>,
    publisher: StatusPublisher,
}

impl ProgramRunner {
    pub fn new(host: Arc<dyn ScriptHost>, publisher: StatusPublisher) -> Self {
        Self { host, publisher }
    }

    /// Start the action body at most once.
    ///
    /// Returns immediately in every case; the body runs on its own worker.
    /// A `Once` program is disabled before the body is dispatched.
    pub fn start(&self, program: &Arc<ProgramRecord>, options: Option<&str>) {
        let _operation = program.lock_operation();

        if program.is_running() {
            debug!(address = program.address(), "body already active, ignoring");
            return;
        }

        // A finished worker may not have released its own handle yet.
        if program.take_body_worker().is_some() {
            self.host.stop(&program.handle());
            program.set_running(false);
        }

        program.set_running(true);
        program.mark_triggered();
        self.publisher.publish_status(program, ProgramStatus::Running);

        if program.condition_type() == ConditionType::Once {
            program.set_enabled(false);
        }

        let host = Arc::clone(&self.host);
        let publisher = self.publisher.clone();
        let worker_program = Arc::clone(program);
        let options = options.map(String::from);

        let spawned = std::thread::Builder::new()
            .name(format!("domo-body-{}", program.address()))
            .spawn(move || {
                let result = host.run(&worker_program.handle(), options.as_deref());
                worker_program.set_running(false);
                if let Err(fault) = result {
                    Self::handle_fault(&publisher, &worker_program, &fault);
                }
                publisher.publish_status(&worker_program, ProgramStatus::Idle);
                worker_program.take_body_worker();
            });

        match spawned {
            Ok(worker) => program.store_body_worker(worker),
            Err(e) => {
                // Silent abort: back to Idle, no error recorded.
                warn!(address = program.address(), error = %e, "body worker start failed");
                program.set_running(false);
                self.host.stop(&program.handle());
                self.publisher.publish_status(program, ProgramStatus::Idle);
            }
        }
    }

    /// Request termination of any active body run.
    ///
    /// No join deadline is imposed; the worker publishes `Interrupted` and
    /// `Idle` itself once the host yields.
    pub fn stop(&self, program: &Arc<ProgramRecord>) {
        let had_worker = program.take_body_worker().is_some();
        if had_worker || program.is_running() {
            self.host.stop(&program.handle());
        }
    }

    /// Body fault pipeline: user faults quarantine the program, an
    /// interruption is only published, benign faults are ignored.
    fn handle_fault(publisher: &StatusPublisher, program: &Arc<ProgramRecord>, fault: &ScriptFault) {
        match fault.kind {
            FaultKind::Benign => {}
            FaultKind::Interrupted => {
                publisher.publish_status(program, ProgramStatus::Interrupted);
            }
            FaultKind::User => {
                warn!(
                    address = program.address(),
                    message = %fault.message,
                    "body fault, disabling program"
                );
                program.set_script_errors(vec![ProgramError {
                    line: fault.line,
                    column: fault.column,
                    message: fault.message.clone(),
                    number: fault.number,
                    code_block: CodeBlock::Cr,
                }]);
                program.set_enabled(false);
                publisher.publish_runtime_error(program, CodeBlock::Cr, &fault.message);
            }
        }
    }
}
