//! Trigger condition evaluation.
//!
//! Applies the program's trigger mode (level / edge / once) on top of the raw
//! boolean the ScriptHost produces, and quarantines condition faults: a user
//! fault during evaluation disables the program and publishes a `TC:` runtime
//! error before anything else is delivered to it.
//!
//! Evaluation runs under the program's operation lock, which serializes it
//! with itself and with body entry. Two evaluations of the same program never
//! interleave; tick-driven and event-driven evaluations contend on the same
//! lock without FIFO ordering.

use crate::publisher::StatusPublisher;
use crate::record::{ConditionType, ProgramRecord};
use domo_common::error::{CodeBlock, ProgramError};
use domo_common::host::{FaultKind, ScriptFault, ScriptHost};
use std::sync::Arc;
use tracing::{trace, warn};

/// Decides whether a program's body should run now.
pub struct ConditionEvaluator {
    host: Arc<dyn ScriptHost>,
    publisher: StatusPublisher,
}

impl ConditionEvaluator {
    pub fn new(host: Arc<dyn ScriptHost>, publisher: StatusPublisher) -> Self {
        Self { host, publisher }
    }

    /// Evaluate the trigger and apply the mode table.
    ///
    /// Edges are detected against the previous evaluation's raw result,
    /// irrespective of how much time elapsed between the two. The final
    /// decision re-checks enablement because a fault above may just have
    /// disabled the program.
    pub fn should_run(&self, program: &Arc<ProgramRecord>) -> bool {
        let _operation = program.lock_operation();
        if !program.is_enabled() {
            // A concurrent evaluation may have quarantined the program while
            // this call was waiting on the lock.
            return false;
        }
        program.clear_will_run();

        let raw = match self.host.evaluate_condition(&program.handle()) {
            Ok(value) => value,
            Err(fault) => {
                self.handle_fault(program, &fault);
                false
            }
        };

        let previous = program.last_condition_result();
        program.set_last_condition_result(raw);

        let satisfied = match program.condition_type() {
            ConditionType::OnTrue | ConditionType::Once => raw,
            ConditionType::OnFalse => !raw,
            ConditionType::OnSwitchTrue => raw && raw != previous,
            ConditionType::OnSwitchFalse => !raw && raw != previous,
        };

        let decision = satisfied && program.is_enabled();
        if decision {
            program.set_will_run();
        }
        trace!(
            address = program.address(),
            raw, previous, decision, "condition evaluated"
        );
        decision
    }

    /// Condition fault pipeline: only user faults disable the program.
    fn handle_fault(&self, program: &Arc<ProgramRecord>, fault: &ScriptFault) {
        match fault.kind {
            FaultKind::Benign | FaultKind::Interrupted => {}
            FaultKind::User => {
                warn!(
                    address = program.address(),
                    message = %fault.message,
                    "condition fault, disabling program"
                );
                program.set_script_errors(vec![ProgramError {
                    line: fault.line,
                    column: fault.column,
                    message: fault.message.clone(),
                    number: fault.number,
                    code_block: CodeBlock::Tc,
                }]);
                program.set_enabled(false);
                self.publisher
                    .publish_runtime_error(program, CodeBlock::Tc, &fault.message);
            }
        }
    }
}
