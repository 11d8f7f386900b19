//! Two-stage delivery of module property changes.
//!
//! The pre-change stage runs synchronously on the bus caller's thread and may
//! veto further propagation; the post-change stage is handed to the dispatch
//! pool and, per program, both invokes the post-change hook and independently
//! submits a trigger re-evaluation. All pre-change observations of an event
//! complete before its first post-change observation.
//!
//! Both stages iterate a registry snapshot in insertion order, so concurrent
//! add/remove never corrupts a pass in flight.

use crate::evaluator::ConditionEvaluator;
use crate::manager::EngineFlags;
use crate::pool::DispatchPool;
use crate::record::ProgramRecord;
use crate::registry::ProgramRegistry;
use crate::runner::ProgramRunner;
use domo_common::module::PropertyChange;
use std::sync::Arc;
use tracing::trace;

/// Routes property changes through all enabled programs' hooks.
pub struct EventRouter {
    registry: Arc<ProgramRegistry>,
    flags: Arc<EngineFlags>,
    evaluator: Arc<ConditionEvaluator>,
    runner: Arc<ProgramRunner>,
    pool: Arc<DispatchPool>,
}

impl EventRouter {
    pub fn new(
        registry: Arc<ProgramRegistry>,
        flags: Arc<EngineFlags>,
        evaluator: Arc<ConditionEvaluator>,
        runner: Arc<ProgramRunner>,
        pool: Arc<DispatchPool>,
    ) -> Self {
        Self {
            registry,
            flags,
            evaluator,
            runner,
            pool,
        }
    }

    /// Deliver one property change.
    ///
    /// Runs the pre-change stage synchronously; when propagation survives,
    /// schedules the post-change stage and returns `true`. A `false` return
    /// tells the bus that a program vetoed (or rewrote) the change.
    ///
    /// Within the post-change pass, hook invocation and trigger re-evaluation
    /// are dispatched concurrently per program with no mutual ordering.
    pub fn on_property_change(&self, change: &mut PropertyChange) -> bool {
        if !self.run_pre_change(change) {
            return false;
        }

        let registry = Arc::clone(&self.registry);
        let flags = Arc::clone(&self.flags);
        let evaluator = Arc::clone(&self.evaluator);
        let runner = Arc::clone(&self.runner);
        let pool = Arc::clone(&self.pool);
        let change = change.clone();
        self.pool.submit(move || {
            run_post_change(&registry, &flags, &evaluator, &runner, &pool, change);
        });
        true
    }

    /// Pre-change stage: any enabled program may veto or rewrite.
    ///
    /// Self-echoes are suppressed by sender address.
    fn run_pre_change(&self, change: &mut PropertyChange) -> bool {
        let original = change.parameter.value.clone();
        for program in self.registry.snapshot() {
            if !program.is_enabled() {
                continue;
            }
            if change.sender.is_program_address(program.address()) {
                continue;
            }
            let Some(hook) = program.pre_change_hook() else {
                continue;
            };
            if !hook(&change.module, &mut change.parameter) {
                trace!(address = program.address(), "pre-change veto");
                return false;
            }
            if change.parameter.value != original {
                // A rewrite is terminal for the whole propagation.
                trace!(address = program.address(), "pre-change rewrite, halting");
                return false;
            }
        }
        true
    }
}

/// Post-change stage, running on a dispatch worker.
///
/// Self-echoes are suppressed by program identity.
fn run_post_change(
    registry: &Arc<ProgramRegistry>,
    flags: &Arc<EngineFlags>,
    evaluator: &Arc<ConditionEvaluator>,
    runner: &Arc<ProgramRunner>,
    pool: &Arc<DispatchPool>,
    mut change: PropertyChange,
) {
    let original = change.parameter.value.clone();
    for program in registry.snapshot() {
        if !program.is_enabled() {
            continue;
        }
        if change.sender.is_same_program(&program.handle()) {
            continue;
        }

        // Trigger re-evaluation, independent of the hook below.
        if !program.is_running() && flags.is_running() && flags.is_enabled() {
            let evaluator = Arc::clone(evaluator);
            let runner = Arc::clone(runner);
            let candidate = Arc::clone(&program);
            pool.submit(move || {
                if evaluator.should_run(&candidate) {
                    runner.start(&candidate, None);
                }
            });
        }

        if let Some(hook) = program.post_change_hook() {
            if !hook(&change.module, &mut change.parameter) {
                trace!(address = program.address(), "post-change halt");
                break;
            }
            if change.parameter.value != original {
                trace!(address = program.address(), "post-change rewrite, halting");
                break;
            }
        }
    }
}
