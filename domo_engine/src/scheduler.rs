//! Per-program minute-aligned trigger scheduling.
//!
//! Each enabled program owns one long-lived worker that wakes at every
//! wall-clock minute boundary, re-evaluates the trigger and possibly starts
//! the body. The sleeping wait is interruptible so a stop normally completes
//! well within its 1-second deadline.
//!
//! Rust threads cannot be force-terminated: when a worker misses the join
//! deadline (a host evaluation that refuses to yield), it is abandoned with
//! its cancel flag set and exits on its own at the next wake. A re-enable
//! always starts a fresh worker with a fresh flag.

use crate::evaluator::ConditionEvaluator;
use crate::manager::EngineFlags;
use crate::record::ProgramRecord;
use crate::runner::ProgramRunner;
use domo_common::consts::SCHEDULER_STOP_TIMEOUT_MS;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Cancellable sleep shared between a worker and its owner.
struct CancelSignal {
    cancelled: Mutex<bool>,
    condvar: Condvar,
}

impl CancelSignal {
    fn new() -> Self {
        Self {
            cancelled: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    fn cancel(&self) {
        *self.cancelled.lock() = true;
        self.condvar.notify_all();
    }

    fn is_cancelled(&self) -> bool {
        *self.cancelled.lock()
    }

    /// Sleep up to `timeout`; returns true when cancelled.
    fn wait_for(&self, timeout: Duration) -> bool {
        let mut cancelled = self.cancelled.lock();
        if *cancelled {
            return true;
        }
        self.condvar.wait_for(&mut cancelled, timeout);
        *cancelled
    }
}

struct SchedulerWorker {
    signal: Arc<CancelSignal>,
    thread: JoinHandle<()>,
    thread_id: ThreadId,
}

/// Owns the per-program tick workers.
pub struct TickScheduler {
    flags: Arc<EngineFlags>,
    evaluator: Arc<ConditionEvaluator>,
    runner: Arc<ProgramRunner>,
    workers: Mutex<HashMap<u32, SchedulerWorker>>,
}

impl TickScheduler {
    pub fn new(
        flags: Arc<EngineFlags>,
        evaluator: Arc<ConditionEvaluator>,
        runner: Arc<ProgramRunner>,
    ) -> Self {
        Self {
            flags,
            evaluator,
            runner,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Start the tick worker for a program; replaces any previous worker.
    pub fn start(&self, program: &Arc<ProgramRecord>) {
        self.stop(program.address());

        let signal = Arc::new(CancelSignal::new());
        let worker_signal = Arc::clone(&signal);
        let flags = Arc::clone(&self.flags);
        let evaluator = Arc::clone(&self.evaluator);
        let runner = Arc::clone(&self.runner);
        let worker_program = Arc::clone(program);

        let spawned = std::thread::Builder::new()
            .name(format!("domo-tick-{}", program.address()))
            .spawn(move || {
                tick_loop(&worker_program, &worker_signal, &flags, &evaluator, &runner);
            });

        match spawned {
            Ok(thread) => {
                let thread_id = thread.thread().id();
                self.workers.lock().insert(
                    program.address(),
                    SchedulerWorker {
                        signal,
                        thread,
                        thread_id,
                    },
                );
            }
            Err(e) => {
                warn!(address = program.address(), error = %e, "tick worker start failed");
            }
        }
    }

    /// Stop the tick worker for a program, joining with the stop deadline.
    ///
    /// When called from the worker's own thread (a disable taking effect
    /// mid-tick), the join is skipped: the cancel flag alone ends the loop.
    pub fn stop(&self, address: u32) {
        let Some(worker) = self.workers.lock().remove(&address) else {
            return;
        };
        worker.signal.cancel();

        if std::thread::current().id() == worker.thread_id {
            debug!(address, "tick worker stopping itself");
            return;
        }

        let deadline = Instant::now() + Duration::from_millis(SCHEDULER_STOP_TIMEOUT_MS);
        while Instant::now() < deadline {
            if worker.thread.is_finished() {
                let _ = worker.thread.join();
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        // Abandoned: the cancel flag makes it exit at its next wake.
        warn!(address, "tick worker missed stop deadline, abandoning");
    }

    /// Stop every worker (engine shutdown).
    pub fn stop_all(&self) {
        let addresses: Vec<u32> = self.workers.lock().keys().copied().collect();
        for address in addresses {
            self.stop(address);
        }
    }
}

/// Worker loop: sleep to the minute boundary, re-evaluate, maybe run.
fn tick_loop(
    program: &Arc<ProgramRecord>,
    signal: &Arc<CancelSignal>,
    flags: &Arc<EngineFlags>,
    evaluator: &Arc<ConditionEvaluator>,
    runner: &Arc<ProgramRunner>,
) {
    debug!(address = program.address(), "tick worker started");
    loop {
        let sleep = delay_to_next_minute(SystemTime::now());
        if signal.wait_for(sleep) {
            break;
        }
        if !flags.is_running() || signal.is_cancelled() {
            break;
        }
        if !program.is_enabled() {
            break;
        }
        if program.is_running() || !flags.is_enabled() {
            continue;
        }
        if evaluator.should_run(program) {
            runner.start(program, None);
        }
    }
    debug!(address = program.address(), "tick worker exited");
}

/// Time remaining until the next wall-clock minute boundary.
fn delay_to_next_minute(now: SystemTime) -> Duration {
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    Duration::from_secs(60 - (since_epoch.as_secs() % 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1_000_020 = 60 × 16_667, a minute boundary.
    const BOUNDARY_S: u64 = 1_000_020;

    #[test]
    fn delay_counts_down_to_the_boundary() {
        let base = UNIX_EPOCH + Duration::from_secs(BOUNDARY_S + 20);
        assert_eq!(delay_to_next_minute(base), Duration::from_secs(40));

        let late = UNIX_EPOCH + Duration::from_secs(BOUNDARY_S + 59);
        assert_eq!(delay_to_next_minute(late), Duration::from_secs(1));
    }

    #[test]
    fn delay_on_the_boundary_is_a_full_minute() {
        let on_boundary = UNIX_EPOCH + Duration::from_secs(BOUNDARY_S);
        assert_eq!(delay_to_next_minute(on_boundary), Duration::from_secs(60));
    }

    #[test]
    fn cancel_wakes_a_waiting_worker() {
        let signal = Arc::new(CancelSignal::new());
        let waiter = Arc::clone(&signal);
        let thread = std::thread::spawn(move || waiter.wait_for(Duration::from_secs(30)));

        std::thread::sleep(Duration::from_millis(50));
        signal.cancel();

        let start = Instant::now();
        let cancelled = thread.join().expect("join");
        assert!(cancelled);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn wait_after_cancel_returns_immediately() {
        let signal = CancelSignal::new();
        signal.cancel();
        let start = Instant::now();
        assert!(signal.wait_for(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
