//! Shared worker pool for post-change event fan-out.
//!
//! Submitting never blocks the caller: jobs land on an MPMC channel and a
//! fixed set of workers drains it. The only contract routing relies on is
//! that submitted jobs run eventually and off the submitting thread.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::JoinHandle;
use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of dispatch workers.
pub struct DispatchPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl DispatchPool {
    /// Spawn `workers` threads draining a shared queue.
    pub fn new(workers: usize) -> Self {
        let (sender, receiver) = unbounded::<Job>();
        let workers = (0..workers.max(1))
            .map(|i| {
                let receiver: Receiver<Job> = receiver.clone();
                std::thread::Builder::new()
                    .name(format!("domo-dispatch-{i}"))
                    .spawn(move || {
                        while let Ok(job) = receiver.recv() {
                            // Engine jobs contain their own faults; a panic
                            // here is a bug, but it must not take the worker
                            // down with it.
                            if catch_unwind(AssertUnwindSafe(job)).is_err() {
                                error!("dispatch job panicked");
                            }
                        }
                        debug!("dispatch worker exiting");
                    })
                    .unwrap_or_else(|e| panic!("failed to spawn dispatch worker: {e}"))
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
        }
    }

    /// Enqueue a job; returns immediately.
    ///
    /// Jobs submitted after shutdown are dropped.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(Box::new(job));
        }
    }

    /// Close the queue and join all workers; pending jobs still run.
    ///
    /// May run on a worker thread itself (last owner dropped inside a job);
    /// that worker is detached instead of self-joined.
    pub fn shutdown(&mut self) {
        self.sender.take();
        let current = std::thread::current().id();
        for worker in self.workers.drain(..) {
            if worker.thread().id() == current {
                continue;
            }
            let _ = worker.join();
        }
    }
}

impl Drop for DispatchPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
