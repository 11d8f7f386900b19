//! Program lifecycle façade.
//!
//! Owns the registry, the engine-wide flags, the dispatch pool and the
//! per-component workers. All operations here are infallible: underlying
//! stop and artifact-delete calls swallow their errors (a worker may already
//! be gone, artifact files may never have existed).

use crate::api::DynamicApiRegistry;
use crate::evaluator::ConditionEvaluator;
use crate::pool::DispatchPool;
use crate::publisher::StatusPublisher;
use crate::record::ProgramRecord;
use crate::registry::ProgramRegistry;
use crate::router::EventRouter;
use crate::runner::ProgramRunner;
use crate::scheduler::TickScheduler;
use domo_common::bus::{ModuleBus, ProgramStatus};
use domo_common::config::EngineSection;
use domo_common::consts::{ARDUINO_SUBDIR, USER_SPACE_BASE};
use domo_common::host::ScriptHost;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Engine-wide state read by every worker loop.
///
/// `running` is flipped false exactly once by `stop_all`; `enabled` may
/// toggle freely and only suppresses body dispatch, not registration.
pub struct EngineFlags {
    running: AtomicBool,
    enabled: AtomicBool,
}

impl EngineFlags {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

/// The automation program manager.
pub struct ProgramManager {
    registry: Arc<ProgramRegistry>,
    flags: Arc<EngineFlags>,
    scheduler: Arc<TickScheduler>,
    runner: Arc<ProgramRunner>,
    router: EventRouter,
    publisher: StatusPublisher,
    api: Arc<DynamicApiRegistry>,
    programs_dir: PathBuf,
}

impl ProgramManager {
    /// Wire up the engine over a script host and a module bus.
    pub fn new(
        host: Arc<dyn ScriptHost>,
        bus: Arc<dyn ModuleBus>,
        config: &EngineSection,
    ) -> Self {
        let publisher = StatusPublisher::new(bus);
        let registry = Arc::new(ProgramRegistry::new());
        let flags = Arc::new(EngineFlags::new());
        let evaluator = Arc::new(ConditionEvaluator::new(
            Arc::clone(&host),
            publisher.clone(),
        ));
        let runner = Arc::new(ProgramRunner::new(Arc::clone(&host), publisher.clone()));
        let scheduler = Arc::new(TickScheduler::new(
            Arc::clone(&flags),
            Arc::clone(&evaluator),
            Arc::clone(&runner),
        ));
        let pool = Arc::new(DispatchPool::new(config.dispatch_workers));
        let router = EventRouter::new(
            Arc::clone(&registry),
            Arc::clone(&flags),
            Arc::clone(&evaluator),
            Arc::clone(&runner),
            Arc::clone(&pool),
        );

        Self {
            registry,
            flags,
            scheduler,
            runner,
            router,
            publisher,
            api: Arc::new(DynamicApiRegistry::new()),
            programs_dir: config.programs_dir.clone(),
        }
    }

    // ─── Lifecycle ──────────────────────────────────────────────────

    /// Register a program and hook it into the enable observer.
    ///
    /// Publishes `Idle` and, when the program is already enabled, starts its
    /// tick worker.
    pub fn add(&self, program: Arc<ProgramRecord>) {
        info!(address = program.address(), name = program.name(), "program added");

        let scheduler = Arc::clone(&self.scheduler);
        let publisher = self.publisher.clone();
        program.set_enable_listener(Some(Box::new(move |program, enabled| {
            if enabled {
                publisher.publish_status(program, ProgramStatus::Enabled);
                scheduler.start(program);
            } else {
                scheduler.stop(program.address());
                publisher.publish_status(program, ProgramStatus::Disabled);
            }
        })));

        self.registry.insert(Arc::clone(&program));
        self.publisher.publish_status(&program, ProgramStatus::Idle);
        if program.is_enabled() {
            self.scheduler.start(&program);
        }
    }

    /// Unregister a program: disable, stop body and scheduler, remove, and
    /// best-effort delete its compiled artifacts.
    pub fn remove(&self, program: &Arc<ProgramRecord>) {
        info!(address = program.address(), "program removed");
        program.set_enabled(false);
        self.runner.stop(program);
        self.scheduler.stop(program.address());
        program.set_enable_listener(None);
        self.registry.remove(program.address());
        self.delete_artifacts(program.address());
    }

    /// Allocate the next program address: `1 + max(existing)`, floored at
    /// `USER_SPACE_BASE`.
    pub fn generate_pid(&self) -> u32 {
        match self.registry.max_address() {
            Some(max) => (max + 1).max(USER_SPACE_BASE),
            None => USER_SPACE_BASE,
        }
    }

    /// Shut the engine down: no further body dispatch, all tick workers
    /// stopped, every active body asked to stop (no join deadline).
    pub fn stop_all(&self) {
        info!("stopping all programs");
        self.flags.set_running(false);
        self.scheduler.stop_all();
        for program in self.registry.snapshot() {
            self.runner.stop(&program);
        }
    }

    // ─── Engine-wide enablement ─────────────────────────────────────

    /// Engine-wide switch, distinct from per-program enablement: when off,
    /// registrations are still accepted but body dispatch is suppressed in
    /// post-change routing and in tick evaluation.
    pub fn set_enabled(&self, enabled: bool) {
        self.flags.set_enabled(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.flags.is_enabled()
    }

    pub fn is_running(&self) -> bool {
        self.flags.is_running()
    }

    // ─── Access ─────────────────────────────────────────────────────

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn api(&self) -> &Arc<DynamicApiRegistry> {
        &self.api
    }

    pub fn programs(&self) -> Vec<Arc<ProgramRecord>> {
        self.registry.snapshot()
    }

    pub fn find(&self, address: u32) -> Option<Arc<ProgramRecord>> {
        self.registry.find(address)
    }

    // ─── Artifacts ──────────────────────────────────────────────────

    /// Delete on-disk compiled artifacts keyed by address. Failures are
    /// non-fatal: the files may never have existed.
    fn delete_artifacts(&self, address: u32) {
        let assembly = self.programs_dir.join(format!("{address}.dll"));
        if let Err(e) = std::fs::remove_file(&assembly) {
            debug!(path = %assembly.display(), error = %e, "no compiled assembly to delete");
        }

        let generated = self
            .programs_dir
            .join(ARDUINO_SUBDIR)
            .join(address.to_string());
        if let Err(e) = std::fs::remove_dir_all(&generated) {
            debug!(path = %generated.display(), error = %e, "no generated sources to delete");
        }
    }
}

impl Drop for ProgramManager {
    fn drop(&mut self) {
        if self.flags.is_running() {
            self.stop_all();
        }
    }
}
