//! In-memory state of one automation program.
//!
//! A [`ProgramRecord`] aggregates everything the engine tracks per program:
//! identity, enablement, trigger mode, last condition result, the running
//! flag, the most recent errors, compiled script handles and the optional
//! pre/post-change hooks. Records are shared as `Arc<ProgramRecord>` between
//! the registry, the tick scheduler, the event router and body workers.
//!
//! ## Locking
//!
//! `enabled`, `running` and `last_condition_result` are atomics; everything
//! else sits behind its own `parking_lot::Mutex`. The `operation_lock`
//! serializes condition evaluation and body entry against each other — it is
//! never held across a body's runtime.

use domo_common::consts::PROGRAMS_DOMAIN;
use domo_common::error::{ProgramError, serialize_errors};
use domo_common::host::ScriptHandles;
use domo_common::module::{ModuleParameter, ModuleRef, ProgramHandle};
use parking_lot::{Mutex, MutexGuard};
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::SystemTime;

/// Trigger condition mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionType {
    /// Run whenever the raw condition is true (level).
    OnTrue,
    /// Run whenever the raw condition is false (level).
    OnFalse,
    /// Run on a false→true transition of the raw condition (rising edge).
    OnSwitchTrue,
    /// Run on a true→false transition of the raw condition (falling edge).
    OnSwitchFalse,
    /// Run on first satisfaction, then auto-disable.
    Once,
}

/// Hook invoked around a module property change.
///
/// Receives the changing module and the parameter (mutable); returns `true`
/// to continue propagation. Returning `false` — or rewriting the parameter
/// value — halts the current routing stage.
pub type ChangeHook = Arc<dyn Fn(&ModuleRef, &mut ModuleParameter) -> bool + Send + Sync>;

/// Observer invoked on actual enable/disable transitions.
pub type EnableListener = Box<dyn Fn(&Arc<ProgramRecord>, bool) + Send + Sync>;

/// One program: trigger condition + action body + lifecycle state.
pub struct ProgramRecord {
    self_ref: Weak<ProgramRecord>,
    handle: ProgramHandle,
    name: String,
    domain: String,
    condition_type: Mutex<ConditionType>,
    enabled: AtomicBool,
    last_condition_result: AtomicBool,
    running: AtomicBool,
    will_run: AtomicBool,
    trigger_time: Mutex<Option<SystemTime>>,
    script_errors: Mutex<Vec<ProgramError>>,
    operation_lock: Mutex<()>,
    handles: Mutex<ScriptHandles>,
    pre_change_hook: Mutex<Option<ChangeHook>>,
    post_change_hook: Mutex<Option<ChangeHook>>,
    enable_listener: Mutex<Option<EnableListener>>,
    body_worker: Mutex<Option<JoinHandle<()>>>,
}

impl ProgramRecord {
    /// Create a new record in the default programs domain.
    ///
    /// The record starts disabled, idle, with `last_condition_result = false`.
    pub fn new(address: u32, name: impl Into<String>, condition_type: ConditionType) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            handle: ProgramHandle::new(address),
            name,
            domain: PROGRAMS_DOMAIN.to_string(),
            condition_type: Mutex::new(condition_type),
            enabled: AtomicBool::new(false),
            last_condition_result: AtomicBool::new(false),
            running: AtomicBool::new(false),
            will_run: AtomicBool::new(false),
            trigger_time: Mutex::new(None),
            script_errors: Mutex::new(Vec::new()),
            operation_lock: Mutex::new(()),
            handles: Mutex::new(ScriptHandles::default()),
            pre_change_hook: Mutex::new(None),
            post_change_hook: Mutex::new(None),
            enable_listener: Mutex::new(None),
            body_worker: Mutex::new(None),
        })
    }

    // ─── Identity ───────────────────────────────────────────────────

    /// Program address (stable for the record's lifetime).
    pub fn address(&self) -> u32 {
        self.handle.address
    }

    /// Cross-subsystem handle (address + object identity).
    pub fn handle(&self) -> ProgramHandle {
        self.handle.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    // ─── Enablement ─────────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Flip enablement; notifies the enable listener on actual transitions.
    ///
    /// The listener runs on the calling thread. Fault quarantine relies on
    /// the store happening before notification: once this returns, no new
    /// evaluation observes the old value.
    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.enabled.swap(enabled, Ordering::SeqCst);
        if previous == enabled {
            return;
        }
        let Some(this) = self.self_ref.upgrade() else {
            return;
        };
        let listener = self.enable_listener.lock();
        if let Some(listener) = listener.as_ref() {
            listener(&this, enabled);
        }
    }

    /// Install the enable observer (the manager does this on `add`).
    pub fn set_enable_listener(&self, listener: Option<EnableListener>) {
        *self.enable_listener.lock() = listener;
    }

    // ─── Trigger state ──────────────────────────────────────────────

    pub fn condition_type(&self) -> ConditionType {
        *self.condition_type.lock()
    }

    pub fn set_condition_type(&self, condition_type: ConditionType) {
        *self.condition_type.lock() = condition_type;
    }

    pub fn last_condition_result(&self) -> bool {
        self.last_condition_result.load(Ordering::SeqCst)
    }

    pub(crate) fn set_last_condition_result(&self, value: bool) {
        self.last_condition_result.store(value, Ordering::SeqCst);
    }

    pub(crate) fn clear_will_run(&self) {
        self.will_run.store(false, Ordering::SeqCst);
    }

    pub(crate) fn set_will_run(&self) {
        self.will_run.store(true, Ordering::SeqCst);
    }

    pub fn will_run(&self) -> bool {
        self.will_run.load(Ordering::SeqCst)
    }

    // ─── Execution state ────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Timestamp of the most recent body start.
    pub fn trigger_time(&self) -> Option<SystemTime> {
        *self.trigger_time.lock()
    }

    pub(crate) fn mark_triggered(&self) {
        *self.trigger_time.lock() = Some(SystemTime::now());
    }

    /// Serializes condition evaluation and body entry for this program.
    pub(crate) fn lock_operation(&self) -> MutexGuard<'_, ()> {
        self.operation_lock.lock()
    }

    pub(crate) fn store_body_worker(&self, worker: JoinHandle<()>) {
        *self.body_worker.lock() = Some(worker);
    }

    pub(crate) fn take_body_worker(&self) -> Option<JoinHandle<()>> {
        self.body_worker.lock().take()
    }

    // ─── Errors ─────────────────────────────────────────────────────

    /// Replace the error list (compile results or a single runtime fault).
    pub fn set_script_errors(&self, errors: Vec<ProgramError>) {
        *self.script_errors.lock() = errors;
    }

    pub fn script_errors(&self) -> Vec<ProgramError> {
        self.script_errors.lock().clone()
    }

    /// JSON wire form of the error list.
    pub fn serialized_errors(&self) -> String {
        serialize_errors(&self.script_errors.lock())
    }

    // ─── Script handles ─────────────────────────────────────────────

    pub fn script_handles(&self) -> ScriptHandles {
        *self.handles.lock()
    }

    pub fn set_script_handles(&self, handles: ScriptHandles) {
        *self.handles.lock() = handles;
    }

    // ─── Hooks ──────────────────────────────────────────────────────

    pub fn set_pre_change_hook(&self, hook: Option<ChangeHook>) {
        *self.pre_change_hook.lock() = hook;
    }

    pub fn set_post_change_hook(&self, hook: Option<ChangeHook>) {
        *self.post_change_hook.lock() = hook;
    }

    pub(crate) fn pre_change_hook(&self) -> Option<ChangeHook> {
        self.pre_change_hook.lock().clone()
    }

    pub(crate) fn post_change_hook(&self) -> Option<ChangeHook> {
        self.post_change_hook.lock().clone()
    }
}

impl std::fmt::Debug for ProgramRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramRecord")
            .field("address", &self.address())
            .field("name", &self.name)
            .field("enabled", &self.is_enabled())
            .field("running", &self.is_running())
            .finish()
    }
}
