//! Test doubles for the program manager suite: a scriptable ScriptHost and a
//! recording ModuleBus, plus small timing helpers.

use domo_common::bus::{ModuleBus, PROP_PROGRAM_STATUS, PROP_RUNTIME_ERROR};
use domo_common::error::ProgramError;
use domo_common::host::{ScriptFault, ScriptHost};
use domo_common::module::{ChangeSender, ModuleParameter, ModuleRef, ProgramHandle, PropertyChange};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

type CondFn = Arc<dyn Fn() -> Result<bool, ScriptFault> + Send + Sync>;
type BodyFn = Arc<dyn Fn() -> Result<Option<serde_json::Value>, ScriptFault> + Send + Sync>;

/// Scriptable ScriptHost: per-address condition and body behaviors, with
/// evaluation/run counters and a stop-request log.
#[derive(Default)]
pub struct FakeHost {
    conditions: Mutex<HashMap<u32, CondFn>>,
    bodies: Mutex<HashMap<u32, BodyFn>>,
    eval_counts: Mutex<HashMap<u32, u32>>,
    run_counts: Mutex<HashMap<u32, u32>>,
    stop_requests: Mutex<Vec<u32>>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_condition(
        &self,
        address: u32,
        condition: impl Fn() -> Result<bool, ScriptFault> + Send + Sync + 'static,
    ) {
        self.conditions.lock().insert(address, Arc::new(condition));
    }

    /// Condition that always yields the same value.
    pub fn set_condition_const(&self, address: u32, value: bool) {
        self.set_condition(address, move || Ok(value));
    }

    /// Condition that mirrors a shared flag.
    pub fn set_condition_flag(&self, address: u32, flag: Arc<AtomicBool>) {
        self.set_condition(address, move || Ok(flag.load(Ordering::SeqCst)));
    }

    /// Condition that yields the scripted sequence, then false forever.
    pub fn set_condition_sequence(&self, address: u32, values: Vec<bool>) {
        let remaining = Mutex::new(VecDeque::from(values));
        self.set_condition(address, move || {
            Ok(remaining.lock().pop_front().unwrap_or(false))
        });
    }

    pub fn set_body(
        &self,
        address: u32,
        body: impl Fn() -> Result<Option<serde_json::Value>, ScriptFault> + Send + Sync + 'static,
    ) {
        self.bodies.lock().insert(address, Arc::new(body));
    }

    pub fn eval_count(&self, address: u32) -> u32 {
        self.eval_counts.lock().get(&address).copied().unwrap_or(0)
    }

    pub fn run_count(&self, address: u32) -> u32 {
        self.run_counts.lock().get(&address).copied().unwrap_or(0)
    }

    pub fn stop_requests(&self) -> Vec<u32> {
        self.stop_requests.lock().clone()
    }
}

impl ScriptHost for FakeHost {
    fn compile(&self, _program: &ProgramHandle) -> Vec<ProgramError> {
        Vec::new()
    }

    fn evaluate_condition(&self, program: &ProgramHandle) -> Result<bool, ScriptFault> {
        *self.eval_counts.lock().entry(program.address).or_insert(0) += 1;
        let condition = self.conditions.lock().get(&program.address).cloned();
        match condition {
            Some(condition) => condition(),
            None => Ok(false),
        }
    }

    fn run(
        &self,
        program: &ProgramHandle,
        _options: Option<&str>,
    ) -> Result<Option<serde_json::Value>, ScriptFault> {
        *self.run_counts.lock().entry(program.address).or_insert(0) += 1;
        let body = self.bodies.lock().get(&program.address).cloned();
        match body {
            Some(body) => body(),
            None => Ok(None),
        }
    }

    fn stop(&self, program: &ProgramHandle) {
        self.stop_requests.lock().push(program.address);
    }
}

/// Recording ModuleBus: captures every raised event and parameter set.
#[derive(Default)]
pub struct MemoryBus {
    events: Mutex<Vec<(u32, String, String)>>,
    parameters: Mutex<Vec<(u32, String, String)>>,
}

impl MemoryBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All published values of one property, in publication order.
    pub fn property_values(&self, address: u32, property: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|(a, p, _)| *a == address && p == property)
            .map(|(_, _, v)| v.clone())
            .collect()
    }

    pub fn statuses(&self, address: u32) -> Vec<String> {
        self.property_values(address, PROP_PROGRAM_STATUS)
    }

    pub fn runtime_errors(&self, address: u32) -> Vec<String> {
        self.property_values(address, PROP_RUNTIME_ERROR)
    }

    pub fn parameter_values(&self, address: u32, parameter: &str) -> Vec<String> {
        self.parameters
            .lock()
            .iter()
            .filter(|(a, p, _)| *a == address && p == parameter)
            .map(|(_, _, v)| v.clone())
            .collect()
    }
}

impl ModuleBus for MemoryBus {
    fn raise_event(
        &self,
        program: &ProgramHandle,
        _domain: &str,
        _source: &str,
        property: &str,
        value: &str,
    ) {
        self.events
            .lock()
            .push((program.address, property.to_string(), value.to_string()));
    }

    fn set_program_parameter(&self, program: &ProgramHandle, parameter: &str, value: &str) {
        self.parameters
            .lock()
            .push((program.address, parameter.to_string(), value.to_string()));
    }
}

/// A property change coming from an external module.
pub fn external_change(parameter: &str, value: &str) -> PropertyChange {
    PropertyChange {
        sender: ChangeSender::Module("external".to_string()),
        module: ModuleRef::new("HomeAutomation.Test", "42"),
        parameter: ModuleParameter::new(parameter, value),
    }
}

/// A property change echoed back from a program's own write.
pub fn program_change(handle: ProgramHandle, parameter: &str, value: &str) -> PropertyChange {
    PropertyChange {
        sender: ChangeSender::Program(handle),
        module: ModuleRef::new("HomeAutomation.Test", "42"),
        parameter: ModuleParameter::new(parameter, value),
    }
}

/// Poll `condition` every few milliseconds until it holds or `timeout` runs
/// out; returns its final value.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Tick workers wake on real minute boundaries. Tests that assert the
/// absence of evaluations sleep past an imminent boundary first, so a tick
/// firing mid-test cannot masquerade as routed delivery.
pub fn steer_clear_of_minute_boundary() {
    let seconds = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        % 60;
    if seconds >= 55 {
        std::thread::sleep(Duration::from_secs(61 - seconds));
    }
}
