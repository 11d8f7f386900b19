//! # domo Hub Daemon
//!
//! Hosts the automation program manager. Scripting language hosts and the
//! hub-wide module bus are external subsystems; without them attached, the
//! daemon runs a simulation host (conditions never fire, bodies are no-ops)
//! and logs every published program property.
//!
//! # Usage
//!
//! ```bash
//! # Run with the default configuration path
//! domo
//!
//! # Explicit config, verbose logging
//! domo -c config/domo.toml -v
//!
//! # JSON log output
//! domo --json
//! ```

use clap::Parser;
use domo::bus::ModuleBus;
use domo::config::{ConfigError, ConfigLoader, EngineConfig, LogLevel, SharedConfig};
use domo::error::ProgramError;
use domo::host::{ScriptFault, ScriptHost};
use domo::module::ProgramHandle;
use domo_engine::ProgramManager;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// domo - home-automation hub daemon
#[derive(Parser, Debug)]
#[command(name = "domo")]
#[command(version)]
#[command(about = "Home-automation hub daemon hosting the automation program manager")]
struct Args {
    /// Path to the daemon configuration file
    #[arg(short, long, default_value = "/etc/domo/domo.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

/// Built-in fallback host: no conditions fire, no bodies run.
struct SimulationHost;

impl ScriptHost for SimulationHost {
    fn compile(&self, _program: &ProgramHandle) -> Vec<ProgramError> {
        Vec::new()
    }

    fn evaluate_condition(&self, _program: &ProgramHandle) -> Result<bool, ScriptFault> {
        Ok(false)
    }

    fn run(
        &self,
        _program: &ProgramHandle,
        _options: Option<&str>,
    ) -> Result<Option<serde_json::Value>, ScriptFault> {
        Ok(None)
    }

    fn stop(&self, _program: &ProgramHandle) {}
}

/// Bus stand-in that logs everything the engine publishes.
struct EventLogBus;

impl ModuleBus for EventLogBus {
    fn raise_event(
        &self,
        program: &ProgramHandle,
        domain: &str,
        source: &str,
        property: &str,
        value: &str,
    ) {
        info!(
            address = program.address,
            domain, source, property, value, "program event"
        );
    }

    fn set_program_parameter(&self, program: &ProgramHandle, parameter: &str, value: &str) {
        debug!(address = program.address, parameter, value, "mirror parameter set");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("domo startup failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_tracing(&args);

    info!("domo v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    config.validate()?;
    info!(
        service = config.shared.service_name,
        programs_dir = %config.engine.programs_dir.display(),
        dispatch_workers = config.engine.dispatch_workers,
        "configuration loaded"
    );

    let manager = ProgramManager::new(
        Arc::new(SimulationHost),
        Arc::new(EventLogBus),
        &config.engine,
    );

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_flag.store(false, Ordering::SeqCst);
    })?;

    info!("program manager ready");
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    manager.stop_all();
    info!("domo shutdown complete");
    Ok(())
}

/// Load the configuration file, falling back to defaults when absent.
fn load_config(path: &PathBuf) -> Result<EngineConfig, ConfigError> {
    match EngineConfig::load(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound) => {
            info!(path = %path.display(), "no configuration file, using defaults");
            Ok(EngineConfig {
                shared: SharedConfig {
                    log_level: LogLevel::Info,
                    service_name: "domo".to_string(),
                },
                engine: Default::default(),
            })
        }
        Err(e) => Err(e),
    }
}

fn setup_tracing(args: &Args) {
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if args.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
