//! Engine binary for the rescue simulation.
//!
//! This is the main entry point that wires together configuration, the
//! generated scenario, the approval gate, and the task log. It runs the
//! simulation loop until every victim is rescued or dead, or the round
//! budget runs out.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `rescue-config.yaml` (or `RESCUE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Generate the grid and place agents, victims, and drones
//! 4. Build the approval gate and task log
//! 5. Run the simulation loop
//! 6. Log the result

mod error;
mod progress;

use std::path::PathBuf;

use rescue_core::approval;
use rescue_core::config::ScenarioConfig;
use rescue_core::runner;
use rescue_core::scenario;
use rescue_core::task_log::TracingTaskLog;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressLogger;

/// Environment variable overriding the config file location.
const CONFIG_ENV: &str = "RESCUE_CONFIG";

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "rescue-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, scenario construction, or the
/// simulation itself fails.
fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, config_found) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG overrides the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("rescue-engine starting");
    if !config_found {
        info!("Config file not found, using defaults");
    }
    info!(
        seed = config.world.seed,
        width = config.world.width,
        height = config.world.height,
        max_rounds = config.simulation.max_rounds,
        commander = config.commander.enabled,
        approval = config.approval.enabled,
        "Configuration loaded"
    );

    // 3. Build the scenario.
    let mut state = scenario::build_simulation(&config)?;

    // 4. Approval gate and task log.
    let mut gate = approval::gate_from_config(&config.approval);
    let mut task_log = TracingTaskLog;
    let mut callback = ProgressLogger::new(config.logging.summary_interval);

    // 5. Run the simulation.
    let result = runner::run_simulation(
        &mut state,
        gate.as_mut(),
        &mut task_log,
        config.simulation.max_rounds,
        &mut callback,
    )?;

    // 6. Log results.
    runner::log_simulation_end(&result);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "rescue-engine shutdown complete"
    );

    Ok(())
}

/// Load the scenario configuration.
///
/// Reads the path in `RESCUE_CONFIG` if set, else `rescue-config.yaml` in
/// the current working directory. A missing file yields defaults; the
/// second element reports whether a file was read.
fn load_config() -> Result<(ScenarioConfig, bool), EngineError> {
    let config_path = std::env::var_os(CONFIG_ENV)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if config_path.exists() {
        let config = ScenarioConfig::from_file(&config_path)?;
        Ok((config, true))
    } else {
        Ok((ScenarioConfig::default(), false))
    }
}
