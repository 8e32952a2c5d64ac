//! Batch runner for the worldtick simulation.
//!
//! Loads configuration, builds a world from a snapshot or a scenario, runs
//! a fixed number of autonomy ticks, explains the tail of the audit log,
//! and saves a snapshot.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `worldtick-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the snapshot, or the configured scenario
//! 4. Run the autonomy ticks
//! 5. Log the explained audit tail
//! 6. Save the snapshot

mod error;

use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use worldtick_core::config::CONFIG_FILE;
use worldtick_core::{CoreError, SimulationConfig, SnapshotError, WorldStore};

use crate::error::EngineError;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration is invalid or a world operation fails.
fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("worldtick-engine starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    info!(
        world_name = config.world.name,
        locations = config.world.locations.len(),
        ticks = config.run.ticks,
        scenario = config.run.scenario,
        snapshot_path = %config.persistence.snapshot_path.display(),
        "Configuration loaded"
    );

    // 3. Build the starting world.
    let store = WorldStore::new(&config);
    prepare_world(&store, &config)?;

    // 4. Run the autonomy ticks.
    for _ in 0..config.run.ticks {
        let report = store.auto_tick(None)?;
        info!(
            tick = report.tick.tick,
            generated = report.auto.generated_actions.len(),
            applied = report.tick.applied_actions,
            denied = report.tick.denied_actions,
            "Autonomy tick complete"
        );
    }

    // 5. Explain what happened.
    for line in store.explain_recent(config.run.explain_lines) {
        info!(target: "worldtick::explain", "{line}");
    }

    // 6. Save.
    let receipt = store.save_to_path(None, None)?;
    let metrics = store.metrics();
    info!(
        path = %receipt.path.display(),
        tick = metrics.tick,
        agents = metrics.agents,
        total_balance_mon = metrics.total_balance_mon,
        "worldtick-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration from `worldtick-config.yaml`.
///
/// Looks for the config file relative to the current working directory and
/// reports whether it was found.
fn load_config() -> Result<(SimulationConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        Ok((SimulationConfig::from_file(config_path)?, true))
    } else {
        let mut config = SimulationConfig::default();
        config.persistence.apply_env_overrides();
        Ok((config, false))
    }
}

/// Load the snapshot when configured to and present, otherwise the
/// configured scenario.
fn prepare_world(store: &WorldStore, config: &SimulationConfig) -> Result<(), EngineError> {
    if config.persistence.load_on_start {
        match store.load_from_path(None) {
            Ok(receipt) => {
                info!(tick = receipt.tick, agents = receipt.agents, "Snapshot restored");
                return Ok(());
            }
            Err(CoreError::Snapshot(SnapshotError::NotFound(path))) => {
                warn!(path = %path.display(), "No snapshot to restore, loading scenario");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let metrics = store.load_scenario(&config.run.scenario)?;
    info!(
        scenario = config.run.scenario,
        agents = metrics.agents,
        "Scenario loaded"
    );
    Ok(())
}
