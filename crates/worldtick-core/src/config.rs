//! Configuration loading and typed config structures for the worldtick
//! simulation.
//!
//! The configuration lives in `worldtick-config.yaml`. Every field has a
//! default, so an empty file (or no file) gives the standard three-location
//! world with a workshop capacity of 1.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::audit::MAX_LOGS;
use crate::auto::MAX_LIMIT_AGENTS;
use crate::snapshot::DEFAULT_SNAPSHOT_FILE;
use crate::state::{DEFAULT_LOCATIONS, WorldSettings};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "worldtick-config.yaml";

/// Environment variable overriding `persistence.snapshot_path`.
pub const SNAPSHOT_PATH_ENV: &str = "WORLD_SNAPSHOT_PATH";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// World shape.
    #[serde(default)]
    pub world: WorldConfig,

    /// Economy parameters.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Autonomy step defaults.
    #[serde(default)]
    pub autonomy: AutonomyConfig,

    /// Join policy.
    #[serde(default)]
    pub entry: EntryConfig,

    /// Snapshot storage.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// What the engine binary does when started.
    #[serde(default)]
    pub run: RunConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `WORLD_SNAPSHOT_PATH` overrides `persistence.snapshot_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] or [`ConfigError::Invalid`].
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.persistence.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let locations = &self.world.locations;
        if locations.is_empty() {
            return Err(invalid("world.locations", "at least one location is required"));
        }
        for (idx, name) in locations.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(invalid("world.locations", "location names must not be blank"));
            }
            if locations.iter().take(idx).any(|l| l == name) {
                return Err(invalid("world.locations", format!("duplicate location {name:?}")));
            }
        }
        if self.world.max_logs == 0 {
            return Err(invalid("world.max_logs", "must be at least 1"));
        }
        if self.economy.workshop_capacity_per_tick == 0 {
            return Err(invalid("economy.workshop_capacity_per_tick", "must be at least 1"));
        }
        let limit = self.autonomy.default_limit_agents;
        if limit == 0 || limit > MAX_LIMIT_AGENTS {
            return Err(invalid(
                "autonomy.default_limit_agents",
                format!("must be between 1 and {MAX_LIMIT_AGENTS}"),
            ));
        }
        Ok(())
    }

    /// The world shape this configuration describes.
    pub fn world_settings(&self) -> WorldSettings {
        WorldSettings {
            locations: self.world.locations.clone(),
            max_logs: self.world.max_logs,
            capacity_per_tick: self.economy.workshop_capacity_per_tick,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// World shape configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Location names in cyclic order.
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,

    /// Audit log capacity.
    #[serde(default = "default_max_logs")]
    pub max_logs: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            locations: default_locations(),
            max_logs: default_max_logs(),
        }
    }
}

/// Economy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Successful earns per tick step.
    #[serde(default = "default_capacity_per_tick")]
    pub workshop_capacity_per_tick: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            workshop_capacity_per_tick: default_capacity_per_tick(),
        }
    }
}

/// Autonomy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutonomyConfig {
    /// Agents evaluated per autonomy step when the caller gives no limit.
    #[serde(default = "default_limit_agents")]
    pub default_limit_agents: usize,
}

impl Default for AutonomyConfig {
    fn default() -> Self {
        Self {
            default_limit_agents: default_limit_agents(),
        }
    }
}

/// Join policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntryConfig {
    /// Whether agents may join without a paid entry transaction.
    #[serde(default = "default_true")]
    pub allow_free_join: bool,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            allow_free_join: true,
        }
    }
}

/// Snapshot storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Default snapshot file (or directory).
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Whether saves include the audit log.
    #[serde(default = "default_true")]
    pub include_logs: bool,

    /// Whether the engine loads the snapshot at start instead of a scenario.
    #[serde(default)]
    pub load_on_start: bool,
}

impl PersistenceConfig {
    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        let path = std::env::var(SNAPSHOT_PATH_ENV)
            .ok()
            .filter(|val| !val.trim().is_empty());
        if let Some(val) = path {
            self.snapshot_path = PathBuf::from(val);
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            include_logs: true,
            load_on_start: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Engine run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Autonomy ticks to run.
    #[serde(default = "default_run_ticks")]
    pub ticks: u32,

    /// Scenario loaded when no snapshot is.
    #[serde(default = "default_scenario")]
    pub scenario: String,

    /// Audit lines explained at the end of the run.
    #[serde(default = "default_explain_lines")]
    pub explain_lines: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: default_run_ticks(),
            scenario: default_scenario(),
            explain_lines: default_explain_lines(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "worldtick".to_owned()
}

fn default_locations() -> Vec<String> {
    DEFAULT_LOCATIONS.iter().map(|l| (*l).to_owned()).collect()
}

const fn default_max_logs() -> usize {
    MAX_LOGS
}

const fn default_capacity_per_tick() -> u32 {
    1
}

const fn default_limit_agents() -> usize {
    50
}

const fn default_true() -> bool {
    true
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from(DEFAULT_SNAPSHOT_FILE)
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_run_ticks() -> u32 {
    10
}

fn default_scenario() -> String {
    "basic_auto".to_owned()
}

const fn default_explain_lines() -> usize {
    30
}
