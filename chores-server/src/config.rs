//! Configuration system for the chore board server.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/chores-server/config.toml`)
//! 4. Compiled defaults
//!
//! The household (residents, chores, orderings, users) comes from a
//! `--household` file if given, else the `[household]` section of the
//! config file, else the built-in household.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chores::config::{HouseholdConfig, HouseholdConfigError};

/// Errors that can occur when loading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// Failed to load the household file.
    #[error(transparent)]
    Household(#[from] HouseholdConfigError),

    /// The rollover interval must be at least one second.
    #[error("rollover interval must be at least 1 second")]
    ZeroInterval,
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerConfigFile {
    server: ServerFileConfig,
    household: Option<HouseholdConfig>,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
    data_file: Option<PathBuf>,
    rollover_interval_secs: Option<u64>,
    log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Household chore board server")]
pub struct ServerCliArgs {
    /// Address to bind the HTTP server to.
    #[arg(short, long, env = "CHORES_ADDR")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/chores-server/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to a standalone household TOML file.
    #[arg(long, env = "CHORES_HOUSEHOLD")]
    pub household: Option<PathBuf>,

    /// Where the board document is stored.
    #[arg(long, env = "CHORES_DATA")]
    pub data_file: Option<PathBuf>,

    /// Seconds between rollover checks.
    #[arg(long)]
    pub rollover_interval_secs: Option<u64>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "CHORES_LOG")]
    pub log_level: String,

    /// Write logs to this file instead of stdout.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to (e.g., `0.0.0.0:8080`).
    pub bind_addr: String,
    /// Board document path.
    pub data_file: PathBuf,
    /// Time between rollover checks.
    pub rollover_interval: Duration,
    /// Log level filter string.
    pub log_level: String,
    /// Optional log file.
    pub log_file: Option<PathBuf>,
    /// The household.
    pub household: HouseholdConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            data_file: default_data_file(),
            rollover_interval: Duration::from_secs(60),
            log_level: "info".to_string(),
            log_file: None,
            household: HouseholdConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and a missing
    /// file is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config or household file cannot be read
    /// or parsed, or the rollover interval is zero.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        let household = match &cli.household {
            Some(path) => Some(HouseholdConfig::load(path)?),
            None => None,
        };
        Self::resolve(cli, file, household)
    }

    /// Resolve a `ServerConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(
        cli: &ServerCliArgs,
        file: ServerConfigFile,
        household: Option<HouseholdConfig>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let interval_secs = cli
            .rollover_interval_secs
            .or(file.server.rollover_interval_secs)
            .unwrap_or(defaults.rollover_interval.as_secs());
        if interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        Ok(Self {
            bind_addr: cli
                .bind
                .clone()
                .or(file.server.bind_addr)
                .unwrap_or(defaults.bind_addr),
            data_file: cli
                .data_file
                .clone()
                .or(file.server.data_file)
                .unwrap_or(defaults.data_file),
            rollover_interval: Duration::from_secs(interval_secs),
            log_level: cli.log_level.clone(),
            log_file: cli.log_file.clone().or(file.server.log_file),
            household: household
                .or(file.household)
                .unwrap_or(defaults.household),
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn default_data_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("chores-server")
        .join("board.bin")
}

/// Load and parse a TOML config file.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ServerConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ServerConfigFile::default());
        };
        config_dir.join("chores-server").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
