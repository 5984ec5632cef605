//! Configuration for the roastbot console.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/roastbot/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use roastbot_proto::task::OwnerId;

use crate::clock::default_offset;
use crate::sweeper::{DEFAULT_SWEEP_INTERVAL_SECS, SweepConfig};

/// Owner used when none is configured.
pub const DEFAULT_OWNER: &str = "local";

/// Errors that can occur when loading configuration.
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

    /// The UTC offset is not of the form `+HH:MM`.
    #[error("invalid UTC offset '{0}', expected e.g. +05:30")]
    InvalidOffset(String),

    /// The sweep interval is zero or negative.
    #[error("sweep interval must be a positive number of seconds, got {0}")]
    InvalidInterval(i64),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    storage: StorageFileConfig,
    schedule: ScheduleFileConfig,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    db_path: Option<PathBuf>,
    in_memory: Option<bool>,
}

/// `[schedule]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ScheduleFileConfig {
    sweep_interval_secs: Option<i64>,
    utc_offset: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Keep tasks in memory only; nothing survives a restart.
    pub in_memory: bool,
    /// Owner whose commands the console reads.
    pub owner: OwnerId,
    /// Initial overdue sweep cadence.
    pub sweep: SweepConfig,
    /// Canonical offset deadlines are read and stored in.
    pub utc_offset: FixedOffset,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            in_memory: false,
            owner: OwnerId::new(DEFAULT_OWNER),
            sweep: SweepConfig::default(),
            utc_offset: default_offset(),
        }
    }
}

impl BotConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read,
    /// any config file cannot be parsed, or a resolved value is invalid.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `BotConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let utc_offset = match cli
            .utc_offset
            .as_deref()
            .or(file.schedule.utc_offset.as_deref())
        {
            Some(raw) => parse_offset(raw)?,
            None => defaults.utc_offset,
        };

        let sweep = match cli.sweep_interval.or(file.schedule.sweep_interval_secs) {
            Some(secs) => SweepConfig::with_interval_secs(secs)
                .map_err(|_| ConfigError::InvalidInterval(secs))?,
            None => defaults.sweep,
        };

        Ok(Self {
            db_path: cli
                .db_path
                .clone()
                .or_else(|| file.storage.db_path.clone())
                .unwrap_or(defaults.db_path),
            in_memory: cli.in_memory || file.storage.in_memory.unwrap_or(defaults.in_memory),
            owner: cli.owner.as_deref().map_or(defaults.owner, OwnerId::new),
            sweep,
            utc_offset,
        })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Deadline tracker that reminds before and roasts after")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/roastbot/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SQLite database path (default: `<data dir>/roastbot/tasks.db`).
    #[arg(long, env = "ROASTBOT_DB")]
    pub db_path: Option<PathBuf>,

    /// Keep tasks in memory instead of SQLite.
    #[arg(long)]
    pub in_memory: bool,

    /// Owner identity for commands read from stdin.
    #[arg(long, env = "ROASTBOT_OWNER")]
    pub owner: Option<String>,

    /// Seconds between overdue sweeps (default: 60).
    #[arg(long, allow_negative_numbers = true)]
    pub sweep_interval: Option<i64>,

    /// Canonical UTC offset for deadlines, e.g. `+05:30`.
    #[arg(long, allow_hyphen_values = true)]
    pub utc_offset: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "ROASTBOT_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/roastbot.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("roastbot")
        .join("tasks.db")
}

fn parse_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOffset(raw.to_string()))
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("roastbot").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
