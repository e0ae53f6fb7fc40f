//! Layered configuration: built-in defaults < config file < CLI flags.
//!
//! The config file is TOML and lives at
//! `$XDG_CONFIG_HOME/manifest-fetch/config.toml` (falling back to
//! `$HOME/.config/manifest-fetch/config.toml`) unless a path is given
//! explicitly. Every key is optional; unknown keys are rejected.
//!
//! ```toml
//! output_dir = "/srv/media"
//! extension = "mp4"
//! pacing = "token-bucket"
//! rate_per_sec = 0.5
//! burst = 3
//! require_entry_id = true
//! ```

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::download::{
    FilenameTemplate, PacingPolicy, StatusPolicy,
    constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS},
    pacing::DEFAULT_DELAY,
};
use crate::manifest::ColumnRequirements;

/// Directory name used under the XDG config home.
pub const CONFIG_DIR_NAME: &str = "manifest-fetch";

/// Config file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Largest accepted fixed delay (10 minutes).
pub const MAX_DELAY_MS: u64 = 600_000;

const MIN_RATE_PER_SEC: f64 = 0.001;
const MAX_RATE_PER_SEC: f64 = 1000.0;
const DEFAULT_RATE_PER_SEC: f64 = 1.0;
const DEFAULT_BURST: u32 = 1;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is outside its accepted range.
    #[error("Invalid config value for `{field}`: {value}. Expected: {expected}")]
    Invalid {
        /// Key name.
        field: &'static str,
        /// Offending value, formatted for display.
        value: String,
        /// Accepted range or form.
        expected: &'static str,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, value: impl ToString, expected: &'static str) -> Self {
        Self::Invalid {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

/// Pacing mode selector, as written in config and on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PacingMode {
    /// No delay between downloads.
    None,
    /// Fixed delay between downloads (`delay_ms`).
    #[default]
    Fixed,
    /// Token bucket (`rate_per_sec`, `burst`).
    TokenBucket,
}

/// TOML-backed file configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Directory output files are written to.
    pub output_dir: Option<PathBuf>,
    /// Extension appended to every output file.
    pub extension: Option<String>,
    /// Pacing mode.
    pub pacing: Option<PacingMode>,
    /// Delay for fixed pacing, in milliseconds.
    pub delay_ms: Option<u64>,
    /// Refill rate for token-bucket pacing.
    pub rate_per_sec: Option<f64>,
    /// Bucket size for token-bucket pacing.
    pub burst: Option<u32>,
    /// Treat a missing `ENTRY_ID` column as fatal.
    pub require_entry_id: Option<bool>,
    /// Save non-2xx response bodies instead of failing the row.
    pub accept_any_status: Option<bool>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Parses a config document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, wrong value types or
    /// unknown keys. `path` is only used for the error message.
    pub fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values supplied on the command line. `None`/`false` means "not given".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// `-o/--output-dir`
    pub output_dir: Option<PathBuf>,
    /// `-e/--extension`
    pub extension: Option<String>,
    /// `--pacing`
    pub pacing: Option<PacingMode>,
    /// `-d/--delay-ms`
    pub delay_ms: Option<u64>,
    /// `--rate`
    pub rate_per_sec: Option<f64>,
    /// `--burst`
    pub burst: Option<u32>,
    /// `--require-entry-id`
    pub require_entry_id: bool,
    /// `--accept-any-status`
    pub accept_any_status: bool,
}

/// Config file location and contents, if one was found.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Path that was checked, if any could be resolved.
    pub path: Option<PathBuf>,
    /// Parsed contents when the file existed.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    /// Whether configuration was read from disk.
    #[must_use]
    pub fn loaded_from_file(&self) -> bool {
        self.config.is_some()
    }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Directory output files are written to.
    pub output_dir: PathBuf,
    /// Output filename template.
    pub template: FilenameTemplate,
    /// Inter-request pacing.
    pub pacing: PacingPolicy,
    /// Which manifest columns must be present.
    pub requirements: ColumnRequirements,
    /// How non-2xx responses are treated.
    pub status_policy: StatusPolicy,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            template: FilenameTemplate::default(),
            pacing: PacingPolicy::default(),
            requirements: ColumnRequirements::default(),
            status_policy: StatusPolicy::default(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Merges file config and CLI overrides over the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a merged value is out of range.
    pub fn resolve(
        file: Option<&FileConfig>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let empty = FileConfig::default();
        let file = file.unwrap_or(&empty);
        let defaults = Self::default();

        let template = match overrides.extension.as_ref().or(file.extension.as_ref()) {
            Some(extension) => FilenameTemplate::new(extension).map_err(|_| {
                ConfigError::invalid(
                    "extension",
                    format!("{extension:?}"),
                    "a non-empty file extension",
                )
            })?,
            None => defaults.template,
        };

        let mode = overrides.pacing.or(file.pacing).unwrap_or_default();
        let pacing = resolve_pacing(
            mode,
            overrides.delay_ms.or(file.delay_ms),
            overrides.rate_per_sec.or(file.rate_per_sec),
            overrides.burst.or(file.burst),
        )?;

        let connect_timeout_secs = validate_timeout_secs(
            "connect_timeout_secs",
            file.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
        )?;
        let read_timeout_secs = validate_timeout_secs(
            "read_timeout_secs",
            file.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
        )?;

        let require_entry_id =
            overrides.require_entry_id || file.require_entry_id.unwrap_or(false);
        let accept_any_status =
            overrides.accept_any_status || file.accept_any_status.unwrap_or(false);

        Ok(Self {
            output_dir: overrides
                .output_dir
                .clone()
                .or_else(|| file.output_dir.clone())
                .unwrap_or(defaults.output_dir),
            template,
            pacing,
            requirements: ColumnRequirements { require_entry_id },
            status_policy: if accept_any_status {
                StatusPolicy::AcceptAny
            } else {
                StatusPolicy::RequireSuccess
            },
            connect_timeout_secs,
            read_timeout_secs,
        })
    }
}

fn resolve_pacing(
    mode: PacingMode,
    delay_ms: Option<u64>,
    rate_per_sec: Option<f64>,
    burst: Option<u32>,
) -> Result<PacingPolicy, ConfigError> {
    if let Some(delay_ms) = delay_ms
        && delay_ms > MAX_DELAY_MS
    {
        return Err(ConfigError::invalid("delay_ms", delay_ms, "0..=600000"));
    }
    if let Some(rate) = rate_per_sec
        && !(MIN_RATE_PER_SEC..=MAX_RATE_PER_SEC).contains(&rate)
    {
        return Err(ConfigError::invalid("rate_per_sec", rate, "0.001..=1000"));
    }
    if let Some(burst) = burst
        && burst == 0
    {
        return Err(ConfigError::invalid("burst", burst, "at least 1"));
    }

    Ok(match mode {
        PacingMode::None => PacingPolicy::None,
        PacingMode::Fixed => PacingPolicy::Fixed(
            delay_ms.map_or(DEFAULT_DELAY, Duration::from_millis),
        ),
        PacingMode::TokenBucket => PacingPolicy::TokenBucket {
            rate_per_sec: rate_per_sec.unwrap_or(DEFAULT_RATE_PER_SEC),
            burst: burst.unwrap_or(DEFAULT_BURST),
        },
    })
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<u64, ConfigError> {
    if !(1..=3600).contains(&value) {
        return Err(ConfigError::invalid(field, value, "1..=3600"));
    }
    Ok(value)
}

/// Resolves the default config path from the process environment.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/manifest-fetch/config.toml`
/// 2. `$HOME/.config/manifest-fetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    config_path_from(env_var_non_empty_os("XDG_CONFIG_HOME"), env_var_non_empty_os("HOME"))
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg_config_home) = xdg_config_home {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = home?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads configuration from `explicit` or, when `None`, the default path.
///
/// A missing file at the default path is not an error; a missing explicit
/// file is.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig::default());
    };
    if !path_ref.exists() {
        debug!(path = %path_ref.display(), "no config file found");
        return Ok(LoadedConfig { path, config: None });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    FileConfig::parse(&raw, path)
}
