//! Runtime configuration read from `DIABSCREEN_*` environment variables.
//!
//! There is no config file and no command-line surface; everything is read
//! once at startup.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const MODEL_PATH_ENV: &str = "DIABSCREEN_MODEL_PATH";
pub const ANALYSIS_DELAY_ENV: &str = "DIABSCREEN_ANALYSIS_DELAY_MS";
pub const LOG_MODE_ENV: &str = "DIABSCREEN_LOG_MODE";
pub const LOG_FILE_ENV: &str = "DIABSCREEN_LOG_FILE";
pub const PUBKEY_B64_ENV: &str = "DIABSCREEN_MODEL_PUBKEY_B64";
pub const PUBKEY_FILE_ENV: &str = "DIABSCREEN_MODEL_PUBKEY_FILE";
pub const REQUIRE_SIGNED_ENV: &str = "DIABSCREEN_REQUIRE_SIGNED_MODEL";

const DEFAULT_MODEL_PATH: &str = "models";
const DEFAULT_LOG_FILE: &str = "diabscreen.log";
const DEFAULT_ANALYSIS_DELAY_MS: u64 = 2000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name}={value:?} is invalid: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Where formatted log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal, stdout otherwise.
    Auto,
    File,
    Stdout,
}

/// How strictly the model directory is checked before loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityPolicy {
    /// Base64 Ed25519 verifying key.
    pub verifying_key_b64: Option<String>,
    /// File holding a base64 Ed25519 verifying key.
    pub verifying_key_file: Option<PathBuf>,
    /// Refuse to start unless a verifying key is configured.
    pub require_signed: bool,
}

impl IntegrityPolicy {
    #[must_use]
    pub fn has_verifying_key(&self) -> bool {
        self.verifying_key_b64.is_some() || self.verifying_key_file.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub model_dir: PathBuf,
    /// Cosmetic pause before an outcome is shown. Zero disables it.
    pub analysis_delay: Duration,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    pub integrity: IntegrityPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_PATH),
            analysis_delay: Duration::from_millis(DEFAULT_ANALYSIS_DELAY_MS),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            integrity: IntegrityPolicy::default(),
        }
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "expected true/false",
        }),
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(MODEL_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            config.model_dir = PathBuf::from(path.trim());
        }

        if let Some(ms) = lookup(ANALYSIS_DELAY_ENV) {
            let parsed = ms
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: ANALYSIS_DELAY_ENV,
                    value: ms.clone(),
                    reason: "expected milliseconds as an unsigned integer",
                })?;
            config.analysis_delay = Duration::from_millis(parsed);
        }

        if let Some(mode) = lookup(LOG_MODE_ENV) {
            config.log_mode = match mode.trim() {
                "file" => LogMode::File,
                "stdout" => LogMode::Stdout,
                "auto" | "" => LogMode::Auto,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: LOG_MODE_ENV,
                        value: mode,
                        reason: "expected file, stdout or auto",
                    })
                }
            };
        }

        if let Some(path) = lookup(LOG_FILE_ENV).filter(|v| !v.trim().is_empty()) {
            config.log_file = PathBuf::from(path.trim());
        }

        config.integrity.verifying_key_b64 =
            lookup(PUBKEY_B64_ENV).filter(|v| !v.trim().is_empty());
        config.integrity.verifying_key_file = lookup(PUBKEY_FILE_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(|v| PathBuf::from(v.trim()));
        if let Some(v) = lookup(REQUIRE_SIGNED_ENV) {
            config.integrity.require_signed = parse_bool(REQUIRE_SIGNED_ENV, &v)?;
        }

        Ok(config)
    }
}
