//! Serializable run configuration (TOML).
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration for the standard daily job:
//!
//! ```toml
//! [roster]
//! path = "xtb_tickers.csv"
//! strip_suffixes = [".US"]
//!
//! [report]
//! window_days = 90
//! output_dir = "."
//!
//! [fetch]
//! max_attempts = 2
//! workers = 1
//!
//! [publish]
//! destination = "/xtb-day-trading/stocks.xlsx"
//! token_env = "DROPBOX"
//! ```

use pricewatch_core::signals::MIN_OBSERVATIONS;
use pricewatch_core::{RetryPolicy, MAX_WINDOW_DAYS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Headerless `raw_symbol,display_name` CSV.
    pub path: PathBuf,
    /// Market suffixes stripped from the end of raw symbols.
    pub strip_suffixes: Vec<String>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("xtb_tickers.csv"),
            strip_suffixes: vec![".US".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Trailing calendar days requested per ticker.
    pub window_days: i64,
    pub output_dir: PathBuf,
    /// Raw table (CSV), kept next to the formatted workbook.
    pub raw_file: String,
    /// Formatted workbook, the artifact that gets published.
    pub formatted_file: String,
    pub sheet_name: String,
    /// Display width of every kept-visible column.
    pub column_width: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_days: pricewatch_core::DEFAULT_WINDOW_DAYS,
            output_dir: PathBuf::from("."),
            raw_file: "stocks.csv".to_string(),
            formatted_file: "stocks_formatted.xlsx".to_string(),
            sheet_name: "stocks".to_string(),
            column_width: 20.0,
        }
    }
}

impl ReportConfig {
    pub fn raw_path(&self) -> PathBuf {
        self.output_dir.join(&self.raw_file)
    }

    pub fn formatted_path(&self) -> PathBuf {
        self.output_dir.join(&self.formatted_file)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Attempts per ticker before it is skipped.
    pub max_attempts: u32,
    /// Pause between attempts for the same ticker.
    pub retry_delay_ms: u64,
    /// Tickers fetched concurrently.
    pub workers: usize,
    pub request_timeout_secs: u64,
    /// Transport-level retries inside one attempt (429/5xx/network).
    pub http_retries: u32,
    pub breaker_cooldown_secs: u64,
    pub breaker_threshold: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: RetryPolicy::DEFAULT_ATTEMPTS,
            retry_delay_ms: 1_000,
            workers: 1,
            request_timeout_secs: 30,
            http_retries: 2,
            breaker_cooldown_secs: 30 * 60,
            breaker_threshold: 3,
        }
    }
}

impl FetchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.breaker_cooldown_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub enabled: bool,
    /// Remote path, overwritten on every run.
    pub destination: String,
    /// Environment variable holding the Dropbox access token.
    pub token_env: String,
    /// Publish into this local directory instead of Dropbox.
    pub local_dir: Option<PathBuf>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            destination: "/xtb-day-trading/stocks.xlsx".to_string(),
            token_env: "DROPBOX".to_string(),
            local_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub roster: RosterConfig,
    pub report: ReportConfig,
    pub fetch: FetchConfig,
    pub publish: PublishConfig,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let min_window = MIN_OBSERVATIONS as i64;
        if self.report.window_days < min_window {
            return Err(ConfigError::Invalid(format!(
                "report.window_days must be at least {min_window}, got {}",
                self.report.window_days
            )));
        }
        if self.report.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::Invalid(format!(
                "report.window_days must be at most {MAX_WINDOW_DAYS}, got {}",
                self.report.window_days
            )));
        }
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::Invalid("fetch.max_attempts must be >= 1".into()));
        }
        if self.fetch.workers == 0 {
            return Err(ConfigError::Invalid("fetch.workers must be >= 1".into()));
        }
        if self.report.raw_file.is_empty() || self.report.formatted_file.is_empty() {
            return Err(ConfigError::Invalid("report file names must not be empty".into()));
        }
        if self.report.raw_file == self.report.formatted_file {
            return Err(ConfigError::Invalid(
                "report.raw_file and report.formatted_file must differ".into(),
            ));
        }
        if !(self.report.column_width > 0.0) {
            return Err(ConfigError::Invalid("report.column_width must be positive".into()));
        }
        if self.publish.enabled && !self.publish.destination.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "publish.destination must be an absolute remote path, got '{}'",
                self.publish.destination
            )));
        }
        Ok(())
    }
}
