//! Run configuration.
//!
//! Configuration is assembled once at startup from three layers, later layers
//! winning:
//! 1. Default values (hardcoded)
//! 2. An INI file (`config.ini` by convention)
//! 3. Environment variables with the `DRUGBATCH_` prefix
//!
//! The resulting [`DrugParserConfig`] is passed by reference into every
//! component that needs it; nothing reads configuration globally.
//!
//! # Example INI
//!
//! ```ini
//! [api]
//! api_key = sk-...
//! base_url = https://api.lkeap.cloud.tencent.com/v1
//! temperature = 1.0
//! max_tokens = 8192
//!
//! [process]
//! batch_size = 20
//! start_index = 0
//! max_record = -1
//! ```
//!
//! Environment overrides use `__` between section and key, for example
//! `DRUGBATCH_API__API_KEY=sk-...` or `DRUGBATCH_PROCESS__BATCH_SIZE=50`.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "DRUGBATCH";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct DrugParserConfig {
    /// Completion service settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Batching and windowing settings.
    #[serde(default)]
    pub process: ProcessSettings,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Completion service settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ApiSettings {
    /// Bearer token. Only required once a live client is built.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the OpenAI-compatible endpoint, without `/chat/completions`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// System role message sent with every request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Upper bound on generated tokens per batch.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "https://api.lkeap.cloud.tencent.com/v1".to_string()
}

fn default_model() -> String {
    "deepseek-v3".to_string()
}

fn default_system_prompt() -> String {
    "你是一名专业的医药专家,最后仅输出对应表即可，不要其他多余的内容。".to_string()
}

fn default_temperature() -> f64 {
    1.0
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_timeout_secs() -> u64 {
    300
}

/// Batching and input windowing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProcessSettings {
    /// Names per completion request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Offset into the deduplicated name list where this run starts.
    #[serde(default)]
    pub start_index: usize,

    /// Number of names to process from `start_index`; `-1` means until the end.
    #[serde(default = "default_max_record")]
    pub max_record: i64,

    /// Pause after every batch, in milliseconds.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            start_index: 0,
            max_record: default_max_record(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

impl ProcessSettings {
    #[must_use]
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// `max_record` as an optional count; `None` for "until the end".
    #[must_use]
    pub fn max_record(&self) -> Option<usize> {
        usize::try_from(self.max_record).ok()
    }
}

fn default_batch_size() -> usize {
    20
}

fn default_max_record() -> i64 {
    -1
}

fn default_batch_delay_ms() -> u64 {
    3000
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file, opened in append mode. Empty means stderr.
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "drug_parser.log".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl DrugParserConfig {
    /// Load configuration from an INI file with environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError::FileNotFound`] when `path` does not exist, a
    /// load error when a value cannot be parsed, and
    /// [`ConfigLoadError::Invalid`] when [`validate`](Self::validate) fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&DrugParserConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Ini))
            // DRUGBATCH_API__API_KEY -> api.api_key
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let parsed: DrugParserConfig = config.try_deserialize()?;
        parsed.validate()?;

        Ok(parsed)
    }

    /// Load configuration from defaults and environment variables only.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus the missing-file case.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&DrugParserConfig::default())?)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let parsed: DrugParserConfig = config.try_deserialize()?;
        parsed.validate()?;

        Ok(parsed)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.process.batch_size == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "process.batch_size must be at least 1".to_string(),
            });
        }

        if self.process.max_record < -1 {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "process.max_record must be -1 or a non-negative count, got: {}",
                    self.process.max_record
                ),
            });
        }

        if !(0.0..=2.0).contains(&self.api.temperature) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "api.temperature must be within [0, 2], got: {}",
                    self.api.temperature
                ),
            });
        }

        if self.api.max_tokens == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "api.max_tokens must be greater than 0".to_string(),
            });
        }

        if self.api.base_url.trim().is_empty() {
            return Err(ConfigLoadError::Invalid {
                message: "api.base_url must not be empty".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }
}
