//! Run configuration: built-in defaults, optional TOML file, environment
//! and CLI overrides, resolved once and validated before any work starts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::pipeline::batch::DispatchConfig;
use crate::pipeline::conversations::ExcerptLimits;
use crate::pipeline::sentiment::prompt::{CONVERSATION_PLACEHOLDER, SENTIMENT_PROMPT_TEMPLATE};
use crate::pipeline::sentiment::{GenerationOptions, RetryPolicy};

/// Application-level constants
pub const APP_NAME: &str = "sentiment-batch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_CSV_PATH: &str = "synthetic_conversations_1M_input.csv";
pub const DEFAULT_MAX_CONVERSATIONS: usize = 100;
pub const DEFAULT_BATCH_SIZE: usize = 8;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 4;
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
pub const DEFAULT_NUM_PREDICT: i32 = 64;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_BACKOFF_BASE_SECS: f64 = 1.0;
/// Upper bound accepted for `backoff_base_secs`.
pub const MAX_BACKOFF_BASE_SECS: u64 = 300;
pub const DEFAULT_MAX_CUSTOMER_MESSAGES: usize = 6;
pub const DEFAULT_MAX_CHARS: usize = 600;

/// Environment variable overriding the inference endpoint URL.
pub const ENV_OLLAMA_URL: &str = "SENTIMENT_BATCH_OLLAMA_URL";
/// Environment variable overriding the model identifier.
pub const ENV_OLLAMA_MODEL: &str = "SENTIMENT_BATCH_MODEL";

/// Tracing filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "sentiment_batch=info"
}

/// `<config_dir>/sentiment-batch/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read config file at {path:?}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Invalid TOML in {path:?}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ═══════════════════════════════════════════════════════════
// TOML file layout
// ═══════════════════════════════════════════════════════════

/// On-disk configuration. Every key is optional; missing keys keep defaults.
///
/// ```toml
/// [input]
/// csv_path = "conversations.csv"
/// max_conversations = 500
///
/// [dispatch]
/// batch_size = 16
/// concurrency_limit = 4
///
/// [ollama]
/// url = "http://localhost:11434/api/generate"
/// model = "llama3.2"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub input: InputSection,
    #[serde(default)]
    pub dispatch: DispatchSection,
    #[serde(default)]
    pub ollama: OllamaSection,
    #[serde(default)]
    pub excerpt: ExcerptSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InputSection {
    pub csv_path: Option<PathBuf>,
    /// `0` disables the cap.
    pub max_conversations: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DispatchSection {
    pub batch_size: Option<usize>,
    pub concurrency_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OllamaSection {
    pub url: Option<String>,
    pub model: Option<String>,
    pub num_predict: Option<i32>,
    pub temperature: Option<f32>,
    pub max_retries: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub backoff_base_secs: Option<f64>,
    pub prompt_template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExcerptSection {
    pub max_customer_messages: Option<usize>,
    pub max_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    pub dir: Option<PathBuf>,
    pub host_metrics: Option<bool>,
}

/// Load a config file. A missing file is not an error (`Ok(None)`).
pub fn load_config_file(path: &Path) -> Result<Option<ConfigFile>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let file: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(Some(file))
}

// ═══════════════════════════════════════════════════════════
// Resolved configuration
// ═══════════════════════════════════════════════════════════

/// Inference endpoint settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaSettings {
    pub url: String,
    pub model: String,
    pub options: GenerationOptions,
    pub retry: RetryPolicy,
    pub prompt_template: String,
}

/// Fully-resolved configuration handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub csv_path: PathBuf,
    pub max_conversations: Option<usize>,
    pub dispatch: DispatchConfig,
    pub ollama: OllamaSettings,
    pub excerpt: ExcerptLimits,
    pub output_dir: PathBuf,
    pub host_metrics: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            max_conversations: Some(DEFAULT_MAX_CONVERSATIONS),
            dispatch: DispatchConfig {
                batch_size: DEFAULT_BATCH_SIZE,
                concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            },
            ollama: OllamaSettings {
                url: DEFAULT_OLLAMA_URL.to_string(),
                model: DEFAULT_OLLAMA_MODEL.to_string(),
                options: GenerationOptions {
                    num_predict: DEFAULT_NUM_PREDICT,
                    temperature: DEFAULT_TEMPERATURE,
                },
                retry: RetryPolicy {
                    max_retries: DEFAULT_MAX_RETRIES,
                    timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                    backoff_base: Duration::from_secs_f64(DEFAULT_BACKOFF_BASE_SECS),
                },
                prompt_template: SENTIMENT_PROMPT_TEMPLATE.to_string(),
            },
            excerpt: ExcerptLimits {
                max_customer_messages: DEFAULT_MAX_CUSTOMER_MESSAGES,
                max_chars: DEFAULT_MAX_CHARS,
            },
            output_dir: PathBuf::from("."),
            host_metrics: true,
        }
    }
}

/// Overrides collected from the command line. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub csv_path: Option<PathBuf>,
    /// `Some(None)` removes the cap.
    pub max_conversations: Option<Option<usize>>,
    pub batch_size: Option<usize>,
    pub concurrency_limit: Option<usize>,
    pub url: Option<String>,
    pub model: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub host_metrics: Option<bool>,
}

impl AppConfig {
    /// Layer a parsed config file over the defaults.
    pub fn from_file(file: Option<ConfigFile>) -> Self {
        let mut config = Self::default();
        let Some(file) = file else {
            return config;
        };

        if let Some(path) = file.input.csv_path {
            config.csv_path = path;
        }
        if let Some(max) = file.input.max_conversations {
            config.max_conversations = (max > 0).then_some(max);
        }

        if let Some(v) = file.dispatch.batch_size {
            config.dispatch.batch_size = v;
        }
        if let Some(v) = file.dispatch.concurrency_limit {
            config.dispatch.concurrency_limit = v;
        }

        let ollama = file.ollama;
        if let Some(v) = ollama.url {
            config.ollama.url = v;
        }
        if let Some(v) = ollama.model {
            config.ollama.model = v;
        }
        if let Some(v) = ollama.num_predict {
            config.ollama.options.num_predict = v;
        }
        if let Some(v) = ollama.temperature {
            config.ollama.options.temperature = v;
        }
        if let Some(v) = ollama.max_retries {
            config.ollama.retry.max_retries = v;
        }
        if let Some(v) = ollama.timeout_secs {
            config.ollama.retry.timeout = Duration::from_secs(v);
        }
        if let Some(v) = ollama.backoff_base_secs {
            // Negative clamps to zero; non-finite keeps the default.
            if let Ok(d) = Duration::try_from_secs_f64(v.max(0.0)) {
                config.ollama.retry.backoff_base = d;
            }
        }
        if let Some(v) = ollama.prompt_template {
            config.ollama.prompt_template = v;
        }

        if let Some(v) = file.excerpt.max_customer_messages {
            config.excerpt.max_customer_messages = v;
        }
        if let Some(v) = file.excerpt.max_chars {
            config.excerpt.max_chars = v;
        }

        if let Some(v) = file.output.dir {
            config.output_dir = v;
        }
        if let Some(v) = file.output.host_metrics {
            config.host_metrics = v;
        }

        config
    }

    /// Apply endpoint/model overrides from the process environment.
    pub fn apply_env_overrides(self) -> Self {
        self.apply_env_overrides_from(|key| std::env::var(key).ok())
    }

    fn apply_env_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_OLLAMA_URL).filter(|v| !v.trim().is_empty()) {
            self.ollama.url = url;
        }
        if let Some(model) = lookup(ENV_OLLAMA_MODEL).filter(|v| !v.trim().is_empty()) {
            self.ollama.model = model;
        }
        self
    }

    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(v) = overrides.csv_path {
            self.csv_path = v;
        }
        if let Some(v) = overrides.max_conversations {
            self.max_conversations = v;
        }
        if let Some(v) = overrides.batch_size {
            self.dispatch.batch_size = v;
        }
        if let Some(v) = overrides.concurrency_limit {
            self.dispatch.concurrency_limit = v;
        }
        if let Some(v) = overrides.url {
            self.ollama.url = v;
        }
        if let Some(v) = overrides.model {
            self.ollama.model = v;
        }
        if let Some(v) = overrides.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = overrides.host_metrics {
            self.host_metrics = v;
        }
        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.dispatch.concurrency_limit == 0 {
            return Err(ConfigError::Invalid(
                "concurrency_limit must be at least 1".into(),
            ));
        }
        if self.ollama.retry.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be at least 1".into()));
        }
        if self.ollama.retry.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        if self.ollama.retry.backoff_base > Duration::from_secs(MAX_BACKOFF_BASE_SECS) {
            return Err(ConfigError::Invalid(format!(
                "backoff_base_secs must be at most {MAX_BACKOFF_BASE_SECS}"
            )));
        }
        if self.ollama.url.trim().is_empty() {
            return Err(ConfigError::Invalid("ollama url must not be empty".into()));
        }
        if self.ollama.model.trim().is_empty() {
            return Err(ConfigError::Invalid("ollama model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.ollama.options.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature {} outside [0, 2]",
                self.ollama.options.temperature
            )));
        }
        if self.ollama.options.num_predict <= 0 {
            return Err(ConfigError::Invalid("num_predict must be positive".into()));
        }
        if !self.ollama.prompt_template.contains(CONVERSATION_PLACEHOLDER) {
            return Err(ConfigError::Invalid(format!(
                "prompt template must contain {CONVERSATION_PLACEHOLDER}"
            )));
        }
        Ok(())
    }
}

/// Defaults → config file → environment → CLI, then validate.
///
/// An explicit `config_path` that does not exist is an error; the default
/// location is optional.
pub fn resolve(
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<AppConfig, ConfigError> {
    let file = match config_path {
        Some(path) => {
            let loaded = load_config_file(path)?;
            if loaded.is_none() {
                return Err(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    reason: "file does not exist".into(),
                });
            }
            loaded
        }
        None => match default_config_path() {
            Some(path) => load_config_file(&path)?,
            None => None,
        },
    };

    let config = AppConfig::from_file(file)
        .apply_env_overrides()
        .apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}
