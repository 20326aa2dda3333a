//! Runtime configuration for a digest run.
//!
//! Every component receives the pieces it needs from [`DigestConfig`] at
//! construction; nothing reads the environment after startup.
//!
//! Precedence, highest first:
//! 1. CLI flags and their environment variables (see [`crate::cli::Cli`])
//! 2. The optional YAML file passed with `--config`
//! 3. Built-in defaults
//!
//! Secrets (API keys, mail password) are never read from the YAML file.
//!
//! # Example file
//!
//! ```yaml
//! model: glm-4
//! target_locale: zh-TW
//! inter_article_delay_secs: 5
//! max_retries: 1
//! label_matching: lenient
//! output_path: public/index.html
//! ```

use crate::cli::Cli;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const DEFAULT_NEWS_ENDPOINT: &str = "https://newsapi.org/v2/everything";
pub const DEFAULT_LLM_ENDPOINT: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";
pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Errors raised while assembling the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Which [`crate::parser::LabelMatcher`] the section parser uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMatching {
    /// Plain substring match on the numbered Traditional Chinese markers.
    #[default]
    Exact,
    /// Regex match tolerant of numbering punctuation, emphasis and Simplified spellings.
    Lenient,
}

/// SMTP delivery settings for the optional e-mail sink.
#[derive(Clone)]
pub struct MailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Used as sender, recipient and SMTP username.
    pub address: String,
    pub password: String,
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything a digest run needs, resolved once at startup.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    #[serde(skip)]
    pub news_api_key: String,
    #[serde(skip)]
    pub llm_api_key: String,

    pub news_endpoint: String,
    pub llm_endpoint: String,
    pub translate_endpoint: String,

    /// Chat-completion model identifier.
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,

    /// Per-request timeout for LLM and translation calls.
    pub request_timeout_secs: u64,
    /// Extra LLM attempts after a 429/5xx reply; 0 sends each prompt once.
    pub max_retries: usize,
    /// First backoff delay; doubles per attempt. See [`DigestConfig::base_delay`].
    pub base_delay_ms: u64,

    /// Locale titles and fallback text are translated into.
    pub target_locale: String,
    /// Minimum gap between two completed articles.
    pub inter_article_delay_secs: u64,

    /// Where the digest is written (fully replaced on each run).
    pub output_path: PathBuf,
    pub label_matching: LabelMatching,

    pub smtp_host: String,
    pub smtp_port: u16,
    #[serde(skip)]
    pub mail: Option<MailSettings>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            news_api_key: String::new(),
            llm_api_key: String::new(),
            news_endpoint: DEFAULT_NEWS_ENDPOINT.to_string(),
            llm_endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            translate_endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            model: "glm-4".to_string(),
            temperature: 0.5,
            top_p: 0.8,
            max_tokens: 800,
            request_timeout_secs: 30,
            max_retries: 0,
            base_delay_ms: 5000,
            target_locale: "zh-TW".to_string(),
            inter_article_delay_secs: 5,
            output_path: PathBuf::from("index.html"),
            label_matching: LabelMatching::Exact,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            mail: None,
        }
    }
}

impl fmt::Debug for DigestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestConfig")
            .field("news_api_key", &"<redacted>")
            .field("llm_api_key", &"<redacted>")
            .field("news_endpoint", &self.news_endpoint)
            .field("llm_endpoint", &self.llm_endpoint)
            .field("translate_endpoint", &self.translate_endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("base_delay_ms", &self.base_delay_ms)
            .field("target_locale", &self.target_locale)
            .field("inter_article_delay_secs", &self.inter_article_delay_secs)
            .field("output_path", &self.output_path)
            .field("label_matching", &self.label_matching)
            .field("mail", &self.mail)
            .finish()
    }
}

impl DigestConfig {
    /// Resolve the configuration from parsed CLI arguments.
    ///
    /// Reads the YAML file named by `--config` (if any), layers the CLI
    /// values on top and validates the result.
    #[instrument(level = "info", skip_all)]
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match cli.config.as_deref() {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        info!(
            model = %config.model,
            locale = %config.target_locale,
            output = %config.output_path.display(),
            mail = config.mail.is_some(),
            "Configuration resolved"
        );
        Ok(config)
    }

    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        debug!(path, "Loaded YAML configuration");
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        self.news_api_key = cli.news_api_key.clone();
        self.llm_api_key = cli.llm_api_key.clone();

        if let Some(output) = &cli.output {
            self.output_path = output.clone();
        }
        if let Some(locale) = &cli.locale {
            self.target_locale = locale.clone();
        }
        if let Some(delay) = cli.delay_secs {
            self.inter_article_delay_secs = delay;
        }
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
        if cli.lenient_labels {
            self.label_matching = LabelMatching::Lenient;
        }

        self.mail = match (cli.email, &cli.email_address, &cli.email_password) {
            (true, Some(address), Some(password)) => Some(MailSettings {
                smtp_host: self.smtp_host.clone(),
                smtp_port: self.smtp_port,
                address: address.clone(),
                password: password.clone(),
            }),
            _ => None,
        };
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.news_api_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "news_api_key",
                reason: "must not be empty".to_string(),
            });
        }
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "llm_api_key",
                reason: "must not be empty".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid {
                field: "temperature",
                reason: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "top_p",
                reason: format!("{} is outside (0.0, 1.0]", self.top_p),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.target_locale.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "target_locale",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// First retry wait. Never shorter than the inter-article pause, so a
    /// retry cannot hit the provider faster than regular traffic does.
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms).max(self.inter_article_delay())
    }

    pub fn inter_article_delay(&self) -> Duration {
        Duration::from_secs(self.inter_article_delay_secs)
    }
}
