//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPCHAT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ANTHROPIC_API_KEY` - Anthropic Claude API key
//!
//! ## Optional
//! - `SHOPCHAT_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPCHAT_PORT` - Listen port (default: 8000)
//! - `COMPLETION_MODEL` - Claude model ID (default: claude-sonnet-4-20250514)
//! - `COMPLETION_API_URL` - Messages endpoint (default: <https://api.anthropic.com/v1/messages>)
//! - `COMPLETION_TIMEOUT_SECS` - Per-request timeout (default: 60)
//! - `TOOL_PASS_TEMPERATURE` / `TOOL_PASS_MAX_TOKENS` - Pass 1 sampling (default: 0.1 / 512)
//! - `REPLY_PASS_TEMPERATURE` / `REPLY_PASS_MAX_TOKENS` - Pass 2 sampling (default: 0.7 / 1024)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates (default: 1.0)

use std::collections::HashMap;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::completion::SamplingParams;
use crate::services::ChatConfig;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_COMPLETION_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_COMPLETION_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Claude API configuration
    pub claude: ClaudeConfig,
    /// Sampling for the two completion passes
    pub chat: ChatConfig,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Claude API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ClaudeConfig {
    /// Anthropic API key
    pub api_key: SecretString,
    /// Model ID (e.g., claude-sonnet-4-20250514)
    pub model: String,
    /// Messages API endpoint
    pub api_url: Url,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_url", &self.api_url.as_str())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SHOPCHAT_DATABASE_URL")?;
        let host: IpAddr = parse_env_or_default("SHOPCHAT_HOST", "127.0.0.1")?;
        let port: u16 = parse_env_or_default("SHOPCHAT_PORT", "8000")?;
        let claude = ClaudeConfig::from_env()?;
        let chat = chat_config_from_env()?;
        let log_format = LogFormat::parse(get_optional_env("LOG_FORMAT").as_deref());
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            claude,
            chat,
            log_format,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ClaudeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = get_env_or_default("COMPLETION_API_URL", DEFAULT_COMPLETION_API_URL);
        let api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("COMPLETION_API_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_key: get_validated_secret("ANTHROPIC_API_KEY")?,
            model: get_env_or_default("COMPLETION_MODEL", DEFAULT_COMPLETION_MODEL),
            api_url,
            timeout_secs: parse_env_or_default("COMPLETION_TIMEOUT_SECS", "60")?,
        })
    }
}

fn chat_config_from_env() -> Result<ChatConfig, ConfigError> {
    let config = ChatConfig {
        tool_pass: SamplingParams {
            temperature: parse_env_or_default("TOOL_PASS_TEMPERATURE", "0.1")?,
            max_tokens: parse_env_or_default("TOOL_PASS_MAX_TOKENS", "512")?,
        },
        reply_pass: SamplingParams {
            temperature: parse_env_or_default("REPLY_PASS_TEMPERATURE", "0.7")?,
            max_tokens: parse_env_or_default("REPLY_PASS_MAX_TOKENS", "1024")?,
        },
    };
    validate_chat_config(&config)?;
    Ok(config)
}

/// Check sampling bounds and that pass 2 is not colder than pass 1.
fn validate_chat_config(config: &ChatConfig) -> Result<(), ConfigError> {
    for (key, params) in [
        ("TOOL_PASS", config.tool_pass),
        ("REPLY_PASS", config.reply_pass),
    ] {
        if !(0.0..=1.0).contains(&params.temperature) {
            return Err(ConfigError::InvalidEnvVar(
                format!("{key}_TEMPERATURE"),
                format!("must be between 0 and 1 (got {})", params.temperature),
            ));
        }
        if params.max_tokens == 0 {
            return Err(ConfigError::InvalidEnvVar(
                format!("{key}_MAX_TOKENS"),
                "must be greater than 0".to_string(),
            ));
        }
    }

    if config.reply_pass.temperature < config.tool_pass.temperature {
        return Err(ConfigError::InvalidEnvVar(
            "REPLY_PASS_TEMPERATURE".to_string(),
            format!(
                "must not be lower than TOOL_PASS_TEMPERATURE ({} < {})",
                config.reply_pass.temperature, config.tool_pass.temperature
            ),
        ));
    }

    Ok(())
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, using `default` when it is unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
