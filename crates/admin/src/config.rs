//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATA_STORE_URL` - Base URL of the hosted data store (e.g. `https://xyz.supabase.co`)
//! - `DATA_STORE_KEY` - Service key for the hosted data store
//!
//! ## Optional
//! - `KENNEL_HOST` - Bind address (default: 127.0.0.1)
//! - `KENNEL_PORT` - Listen port (default: 3001)
//! - `KENNEL_STATE_FILE` - Where the signed-in user and selected dog are kept
//!   (default: `.kennel/state.json`)
//! - `KENNEL_MISSING_DOG_POLICY` - `ignore` or `report` (default: ignore)
//! - `KENNEL_LOG_JSON` - Emit JSON logs when set to `1`/`true`
//! - `ANALYSIS_API_KEY` - Chat-completion API key (enables narrative analysis)
//! - `ANALYSIS_API_URL` - Chat-completion base URL (default: `https://api.openai.com/v1`)
//! - `ANALYSIS_MODEL` - Model id (default: gpt-4o-mini)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::store::MissingDogPolicy;

pub const DEFAULT_ANALYSIS_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gpt-4o-mini";
const DEFAULT_STATE_FILE: &str = ".kennel/state.json";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Values that show up when someone copies `.env.example` without editing it.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "placeholder",
    "xxx",
    "insert",
    "api-key-here",
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

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Hosted data store connection
    pub data_store: DataStoreConfig,
    /// Narrative analysis (disabled when no API key is configured)
    pub analysis: Option<AnalysisConfig>,
    /// File holding the durable part of the application state
    pub state_file: PathBuf,
    /// What the store does when asked to change a dog it does not hold
    pub missing_dog_policy: MissingDogPolicy,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// Hosted data store configuration.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct DataStoreConfig {
    pub url: Url,
    pub api_key: SecretString,
}

impl std::fmt::Debug for DataStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStoreConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Chat-completion API configuration.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct AnalysisConfig {
    pub api_key: SecretString,
    pub api_url: Url,
    pub model: String,
}

impl std::fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_url", &self.api_url.as_str())
            .field("model", &self.model)
            .finish()
    }
}

/// Source of configuration values. Production reads the process
/// environment; tests pass a map.
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    fn url(&self, key: &str, value: &str) -> Result<Url, ConfigError> {
        let url = Url::parse(value)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(url)
    }

    fn secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }

    fn flag(&self, key: &str) -> bool {
        self.optional(key)
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets look like placeholders.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AdminConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(lookup);

        let data_store = DataStoreConfig {
            url: vars.url("DATA_STORE_URL", &vars.required("DATA_STORE_URL")?)?,
            api_key: vars.secret("DATA_STORE_KEY")?,
        };

        let analysis = match vars.optional("ANALYSIS_API_KEY") {
            Some(_) => Some(AnalysisConfig {
                api_key: vars.secret("ANALYSIS_API_KEY")?,
                api_url: vars.url(
                    "ANALYSIS_API_URL",
                    &vars.or_default("ANALYSIS_API_URL", DEFAULT_ANALYSIS_URL),
                )?,
                model: vars.or_default("ANALYSIS_MODEL", DEFAULT_ANALYSIS_MODEL),
            }),
            None => None,
        };

        Ok(Self {
            host: vars.parsed("KENNEL_HOST", "127.0.0.1")?,
            port: vars.parsed("KENNEL_PORT", "3001")?,
            data_store,
            analysis,
            state_file: PathBuf::from(vars.or_default("KENNEL_STATE_FILE", DEFAULT_STATE_FILE)),
            missing_dog_policy: vars.parsed("KENNEL_MISSING_DOG_POLICY", "ignore")?,
            log_json: vars.flag("KENNEL_LOG_JSON"),
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the analysis configuration, if narrative analysis is enabled.
    #[must_use]
    pub const fn analysis(&self) -> Option<&AnalysisConfig> {
        self.analysis.as_ref()
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }
    #[allow(clippy::cast_precision_loss)] // key lengths are far below f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject obvious placeholders and low-entropy strings.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"),
        ));
    }
    Ok(())
}
