//! Application settings for the optimization pipeline.
//!
//! Settings come from environment variables with sensible defaults;
//! individual services validate the keys they need at the point of use, so
//! the process can start without a complete environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

/// Settings for the pipeline and its collaborators.
#[derive(Debug, Clone)]
pub struct Settings {
    // LLM settings
    /// API key for the chat-completions endpoint.
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible endpoint.
    pub api_base: String,
    /// Primary (strong) model used for evaluation.
    pub primary_model: String,
    /// Secondary (fast) model used for routing decisions.
    pub secondary_model: String,
    /// Temperature for evaluation calls. Routing always runs at 0.
    pub evaluation_temperature: f64,
    /// Per-request timeout on external calls.
    pub request_timeout: Duration,

    // Pipeline settings
    /// Optional path to a corpus document; built-in guidance when absent.
    pub corpus_path: Option<PathBuf>,

    // History settings
    /// Entries retained per caller.
    pub history_cap: usize,
    /// Optional SQLite URL for history persistence.
    pub database_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://api.groq.com/openai/v1".to_string(),
            primary_model: "llama-3.3-70b-versatile".to_string(),
            secondary_model: "llama-3.1-8b-instant".to_string(),
            evaluation_temperature: 0.3,
            request_timeout: Duration::from_secs(120),
            corpus_path: None,
            history_cap: crate::history::DEFAULT_HISTORY_CAP,
            database_url: None,
        }
    }
}

impl Settings {
    /// Load settings from the environment, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `GROQ_API_KEY`
    /// - `PROMPTMASTER_API_BASE`
    /// - `PROMPTMASTER_PRIMARY_MODEL`
    /// - `PROMPTMASTER_SECONDARY_MODEL`
    /// - `PROMPTMASTER_EVAL_TEMPERATURE`
    /// - `PROMPTMASTER_REQUEST_TIMEOUT_SECS`
    /// - `PROMPTMASTER_CORPUS_PATH`
    /// - `PROMPTMASTER_HISTORY_CAP`
    /// - `PROMPTMASTER_DATABASE_URL`
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let settings = Self {
            api_key: env::var(API_KEY_VAR).ok(),
            api_base: env::var("PROMPTMASTER_API_BASE").unwrap_or(defaults.api_base),
            primary_model: env::var("PROMPTMASTER_PRIMARY_MODEL").unwrap_or(defaults.primary_model),
            secondary_model: env::var("PROMPTMASTER_SECONDARY_MODEL")
                .unwrap_or(defaults.secondary_model),
            evaluation_temperature: parse_env(
                "PROMPTMASTER_EVAL_TEMPERATURE",
                defaults.evaluation_temperature,
            )?,
            request_timeout: Duration::from_secs(parse_env(
                "PROMPTMASTER_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            corpus_path: env::var("PROMPTMASTER_CORPUS_PATH").ok().map(PathBuf::from),
            history_cap: parse_env("PROMPTMASTER_HISTORY_CAP", defaults.history_cap)?,
            database_url: env::var("PROMPTMASTER_DATABASE_URL").ok(),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "api_base must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.evaluation_temperature) {
            return Err(ConfigError::ValidationFailed(format!(
                "evaluation_temperature {} outside [0.0, 2.0]",
                self.evaluation_temperature
            )));
        }
        if self.history_cap == 0 {
            return Err(ConfigError::ValidationFailed(
                "history_cap must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The API key, or a configuration error naming the missing variable.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar(API_KEY_VAR.to_string()))
    }
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
