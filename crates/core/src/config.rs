//! Process-wide settings, built once at startup from the environment.
//!
//! Every value has an explicit environment variable and, for operational
//! knobs, a default.
//! Missing required values are a fatal configuration error and the service
//! refuses to start.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("missing required environment variable: {0}")]
  MissingVar(&'static str),
  #[error("environment variable {name} has an invalid value {value:?}: {reason}")]
  InvalidVar {
    name: &'static str,
    value: String,
    reason: String,
  },
}

/// Exponential backoff policy for connection-class failures.
///
/// Shared by the database pool connect and the search index HTTP client;
/// see `filmsync_core::retry`.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
  pub max_attempts: u32,
  pub max_elapsed: Duration,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_attempts: 10,
      max_elapsed: Duration::from_secs(45),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Settings {
  pub postgres_db: String,
  pub postgres_user: String,
  pub postgres_password: String,
  pub postgres_host: String,
  pub postgres_port: u16,

  pub es_host: String,

  /// Delay between successful passes.
  pub sleep_interval: Duration,
  /// Delay after an aborted pass; shorter than `sleep_interval` by default.
  pub failed_pass_sleep: Duration,

  /// Rows requested per extractor page.
  pub batch_size: i64,

  /// Where the checkpoint is persisted between restarts.
  pub checkpoint_path: std::path::PathBuf,

  pub connect_timeout: Duration,
  pub request_timeout: Duration,
  pub retry: RetryConfig,
}

impl Settings {
  /// Build settings from the environment, loading a `.env` file first if present.
  pub fn from_env() -> Result<Self, ConfigError> {
    let _ = dotenvy::dotenv();

    Ok(Self {
      postgres_db: require_var("POSTGRES_DB")?,
      postgres_user: require_var("POSTGRES_USER")?,
      postgres_password: require_var("POSTGRES_PASSWORD")?,
      postgres_host: var_or("POSTGRES_HOST", "localhost"),
      postgres_port: parse_var_or("POSTGRES_PORT", 5432)?,

      es_host: var_or("ES_HOST", "http://localhost:9200"),

      sleep_interval: Duration::from_secs(parse_var_or("SLEEP_INTERVAL", 60)?),
      failed_pass_sleep: Duration::from_secs(parse_var_or("FAILED_PASS_SLEEP_SECONDS", 60)?),

      batch_size: parse_var_or("BATCH_SIZE", 100)?,

      checkpoint_path: var_or("STATE_FILE_PATH", "state.json").into(),

      connect_timeout: Duration::from_secs(parse_var_or("CONNECT_TIMEOUT_SECONDS", 5)?),
      request_timeout: Duration::from_secs(parse_var_or("REQUEST_TIMEOUT_SECONDS", 30)?),
      retry: RetryConfig {
        max_attempts: parse_var_or("RETRY_MAX_ATTEMPTS", 10)?,
        max_elapsed: Duration::from_secs(parse_var_or("RETRY_MAX_ELAPSED_SECONDS", 45)?),
      },
    })
  }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
  std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn var_or(name: &'static str, default: &str) -> String {
  std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
  T: std::str::FromStr,
  T::Err: std::fmt::Display,
{
  match std::env::var(name) {
    Err(_) => Ok(default),
    Ok(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
      name,
      value,
      reason: e.to_string(),
    }),
  }
}
