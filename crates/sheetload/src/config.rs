//! Configuration management.
//!
//! Every setting comes from an environment variable with a default, and a
//! `.env` file in the working directory is honoured. A value that is set
//! but does not parse is an error rather than a silent fallback.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::db::WarehouseOptions;
use crate::error::ConfigError;
use crate::reader::RetryPolicy;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_DB_HOST: &str = "db";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_USER: &str = "admin";
pub const DEFAULT_DB_PASSWORD: &str = "password";
pub const DEFAULT_DB_NAME: &str = "entrepot";
pub const DEFAULT_DB_SCHEMA: &str = "warehouse";

pub const DEFAULT_WATCH_DIRECTORY: &str = "/app/data";

/// Seconds between polling cycles.
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 1;

/// Seconds to wait after a cycle fails.
pub const DEFAULT_ERROR_BACKOFF_SECS: u64 = 10;

/// Seconds to wait after the warehouse could not be reached.
pub const DEFAULT_RECONNECT_BACKOFF_SECS: u64 = 5;

pub const DEFAULT_READ_MAX_ATTEMPTS: u32 = crate::reader::DEFAULT_MAX_ATTEMPTS;
pub const DEFAULT_READ_RETRY_DELAY_SECS: u64 = 2;

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub watch: WatchConfig,
    pub reader: ReaderConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub schema: String,
    /// Full URL from `DATABASE_URL`, used instead of the fields above.
    #[serde(skip_serializing)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchConfig {
    pub directory: PathBuf,
    pub polling_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub reconnect_backoff_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReaderConfig {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{}'", other)),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's
    /// value or `None` when unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Config {
            database: DatabaseConfig {
                host: text("DB_HOST", DEFAULT_DB_HOST),
                port: parse_var(&lookup, "DB_PORT", DEFAULT_DB_PORT)?,
                user: text("DB_USER", DEFAULT_DB_USER),
                password: text("DB_PASSWORD", DEFAULT_DB_PASSWORD),
                name: text("DB_NAME", DEFAULT_DB_NAME),
                schema: text("DB_SCHEMA", DEFAULT_DB_SCHEMA),
                url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            },
            watch: WatchConfig {
                directory: PathBuf::from(text("WATCH_DIRECTORY", DEFAULT_WATCH_DIRECTORY)),
                polling_interval_secs: parse_var(
                    &lookup,
                    "POLLING_INTERVAL",
                    DEFAULT_POLLING_INTERVAL_SECS,
                )?,
                error_backoff_secs: parse_var(&lookup, "ERROR_BACKOFF", DEFAULT_ERROR_BACKOFF_SECS)?,
                reconnect_backoff_secs: parse_var(
                    &lookup,
                    "RECONNECT_BACKOFF",
                    DEFAULT_RECONNECT_BACKOFF_SECS,
                )?,
            },
            reader: ReaderConfig {
                max_attempts: parse_var(&lookup, "READ_MAX_ATTEMPTS", DEFAULT_READ_MAX_ATTEMPTS)?,
                retry_delay_secs: parse_var(
                    &lookup,
                    "READ_RETRY_DELAY",
                    DEFAULT_READ_RETRY_DELAY_SECS,
                )?,
            },
            log_format: parse_var(&lookup, "LOG_FORMAT", LogFormat::default())?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reader.max_attempts == 0 {
            return Err(ConfigError::Validation {
                message: "READ_MAX_ATTEMPTS must be at least 1".to_string(),
            });
        }

        if self.database.url.is_none() {
            if self.database.host.trim().is_empty() {
                return Err(ConfigError::Validation {
                    message: "DB_HOST cannot be empty".to_string(),
                });
            }
            if self.database.port == 0 {
                return Err(ConfigError::Validation {
                    message: "DB_PORT must be greater than 0".to_string(),
                });
            }
            if self.database.name.trim().is_empty() {
                return Err(ConfigError::Validation {
                    message: "DB_NAME cannot be empty".to_string(),
                });
            }
        }

        if self.database.schema.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "DB_SCHEMA cannot be empty".to_string(),
            });
        }

        if self.watch.directory.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                message: "WATCH_DIRECTORY cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// `DATABASE_URL` when set, otherwise a PostgreSQL URL built from the
    /// individual fields. User and password are percent-encoded.
    pub fn database_url(&self) -> String {
        match &self.database.url {
            Some(url) => url.clone(),
            None => format!(
                "postgresql://{}:{}@{}:{}/{}",
                urlencoding::encode(&self.database.user),
                urlencoding::encode(&self.database.password),
                self.database.host,
                self.database.port,
                self.database.name
            ),
        }
    }

    pub fn warehouse_options(&self) -> WarehouseOptions {
        WarehouseOptions::new(self.database_url()).with_schema(self.database.schema.clone())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.reader.max_attempts,
            Duration::from_secs(self.reader.retry_delay_secs),
        )
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.watch.polling_interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.watch.error_backoff_secs)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.watch.reconnect_backoff_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                host: DEFAULT_DB_HOST.to_string(),
                port: DEFAULT_DB_PORT,
                user: DEFAULT_DB_USER.to_string(),
                password: DEFAULT_DB_PASSWORD.to_string(),
                name: DEFAULT_DB_NAME.to_string(),
                schema: DEFAULT_DB_SCHEMA.to_string(),
                url: None,
            },
            watch: WatchConfig {
                directory: PathBuf::from(DEFAULT_WATCH_DIRECTORY),
                polling_interval_secs: DEFAULT_POLLING_INTERVAL_SECS,
                error_backoff_secs: DEFAULT_ERROR_BACKOFF_SECS,
                reconnect_backoff_secs: DEFAULT_RECONNECT_BACKOFF_SECS,
            },
            reader: ReaderConfig {
                max_attempts: DEFAULT_READ_MAX_ATTEMPTS,
                retry_delay_secs: DEFAULT_READ_RETRY_DELAY_SECS,
            },
            log_format: LogFormat::default(),
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                value,
                reason: e.to_string(),
            }),
    }
}
