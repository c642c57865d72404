use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfiguration {
    pub saga: SagaConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Execution settings for the saga orchestrator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SagaConfig {
    /// Retry budget for steps whose definition does not set one
    pub default_max_retries: u32,
    pub retry_delay_ms: u64,
    pub retry_backoff_multiplier: f64,
    pub max_retry_delay_ms: u64,
    /// Per-invocation limit for forward and compensating actions
    pub step_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub mongodb_uri: String,
    pub database_name: String,
    pub instances_collection: String,
    pub steps_collection: String,
    pub logs_collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json", "pretty" or "compact"
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            default_max_retries: 0,
            retry_delay_ms: 100,
            retry_backoff_multiplier: 2.0,
            max_retry_delay_ms: 5000,
            step_timeout_ms: None,
        }
    }
}

impl SagaConfig {
    /// Delay before retry number `attempt` (1-based), capped by `max_retry_delay_ms`
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay = self.retry_delay_ms as f64 * self.retry_backoff_multiplier.powi(exponent);
        let capped = delay.min(self.max_retry_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database_name: "sagas".to_string(),
            instances_collection: "saga_instances".to_string(),
            steps_collection: "saga_steps".to_string(),
            logs_collection: "saga_logs".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl AppConfiguration {
    /// Load configuration from `.env`, environment variables and an optional
    /// config file named by `CONFIG_FILE`
    pub fn from_env() -> Result<Self> {
        match dotenv::dotenv() {
            Ok(_) => debug!("Loaded .env file"),
            Err(_) => debug!("No .env file found, using system environment variables"),
        }

        let mut config = match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        info!(
            default_max_retries = config.saga.default_max_retries,
            step_timeout_ms = ?config.saga.step_timeout_ms,
            database = %config.database.database_name,
            "📋 Configuration loaded successfully"
        );
        Ok(config)
    }

    /// Load configuration from a YAML or JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read config file {}: {}", path, e))
        })?;

        let config = if path.ends_with(".yaml") || path.ends_with(".yml") {
            serde_yaml::from_str(&content)
                .map_err(|e| AppError::ConfigError(format!("Invalid YAML config: {}", e)))?
        } else if path.ends_with(".json") {
            serde_json::from_str(&content)
                .map_err(|e| AppError::ConfigError(format!("Invalid JSON config: {}", e)))?
        } else {
            return Err(AppError::ConfigError(
                "Config file must be .yaml, .yml, or .json".to_string(),
            ));
        };

        debug!(path = path, "📁 Configuration loaded from file");
        Ok(config)
    }

    /// Override settings from variables looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SAGA_DEFAULT_MAX_RETRIES") {
            self.saga.default_max_retries = parse_var("SAGA_DEFAULT_MAX_RETRIES", &value)?;
        }
        if let Some(value) = lookup("SAGA_RETRY_DELAY_MS") {
            self.saga.retry_delay_ms = parse_var("SAGA_RETRY_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("SAGA_RETRY_BACKOFF_MULTIPLIER") {
            self.saga.retry_backoff_multiplier =
                parse_var("SAGA_RETRY_BACKOFF_MULTIPLIER", &value)?;
        }
        if let Some(value) = lookup("SAGA_MAX_RETRY_DELAY_MS") {
            self.saga.max_retry_delay_ms = parse_var("SAGA_MAX_RETRY_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("SAGA_STEP_TIMEOUT_MS") {
            let timeout: u64 = parse_var("SAGA_STEP_TIMEOUT_MS", &value)?;
            self.saga.step_timeout_ms = (timeout > 0).then_some(timeout);
        }

        if let Some(uri) = lookup("MONGODB_URI") {
            self.database.mongodb_uri = uri;
        }
        if let Some(db_name) = lookup("MONGODB_DATABASE") {
            self.database.database_name = db_name;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }

        debug!("🔧 Configuration loaded from environment variables");
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.saga.retry_backoff_multiplier < 1.0 {
            return Err(AppError::ConfigError(
                "Retry backoff multiplier must be at least 1.0".to_string(),
            ));
        }

        if self.saga.max_retry_delay_ms < self.saga.retry_delay_ms {
            return Err(AppError::ConfigError(
                "Max retry delay cannot be lower than the initial retry delay".to_string(),
            ));
        }

        if self.database.mongodb_uri.is_empty() {
            return Err(AppError::ConfigError("MongoDB URI is required".to_string()));
        }

        if self.database.database_name.is_empty() {
            return Err(AppError::ConfigError(
                "MongoDB database name is required".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(AppError::ConfigError("Invalid log level".to_string())),
        }

        match self.logging.format.as_str() {
            "json" | "pretty" | "compact" => {}
            other => {
                return Err(AppError::ConfigError(format!(
                    "Invalid log format: {}",
                    other
                )))
            }
        }

        debug!("✅ Configuration validation passed");
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", name, e)))
}
