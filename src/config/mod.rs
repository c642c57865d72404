//! Configuration loaded from the environment, `.env` and optional files

pub mod app_config;

pub use app_config::{AppConfiguration, DatabaseConfig, LoggingConfig, SagaConfig};
