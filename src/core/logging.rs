use crate::{config::LoggingConfig, error::Result};
use tracing::{info, Subscriber};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Filter used when `RUST_LOG` is unset and no level is configured
pub const DEFAULT_LOG_FILTER: &str = "warn,saga_coordinator=info";

/// Initialize structured logging: `RUST_LOG`, else the default filter,
/// compact output
pub fn init_structured_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig {
        level: String::new(),
        format: "compact".to_string(),
    })
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let level = normalize_level(&config.level);

    build_subscriber(config).try_init().map_err(|e| {
        crate::error::AppError::ConfigError(format!("Logging already initialized: {}", e))
    })?;

    info!(
        level = level,
        format = %config.format,
        "📝 Structured logging initialized with custom configuration"
    );
    Ok(())
}

/// Subscriber for `config`. `RUST_LOG` wins over the configured level.
fn build_subscriber(config: &LoggingConfig) -> impl Subscriber + Send + Sync + 'static {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for(&config.level)));

    let fmt_layer = match config.format.as_str() {
        "json" => fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::ChronoUtc::rfc_3339())
            .json()
            .boxed(),
        "pretty" => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::ChronoUtc::rfc_3339())
            .pretty()
            .boxed(),
        _ => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_span_events(FmtSpan::NONE)
            .with_timer(fmt::time::ChronoUtc::rfc_3339())
            .compact()
            .boxed(),
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer)
}

fn filter_for(level: &str) -> String {
    if level.trim().is_empty() {
        DEFAULT_LOG_FILTER.to_string()
    } else {
        format!("warn,saga_coordinator={}", normalize_level(level))
    }
}

fn normalize_level(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}
