// Logging module for structured logging using the tracing crate

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{MetricsError, Result};
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - Text or JSON formatting, per `config.format`
/// - Level filtering from `RUST_LOG`, falling back to `config.level`
/// - Output to stdout for container/cloud-native deployments
///
/// # Errors
///
/// Returns an error if the filter cannot be parsed or a global subscriber
/// is already installed.
///
/// # Examples
///
/// ```
/// use kine_metrics::config::LoggingConfig;
/// use kine_metrics::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
///
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match config.log_format() {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    result.map_err(|e| MetricsError::Logging(e.to_string()))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => level_filter(&config.level),
    }
}

fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).map_err(|e| MetricsError::Logging(e.to_string()))
}
