// Error types module

use thiserror::Error;

/// Centralized error type for the instrumentation layer
///
/// Only setup paths (config loading, metric registration, subscriber
/// installation) return these. Observation calls never fail.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Configuration errors (invalid YAML values, missing env vars, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Registration with the Prometheus registry failed (duplicate name, bad label schema)
    #[error("Metric registration error: {0}")]
    Registration(#[from] prometheus::Error),

    #[error("Failed to encode metrics: {0}")]
    Encode(String),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
