// Configuration module
// Loads instrumentation settings from YAML with ${VAR} environment substitution

use crate::error::{MetricsError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Top-level instrumentation configuration
///
/// ```yaml
/// namespace: kine
/// slow_sql:
///   threshold_ms: 1000   # <= 0 disables slow SQL logging
/// logging:
///   level: info
///   format: text
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prefix joined to every metric name with `_` (default: "kine")
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default)]
    pub slow_sql: SlowSqlConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            slow_sql: SlowSqlConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Slow SQL logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlowSqlConfig {
    /// Threshold in milliseconds (default: 1000ms = 1 second).
    /// Zero or negative disables slow SQL logging.
    #[serde(default = "default_slow_sql_threshold_ms")]
    pub threshold_ms: i64,
}

impl SlowSqlConfig {
    /// The configured threshold, or `None` when logging is disabled
    pub fn threshold(&self) -> Option<Duration> {
        if self.threshold_ms > 0 {
            Some(Duration::from_millis(self.threshold_ms as u64))
        } else {
            None
        }
    }
}

impl Default for SlowSqlConfig {
    fn default() -> Self {
        Self {
            threshold_ms: default_slow_sql_threshold_ms(),
        }
    }
}

/// Log subscriber configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter; RUST_LOG takes precedence when set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl LoggingConfig {
    pub fn log_format(&self) -> LogFormat {
        match self.format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Log output format enum for validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

static ENV_VAR_RE: OnceLock<Regex> = OnceLock::new();
static METRIC_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn env_var_re() -> &'static Regex {
    ENV_VAR_RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
    })
}

fn metric_name_re() -> &'static Regex {
    METRIC_NAME_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("metric name pattern is a valid regex")
    })
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

// Default value functions
fn default_namespace() -> String {
    "kine".to_string()
}

fn default_slow_sql_threshold_ms() -> i64 {
    1000 // 1 second
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl MetricsConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self> {
        // Replace ${VAR_NAME} with environment variable values
        let re = env_var_re();

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                MetricsError::Config(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        let config: MetricsConfig = serde_yaml::from_str(&substituted)?;
        Ok(config)
    }

    /// Serialize the effective configuration, defaults included
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        // Metric names are built as <namespace>_<name>, so the namespace
        // must itself be a valid Prometheus name fragment
        let name_re = metric_name_re();
        if self.namespace.is_empty() {
            return Err(MetricsError::Config(
                "namespace cannot be empty".to_string(),
            ));
        }
        if !name_re.is_match(&self.namespace) {
            return Err(MetricsError::Config(format!(
                "namespace '{}' is not a valid metric name prefix",
                self.namespace
            )));
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(MetricsError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        let format = self.logging.format.to_lowercase();
        if !LOG_FORMATS.contains(&format.as_str()) {
            return Err(MetricsError::Config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                LOG_FORMATS.join(", ")
            )));
        }

        Ok(())
    }
}
