// Kine Metrics Library
// Prometheus instrumentation and slow SQL diagnostics for the SQL backend

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod observability;

pub use config::MetricsConfig;
pub use error::{MetricsError, Result};
pub use metrics::SqlMetrics;
pub use observability::{ActiveWatchGuard, SlowSqlThreshold, SqlObserver};
