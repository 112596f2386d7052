//! Slow SQL Logging Module
//!
//! Emits one diagnostic log line for every SQL statement whose elapsed time
//! reaches a configurable threshold, so operators can find slow statements
//! without turning on full query logging.
//!
//! # Features
//!
//! - **Configurable threshold**: set in milliseconds, zero or negative disables logging
//! - **Runtime override**: the threshold can be changed while statements are in flight
//! - **Greppable output**: one INFO line carrying start time, total time, statement and arguments
//!
//! # Example
//!
//! ```yaml
//! slow_sql:
//!   threshold_ms: 500  # Log statements taking >= 500ms
//! ```

use crate::config::SlowSqlConfig;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Process-wide slow SQL threshold
///
/// Stored as nanoseconds in a single atomic. Readers see either the old or
/// the new value of a concurrent update, never a partial one. A value of
/// zero or less means slow SQL logging is disabled.
#[derive(Debug)]
pub struct SlowSqlThreshold {
    nanos: AtomicI64,
}

impl SlowSqlThreshold {
    /// Create a threshold; `None` disables slow SQL logging
    pub fn new(threshold: Option<Duration>) -> Self {
        Self {
            nanos: AtomicI64::new(threshold.map(duration_to_nanos).unwrap_or(0)),
        }
    }

    /// Create a threshold from config
    pub fn from_config(config: &SlowSqlConfig) -> Self {
        let threshold = Self::disabled();
        threshold.set_millis(config.threshold_ms);
        threshold
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Current threshold, or `None` when disabled
    pub fn get(&self) -> Option<Duration> {
        let nanos = self.nanos.load(Ordering::Relaxed);
        if nanos > 0 {
            Some(Duration::from_nanos(nanos as u64))
        } else {
            None
        }
    }

    /// Override the threshold; applies to statements observed after the store
    pub fn set(&self, threshold: Duration) {
        self.nanos
            .store(duration_to_nanos(threshold), Ordering::Relaxed);
    }

    /// Override the threshold in milliseconds; zero or negative disables
    pub fn set_millis(&self, threshold_ms: i64) {
        let nanos = threshold_ms.max(0).saturating_mul(1_000_000);
        self.nanos.store(nanos, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.nanos.store(0, Ordering::Relaxed);
    }

    /// Check if slow SQL logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.get().is_some()
    }

    /// Whether a statement that ran for `elapsed` counts as slow
    pub fn is_slow(&self, elapsed: Duration) -> bool {
        match self.get() {
            Some(threshold) => elapsed >= threshold,
            None => false,
        }
    }

    /// Log the statement if `elapsed` reaches the threshold
    ///
    /// Returns whether a line was emitted.
    pub fn log_if_slow(
        &self,
        started: DateTime<Utc>,
        elapsed: Duration,
        statement: &str,
        args: &[&dyn fmt::Debug],
    ) -> bool {
        // Read once so the comparison and the logged threshold agree
        let threshold = match self.get() {
            Some(threshold) => threshold,
            None => return false,
        };

        if elapsed < threshold {
            return false;
        }

        tracing::info!(
            threshold_ms = threshold.as_millis() as u64,
            elapsed_ms = elapsed.as_millis() as u64,
            "Slow SQL (started: {}) (total time: {:?}): {} : {:?}",
            started.to_rfc3339_opts(SecondsFormat::Micros, true),
            elapsed,
            statement,
            args
        );

        true
    }
}

impl Default for SlowSqlThreshold {
    fn default() -> Self {
        Self::from_config(&SlowSqlConfig::default())
    }
}

fn duration_to_nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}
