// Observation recorder
// Called by the SQL backend after every statement, compaction and TTL sweep

use crate::config::MetricsConfig;
use crate::error::Result;
use crate::metrics::{result_label, SqlMetrics};
use crate::observability::slow_sql::SlowSqlThreshold;
use chrono::Utc;
use prometheus::{IntGauge, Registry};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Records metrics for finished SQL backend operations
///
/// Every method runs synchronously on the caller's thread and never fails.
/// Share one instance per process behind an `Arc`.
#[derive(Debug)]
pub struct SqlObserver {
    metrics: Arc<SqlMetrics>,
    slow_sql: SlowSqlThreshold,
}

impl SqlObserver {
    pub fn new(metrics: Arc<SqlMetrics>, slow_sql: SlowSqlThreshold) -> Self {
        Self { metrics, slow_sql }
    }

    /// Register the metric bundle on `registry` and build an observer from config
    pub fn from_config(registry: &Registry, config: &MetricsConfig) -> Result<Self> {
        let metrics = SqlMetrics::register(registry, &config.namespace)?;
        Ok(Self::new(
            Arc::new(metrics),
            SlowSqlThreshold::from_config(&config.slow_sql),
        ))
    }

    pub fn metrics(&self) -> &Arc<SqlMetrics> {
        &self.metrics
    }

    /// The shared slow SQL threshold, for runtime overrides
    pub fn slow_sql_threshold(&self) -> &SlowSqlThreshold {
        &self.slow_sql
    }

    /// Record one SQL statement that started at `start`
    ///
    /// Always counts the call and observes its latency under `error_code`.
    /// Logs the statement and its arguments when the elapsed time reaches
    /// the slow SQL threshold.
    pub fn observe_sql(
        &self,
        start: Instant,
        error_code: &str,
        statement: &str,
        args: &[&dyn fmt::Debug],
    ) {
        let elapsed = start.elapsed();

        self.metrics.sql_total.with_label_values(&[error_code]).inc();
        self.metrics
            .sql_time
            .with_label_values(&[error_code])
            .observe(elapsed.as_secs_f64());

        self.slow_sql
            .log_if_slow(started_at(elapsed), elapsed, statement, args);
    }

    /// Observe compaction latency under `success` or `error`
    ///
    /// Does not touch the compaction counter, see [`Self::inc_compact_total`].
    pub fn observe_sql_compaction(&self, start: Instant, err: Option<&dyn Error>) {
        self.metrics
            .compaction_latency
            .with_label_values(&[result_label(err)])
            .observe(start.elapsed().as_secs_f64());
    }

    /// Count one compaction under `success` or `error`
    pub fn inc_compact_total(&self, err: Option<&dyn Error>) {
        self.metrics
            .compact_total
            .with_label_values(&[result_label(err)])
            .inc();
    }

    /// Count one compaction attempt and observe its latency under the same result
    pub fn observe_compaction_attempt(&self, start: Instant, err: Option<&dyn Error>) {
        self.inc_compact_total(err);
        self.observe_sql_compaction(start, err);
    }

    /// Observe the latency of one TTL-triggered delete batch
    pub fn observe_ttl_deletion(&self, start: Instant, err: Option<&dyn Error>) {
        self.metrics
            .ttl_deletion_latency
            .with_label_values(&[result_label(err)])
            .observe(start.elapsed().as_secs_f64());
    }

    pub fn set_active_watchers(&self, count: usize) {
        self.metrics
            .active_watch_goroutines
            .set(saturating_i64(count));
    }

    pub fn set_ttl_cache_size(&self, size: usize) {
        self.metrics
            .ttl_deletion_cache_size
            .set(saturating_i64(size));
    }

    /// Track one watch listener for as long as the guard lives
    pub fn watch_guard(&self) -> ActiveWatchGuard {
        ActiveWatchGuard::new(self.metrics.active_watch_goroutines.clone())
    }
}

/// RAII guard for the active watch gauge
///
/// Increments on creation, decrements when dropped.
pub struct ActiveWatchGuard {
    gauge: IntGauge,
}

impl fmt::Debug for ActiveWatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveWatchGuard")
            .field("active", &self.gauge.get())
            .finish()
    }
}

impl ActiveWatchGuard {
    fn new(gauge: IntGauge) -> Self {
        gauge.inc();
        Self { gauge }
    }
}

impl Drop for ActiveWatchGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Wall-clock time at which an operation that ran for `elapsed` started
fn started_at(elapsed: Duration) -> chrono::DateTime<Utc> {
    let now = Utc::now();
    chrono::Duration::from_std(elapsed)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(now)
}

fn saturating_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
