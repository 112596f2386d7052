// Metrics module - Prometheus instruments for SQL, compaction and TTL activity
//
// Provides:
// - Operation counters (SQL calls by error code, compactions by result)
// - Latency histograms (SQL calls, compactions, TTL deletions)
// - Gauges (active watchers, TTL cache size)
//
// Metric names and label schemas are consumed by dashboards and alerts.
// Do not rename them.

use crate::error::{MetricsError, Result};
use prometheus::core::Collector;
use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::fmt;

/// Result label for operations that completed without error
pub const RESULT_SUCCESS: &str = "success";

/// Result label for operations that returned an error
pub const RESULT_ERROR: &str = "error";

/// Label on the SQL counter and latency histogram
pub const LABEL_ERROR_CODE: &str = "error_code";

/// Label on the compaction and TTL instruments
pub const LABEL_RESULT: &str = "result";

/// Bucket boundaries for per-statement SQL latency (seconds)
///
/// Dense below one second where most statements land, then progressively
/// coarser up to 30s.
pub const SQL_TIME_BUCKETS: [f64; 35] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.15, 0.2, 0.25, 0.3, 0.35, 0.4, 0.45, 0.5, 0.6, 0.7, 0.8,
    0.9, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 15.0, 20.0, 25.0,
    30.0,
];

/// Map an optional error to the binary result label
pub fn result_label<E: ?Sized>(err: Option<&E>) -> &'static str {
    match err {
        Some(_) => RESULT_ERROR,
        None => RESULT_SUCCESS,
    }
}

/// 1ms, 4ms, 16ms ... ~16s
fn maintenance_buckets() -> Result<Vec<f64>> {
    Ok(exponential_buckets(0.001, 4.0, 8)?)
}

/// The fixed set of instruments for the SQL backend
///
/// Built once per process against a registry and shared as `Arc<SqlMetrics>`
/// with every collaborator that updates an instrument. The prometheus types
/// are internally atomic, so no outer locking is needed.
#[derive(Clone)]
pub struct SqlMetrics {
    /// Total number of SQL operations, by error code
    pub sql_total: IntCounterVec,

    /// Per-operation SQL latency in seconds, by error code
    pub sql_time: HistogramVec,

    /// Total number of compactions, by result
    pub compact_total: IntCounterVec,

    /// Number of live watch listeners
    pub active_watch_goroutines: IntGauge,

    /// Compaction latency in seconds, by result
    pub compaction_latency: HistogramVec,

    /// Size of the cache used by TTL expiration
    pub ttl_deletion_cache_size: IntGauge,

    /// Latency of TTL-triggered deletions in seconds, by result
    pub ttl_deletion_latency: HistogramVec,
}

impl SqlMetrics {
    /// Create every instrument under `namespace` and register it with `registry`
    ///
    /// Fails if any name is already registered or the namespace produces an
    /// invalid metric name. Call once at startup.
    pub fn register(registry: &Registry, namespace: &str) -> Result<Self> {
        let sql_total = IntCounterVec::new(
            Opts::new("sql_total", "Total number of SQL operations").namespace(namespace),
            &[LABEL_ERROR_CODE],
        )?;

        let sql_time = HistogramVec::new(
            HistogramOpts::new("sql_time_seconds", "Length of time per SQL operation")
                .namespace(namespace)
                .buckets(SQL_TIME_BUCKETS.to_vec()),
            &[LABEL_ERROR_CODE],
        )?;

        let compact_total = IntCounterVec::new(
            Opts::new("compact_total", "Total number of compactions").namespace(namespace),
            &[LABEL_RESULT],
        )?;

        let active_watch_goroutines = IntGauge::with_opts(
            Opts::new(
                "sql_active_watch_goroutines",
                "Number of active WATCH goroutines",
            )
            .namespace(namespace),
        )?;

        let compaction_latency = HistogramVec::new(
            HistogramOpts::new(
                "sql_compaction_latency_seconds",
                "Histogram measuring the latency of database compaction operations",
            )
            .namespace(namespace)
            .buckets(maintenance_buckets()?),
            &[LABEL_RESULT],
        )?;

        let ttl_deletion_cache_size = IntGauge::with_opts(
            Opts::new(
                "sql_ttl_deletion_cache_size",
                "Gauge measuring the size of the cache used by TTL expiration",
            )
            .namespace(namespace),
        )?;

        let ttl_deletion_latency = HistogramVec::new(
            HistogramOpts::new(
                "sql_ttl_deletion_latency_seconds",
                "Histogram measuring the latency of deletions caused by TTL expiration",
            )
            .namespace(namespace)
            .buckets(maintenance_buckets()?),
            &[LABEL_RESULT],
        )?;

        registry.register(Box::new(sql_total.clone()))?;
        registry.register(Box::new(sql_time.clone()))?;
        registry.register(Box::new(compact_total.clone()))?;
        registry.register(Box::new(active_watch_goroutines.clone()))?;
        registry.register(Box::new(compaction_latency.clone()))?;
        registry.register(Box::new(ttl_deletion_cache_size.clone()))?;
        registry.register(Box::new(ttl_deletion_latency.clone()))?;

        tracing::debug!(namespace = %namespace, "Registered SQL metrics");

        Ok(SqlMetrics {
            sql_total,
            sql_time,
            compact_total,
            active_watch_goroutines,
            compaction_latency,
            ttl_deletion_cache_size,
            ttl_deletion_latency,
        })
    }
}

/// Static description of one instrument: the name/label contract without any series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    pub kind: &'static str,
    pub labels: Vec<String>,
}

impl SqlMetrics {
    /// Describe every instrument in registration order
    ///
    /// Unlike `Registry::gather`, this includes vectors that have no label
    /// children yet, and it never creates series.
    pub fn descriptors(&self) -> Vec<MetricDescriptor> {
        let instruments: [(&dyn Collector, &'static str); 7] = [
            (&self.sql_total, "counter"),
            (&self.sql_time, "histogram"),
            (&self.compact_total, "counter"),
            (&self.active_watch_goroutines, "gauge"),
            (&self.compaction_latency, "histogram"),
            (&self.ttl_deletion_cache_size, "gauge"),
            (&self.ttl_deletion_latency, "histogram"),
        ];

        instruments
            .into_iter()
            .flat_map(|(collector, kind)| {
                collector.desc().into_iter().map(move |desc| MetricDescriptor {
                    name: desc.fq_name.clone(),
                    help: desc.help.clone(),
                    kind,
                    labels: desc.variable_labels.clone(),
                })
            })
            .collect()
    }
}

/// Render the name/label contract of `metrics`, one block per instrument
///
/// ```text
/// # HELP kine_sql_total Total number of SQL operations
/// # TYPE kine_sql_total counter
/// # LABELS kine_sql_total error_code
/// ```
pub fn describe_contract(metrics: &SqlMetrics) -> String {
    let mut out = String::new();
    for desc in metrics.descriptors() {
        out.push_str(&format!("# HELP {} {}\n", desc.name, desc.help));
        out.push_str(&format!("# TYPE {} {}\n", desc.name, desc.kind));
        if !desc.labels.is_empty() {
            out.push_str(&format!("# LABELS {} {}\n", desc.name, desc.labels.join(",")));
        }
    }
    out
}

impl fmt::Debug for SqlMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlMetrics")
            .field("active_watch_goroutines", &self.active_watch_goroutines.get())
            .field("ttl_deletion_cache_size", &self.ttl_deletion_cache_size.get())
            .finish_non_exhaustive()
    }
}

/// Render every metric family in `registry` in the Prometheus text format
pub fn encode_text(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| MetricsError::Encode(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| MetricsError::Encode(e.to_string()))
}
