// Metric name and label contract tests
//
// Dashboards and alerts key on these exact names, so every family is checked
// through the text exposition format and the descriptor listing rather than
// through the Rust handles.

use kine_metrics::config::MetricsConfig;
use kine_metrics::metrics::{describe_contract, encode_text, RESULT_ERROR, RESULT_SUCCESS};
use kine_metrics::{MetricsError, SqlMetrics, SqlObserver};
use prometheus::Registry;
use std::io;
use std::time::Instant;

fn exercised_registry(namespace: &str) -> Registry {
    let registry = Registry::new();
    let config = MetricsConfig {
        namespace: namespace.to_string(),
        ..Default::default()
    };
    let observer = SqlObserver::from_config(&registry, &config).unwrap();
    let err = io::Error::new(io::ErrorKind::Other, "boom");

    observer.observe_sql(Instant::now(), RESULT_SUCCESS, "SELECT 1", &[]);
    observer.observe_compaction_attempt(Instant::now(), None);
    observer.observe_compaction_attempt(Instant::now(), Some(&err));
    observer.observe_ttl_deletion(Instant::now(), None);
    observer.set_active_watchers(3);
    observer.set_ttl_cache_size(12);

    registry
}

#[test]
fn test_exposition_names_and_types() {
    let text = encode_text(&exercised_registry("kine")).unwrap();

    for (name, kind) in [
        ("kine_sql_total", "counter"),
        ("kine_sql_time_seconds", "histogram"),
        ("kine_compact_total", "counter"),
        ("kine_sql_active_watch_goroutines", "gauge"),
        ("kine_sql_compaction_latency_seconds", "histogram"),
        ("kine_sql_ttl_deletion_cache_size", "gauge"),
        ("kine_sql_ttl_deletion_latency_seconds", "histogram"),
    ] {
        let type_line = format!("# TYPE {} {}", name, kind);
        assert!(text.contains(&type_line), "missing '{}' in:\n{}", type_line, text);
    }
}

#[test]
fn test_contract_lists_every_family_before_first_observation() {
    let registry = Registry::new();
    let observer = SqlObserver::from_config(&registry, &MetricsConfig::default()).unwrap();

    let contract = describe_contract(observer.metrics());
    for (name, kind) in [
        ("kine_sql_total", "counter"),
        ("kine_sql_time_seconds", "histogram"),
        ("kine_compact_total", "counter"),
        ("kine_sql_active_watch_goroutines", "gauge"),
        ("kine_sql_compaction_latency_seconds", "histogram"),
        ("kine_sql_ttl_deletion_cache_size", "gauge"),
        ("kine_sql_ttl_deletion_latency_seconds", "histogram"),
    ] {
        let type_line = format!("# TYPE {} {}", name, kind);
        assert!(contract.contains(&type_line), "missing '{}' in:\n{}", type_line, contract);
    }
    assert!(contract.contains("# LABELS kine_sql_total error_code"));
    assert!(contract.contains("# LABELS kine_compact_total result"));
    assert!(!contract.contains("# LABELS kine_sql_active_watch_goroutines"));
    assert!(contract.contains("# HELP kine_sql_total Total number of SQL operations"));

    // Listing the contract must not create series in the exposition
    let exposition = encode_text(&registry).unwrap();
    assert!(!exposition.contains("kine_sql_total"));
    assert!(!exposition.contains("kine_sql_time_seconds"));
}

#[test]
fn test_exposition_help_text() {
    let text = encode_text(&exercised_registry("kine")).unwrap();
    assert!(text.contains("# HELP kine_sql_total Total number of SQL operations"));
    assert!(text.contains("# HELP kine_sql_time_seconds Length of time per SQL operation"));
    assert!(text.contains("# HELP kine_compact_total Total number of compactions"));
}

#[test]
fn test_exposition_labels_and_values() {
    let text = encode_text(&exercised_registry("kine")).unwrap();

    assert!(text.contains("kine_sql_total{error_code=\"success\"} 1"));
    assert!(text.contains("kine_compact_total{result=\"success\"} 1"));
    assert!(text.contains(&format!("kine_compact_total{{result=\"{}\"}} 1", RESULT_ERROR)));
    assert!(text.contains("kine_sql_active_watch_goroutines 3"));
    assert!(text.contains("kine_sql_ttl_deletion_cache_size 12"));
    assert!(text.contains("kine_sql_ttl_deletion_latency_seconds_count{result=\"success\"} 1"));
}

#[test]
fn test_exposition_bucket_layout() {
    let text = encode_text(&exercised_registry("kine")).unwrap();

    assert!(text.contains("kine_sql_time_seconds_bucket{error_code=\"success\",le=\"0.005\"}"));
    assert!(text.contains("kine_sql_time_seconds_bucket{error_code=\"success\",le=\"30\"}"));
    assert!(text.contains("kine_sql_time_seconds_bucket{error_code=\"success\",le=\"+Inf\"} 1"));
    assert!(text.contains(
        "kine_sql_compaction_latency_seconds_bucket{result=\"success\",le=\"0.001\"}"
    ));

    let sql_buckets = text
        .lines()
        .filter(|l| l.starts_with("kine_sql_time_seconds_bucket{error_code=\"success\""))
        .count();
    // 35 explicit bounds plus +Inf
    assert_eq!(sql_buckets, 36);

    let compaction_buckets = text
        .lines()
        .filter(|l| {
            l.starts_with("kine_sql_compaction_latency_seconds_bucket{result=\"success\"")
        })
        .count();
    assert_eq!(compaction_buckets, 9);
}

#[test]
fn test_custom_namespace_prefixes_every_name() {
    let text = encode_text(&exercised_registry("k3s")).unwrap();
    assert!(text.contains("k3s_sql_total{error_code=\"success\"} 1"));
    assert!(text.contains("# TYPE k3s_sql_active_watch_goroutines gauge"));
    assert!(!text.contains("kine_"));
}

#[test]
fn test_duplicate_bundle_is_a_startup_error() {
    let registry = Registry::new();
    SqlMetrics::register(&registry, "kine").unwrap();

    let config = MetricsConfig::default();
    let err = SqlObserver::from_config(&registry, &config).unwrap_err();
    assert!(matches!(err, MetricsError::Registration(_)));
}

#[test]
fn test_invalid_namespace_is_rejected_at_registration() {
    let registry = Registry::new();
    assert!(SqlMetrics::register(&registry, "not-valid").is_err());
}
