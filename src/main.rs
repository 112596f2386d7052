use anyhow::Context;
use clap::Parser;
use kine_metrics::config::MetricsConfig;
use kine_metrics::metrics::describe_contract;
use kine_metrics::SqlObserver;
use prometheus::Registry;
use std::path::PathBuf;

/// Kine Metrics - inspect the SQL backend's metric contract
#[derive(Parser, Debug)]
#[command(name = "kine-metrics")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Test configuration, print the effective settings and exit
    #[arg(long)]
    check: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => MetricsConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => MetricsConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    if args.check {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    kine_metrics::logging::init_subscriber(&config.logging)
        .context("Failed to initialize logging subsystem")?;

    let registry = Registry::new();
    let observer = SqlObserver::from_config(&registry, &config)?;

    tracing::info!(
        namespace = %config.namespace,
        slow_sql_threshold = ?observer.slow_sql_threshold().get(),
        "Metrics registered"
    );

    print!("{}", describe_contract(observer.metrics()));
    Ok(())
}
