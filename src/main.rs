//! Command-line interface for csv2kafka
//!
//! # Usage Examples
//!
//! ```bash
//! # Publish with the built-in defaults
//! csv2kafka
//!
//! # Everything can also come from the environment
//! KAFKA_BROKERS=kafka:9092 KAFKA_TOPIC=actions CSV2KAFKA_INPUT=data.csv csv2kafka
//!
//! # Verbose client logs
//! RUST_LOG=csv2kafka=debug,librdkafka=debug csv2kafka
//! ```

use clap::Parser;
use csv2kafka::Cli;
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level);

    // Connection failures print as "Source not found or Can't connect to Kafka
    // Broker: <cause>" through the error chain
    let summary = csv2kafka::run(&cli, shutdown_signal()).await?;

    println!("{} records sent to Kafka successfully.", summary.records_sent);
    if summary.failed > 0 || summary.pending() > 0 {
        warn!(
            failed = summary.failed,
            pending = summary.pending(),
            "Some records were not acknowledged"
        );
    }
    Ok(())
}

/// Completes on Ctrl-C. If the handler cannot be installed it never completes.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn init_tracing(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        other => {
            eprintln!("Invalid log level '{other}', defaulting to 'info'");
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .init();
}
