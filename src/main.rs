//! circuit-guard
//!
//! ```text
//! serve:  config file → registry of breakers → admin API (+ metrics endpoint)
//! probe:  GET <url> in a loop through one breaker, logging outcome and stats
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use circuit_guard::admin::{self, AdminState};
use circuit_guard::config::{load_config, GuardConfig, ObservabilityConfig};
use circuit_guard::observability::{logging, metrics};
use circuit_guard::{BreakerConfig, BreakerRegistry, CallError, CircuitBreaker};

#[derive(Parser)]
#[command(name = "circuit-guard")]
#[command(about = "Circuit breakers for calls to unreliable dependencies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build breakers from a config file and serve the admin API
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Repeatedly GET a URL through a breaker
    Probe {
        #[arg(short, long)]
        url: String,

        #[arg(short = 'n', long, default_value_t = 20)]
        count: u32,

        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,

        #[arg(long, default_value_t = 3)]
        failure_threshold: u32,

        #[arg(long, default_value_t = 30_000)]
        reset_timeout_ms: u64,

        #[arg(long, default_value_t = 2)]
        half_open_max_attempts: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => GuardConfig::default(),
            };
            serve(config).await
        }
        Commands::Probe {
            url,
            count,
            interval_ms,
            failure_threshold,
            reset_timeout_ms,
            half_open_max_attempts,
        } => {
            logging::init_logging(&ObservabilityConfig::default())?;
            let config = BreakerConfig {
                name: "probe".to_string(),
                failure_threshold,
                reset_timeout_ms,
                half_open_max_attempts,
            };
            probe(config, &url, count, Duration::from_millis(interval_ms)).await
        }
    }
}

async fn serve(config: GuardConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging(&config.observability)?;
    tracing::info!("circuit-guard v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let registry = Arc::new(BreakerRegistry::from_config(&config)?);
    tracing::info!(breakers = registry.len(), "Configuration loaded");

    if !config.has_listener() {
        tracing::info!("Admin API and metrics disabled, nothing to serve");
        return Ok(());
    }

    if !config.admin.enabled {
        tracing::info!("Admin API disabled, serving metrics only");
        shutdown_signal().await;
        tracing::info!("Shutdown complete");
        return Ok(());
    }

    let listener = TcpListener::bind(&config.admin.bind_address).await?;
    let state = AdminState::new(registry, config.admin.api_key.as_str());
    admin::serve(listener, state, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn probe(
    config: BreakerConfig,
    url: &str,
    count: u32,
    interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;
    let breaker = CircuitBreaker::new(config)?;

    for attempt in 1..=count {
        let result = breaker
            .call(|| async {
                client
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()
                    .map(|response| response.status())
            })
            .await;

        match result {
            Ok(status) => tracing::info!(attempt, %status, "Request succeeded"),
            Err(CallError::Rejected(open)) => match open.retry_after {
                Some(wait) => tracing::warn!(
                    attempt,
                    reason = %open.reason,
                    "Service is recovering, retry in {}s",
                    wait.as_secs()
                ),
                None => tracing::warn!(
                    attempt,
                    reason = %open.reason,
                    "Service is testing recovery, please wait"
                ),
            },
            Err(CallError::Operation(err)) => tracing::error!(attempt, error = %err, "Request failed"),
        }

        let stats = breaker.stats();
        tracing::info!(
            phase = %stats.phase,
            failure_count = stats.failure_count,
            failure_threshold = stats.failure_threshold,
            half_open_attempts = stats.half_open_attempts,
            "Breaker stats"
        );

        if attempt < count {
            tokio::time::sleep(interval).await;
        }
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
