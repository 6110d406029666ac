//! Fire Sentinel binary entrypoint.
//! Loads configuration, initializes tracing and metrics, then runs the
//! monitoring loop until Ctrl-C.

use std::process::ExitCode;

use fire_sentinel::metrics::Metrics;
use fire_sentinel::monitor::scheduler::{self, SchedulerCfg};
use fire_sentinel::{Config, Monitor, SeverityPredictor};
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; `SENTINEL_LOG_FORMAT=json` for structured output.
/// Filter comes from `RUST_LOG`, defaulting to `fire_sentinel=info,warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fire_sentinel=info,warn"));

    let json = std::env::var("SENTINEL_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    cfg.log_config();

    let metrics = match Metrics::init() {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = ?e, "metrics init failed");
            return ExitCode::FAILURE;
        }
    };
    if let Some(addr) = cfg.metrics_addr {
        if let Err(e) = metrics.serve(addr).await {
            tracing::error!(error = ?e, "metrics endpoint unavailable");
            return ExitCode::FAILURE;
        }
    }

    // Read the model artifact once for the whole process.
    let predictor = SeverityPredictor::load(cfg.model_path.as_deref(), cfg.severity_fallback);

    let mut monitor = match Monitor::from_config(&cfg, predictor) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = ?e, "failed to build monitor");
            return ExitCode::FAILURE;
        }
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("interrupt received, stopping after the current cycle");
                let _ = stop_tx.send(true);
            }
            Err(e) => {
                // keep the sender alive so the loop is not stopped by a dropped channel
                tracing::warn!(error = ?e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    });

    tracing::info!("=== fire sentinel started (Ctrl-C to stop) ===");
    scheduler::run(
        &mut monitor,
        SchedulerCfg {
            interval: cfg.interval(),
            backoff: cfg.backoff(),
        },
        stop_rx,
    )
    .await;

    ExitCode::SUCCESS
}
