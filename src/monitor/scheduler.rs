// src/monitor/scheduler.rs
//
// RUNNING → SLEEPING(interval) on success, RUNNING → SLEEPING(backoff) on
// failure, SLEEPING → RUNNING when the wait elapses. Only the shutdown signal
// ends the loop, and it is only observed between cycles.

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::time::Duration;
use tokio::sync::watch;

use super::CycleReport;

#[async_trait::async_trait]
pub trait CycleRunner: Send {
    async fn run_cycle(&mut self) -> Result<CycleReport>;
}

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval: Duration,
    pub backoff: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Running,
    Sleeping(Duration),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub succeeded: u64,
    pub failed: u64,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sentinel_cycles_total", "Completed monitoring cycles.");
        describe_counter!(
            "sentinel_cycle_failures_total",
            "Cycles that failed and were retried after backoff."
        );
        describe_gauge!(
            "sentinel_last_cycle_ts",
            "Unix ts of the last successful cycle."
        );
    });
}

/// Drive `runner` until `shutdown` flips to `true` (or its sender is dropped).
pub async fn run<R: CycleRunner + ?Sized>(
    runner: &mut R,
    cfg: SchedulerCfg,
    mut shutdown: watch::Receiver<bool>,
) -> RunStats {
    ensure_metrics_described();
    let mut stats = RunStats::default();
    let mut state = State::Running;

    loop {
        if *shutdown.borrow() {
            break;
        }
        state = match state {
            State::Running => match runner.run_cycle().await {
                Ok(report) => {
                    stats.succeeded += 1;
                    counter!("sentinel_cycles_total").increment(1);
                    gauge!("sentinel_last_cycle_ts").set(chrono::Utc::now().timestamp() as f64);
                    tracing::info!(
                        cycle = report.cycle,
                        sleep_secs = cfg.interval.as_secs_f64(),
                        "sleeping until next cycle"
                    );
                    State::Sleeping(cfg.interval)
                }
                Err(e) => {
                    stats.failed += 1;
                    counter!("sentinel_cycle_failures_total").increment(1);
                    tracing::error!(
                        error = ?e,
                        backoff_secs = cfg.backoff.as_secs_f64(),
                        "monitoring cycle failed, retrying after backoff"
                    );
                    State::Sleeping(cfg.backoff)
                }
            },
            State::Sleeping(d) => {
                tokio::select! {
                    _ = tokio::time::sleep(d) => State::Running,
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        // flag re-checked at loop top
                        State::Sleeping(Duration::ZERO)
                    }
                }
            }
        };
    }

    tracing::info!(
        succeeded = stats.succeeded,
        failed = stats.failed,
        "monitor stopped"
    );
    stats
}
