//! # Monitoring cycle
//! fetch → enrich → featurize → classify → predict → decide → persist → notify.
//!
//! A cycle runs to completion or fails as a whole; the scheduler retries it.
//! A total weather outage does not fail the cycle: the batch is scored on
//! default weather and the outage is flagged in the report.

pub mod scheduler;

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, SyntheticAlertPolicy};
use crate::decision::AlertDecision;
use crate::engine;
use crate::features::compute_indices;
use crate::ingest::providers::firms::FirmsProvider;
use crate::ingest::HotspotSource;
use crate::models::{Provenance, RiskRecord};
use crate::notify::antiflutter::{AntiFlutter, Gate};
use crate::notify::telegram::TelegramNotifier;
use crate::notify::{LogNotifier, Notifier};
use crate::risk::classify;
use crate::severity::{SeverityFeatures, SeverityPredictor};
use crate::store::BatchStore;
use crate::weather::open_meteo::OpenMeteoProvider;
use crate::weather::{EnrichedHotspot, WeatherEnricher};

pub use scheduler::CycleRunner;

/// Called with the cycle number before any work; an `Err` fails the cycle.
pub type FaultHook = Arc<dyn Fn(u64) -> Result<()> + Send + Sync>;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("alerts_sent_total", "Alerts delivered to the notifier.");
        describe_counter!(
            "alerts_suppressed_total",
            "Alerts withheld, labelled by reason (synthetic, cooldown)."
        );
        describe_counter!("notify_errors_total", "Notifier delivery failures.");
        describe_gauge!("sentinel_last_batch_size", "Records in the latest batch.");
    });
}

/// Featurize, classify, score and flag every enriched hotspot.
pub fn score_batch(
    enriched: Vec<EnrichedHotspot>,
    provenance: Provenance,
    predictor: &SeverityPredictor,
) -> Vec<RiskRecord> {
    enriched
        .into_iter()
        .map(|e| {
            let indices = compute_indices(&e.weather);
            let tier = classify(indices.fwi);
            let severity = predictor.predict(&SeverityFeatures::new(&e.weather, &indices));
            let alert = engine::is_alert_worthy(tier, severity.map(|s| s.value));
            RiskRecord {
                hotspot: e.hotspot,
                weather: e.weather,
                weather_origin: e.origin,
                indices,
                tier,
                severity,
                alert,
                provenance,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    pub moderate: usize,
    pub high: usize,
    pub critical: usize,
}

impl TierCounts {
    fn tally(records: &[RiskRecord]) -> Self {
        use crate::models::RiskTier::*;
        let mut c = Self::default();
        for r in records {
            match r.tier {
                Moderate => c.moderate += 1,
                High => c.high += 1,
                Critical => c.critical += 1,
            }
        }
        c
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub provenance: Provenance,
    pub hotspots: usize,
    pub weather_failures: usize,
    /// Every weather lookup failed; all records carry default weather.
    pub weather_outage: bool,
    pub tiers: TierCounts,
    /// Records without a severity score.
    pub unscored: usize,
    pub decision: AlertDecision,
    pub delivered: bool,
}

impl CycleReport {
    pub fn empty(cycle: u64) -> Self {
        Self {
            cycle,
            provenance: Provenance::Live,
            hotspots: 0,
            weather_failures: 0,
            weather_outage: false,
            tiers: TierCounts::default(),
            unscored: 0,
            decision: AlertDecision::quiet(),
            delivered: false,
        }
    }
}

/// Everything a `Monitor` needs, already constructed.
pub struct MonitorParts {
    pub source: HotspotSource,
    pub enricher: WeatherEnricher,
    pub predictor: SeverityPredictor,
    pub store: BatchStore,
    pub notifier: Arc<dyn Notifier>,
    pub synthetic_alerts: SyntheticAlertPolicy,
    pub alert_cooldown_secs: i64,
}

pub struct Monitor {
    source: HotspotSource,
    enricher: WeatherEnricher,
    predictor: SeverityPredictor,
    store: BatchStore,
    notifier: Arc<dyn Notifier>,
    policy: SyntheticAlertPolicy,
    antiflutter: AntiFlutter,
    fault_hook: Option<FaultHook>,
    cycle: u64,
}

impl Monitor {
    pub fn new(parts: MonitorParts) -> Self {
        ensure_metrics_described();
        Self {
            source: parts.source,
            enricher: parts.enricher,
            predictor: parts.predictor,
            store: parts.store,
            notifier: parts.notifier,
            policy: parts.synthetic_alerts,
            antiflutter: AntiFlutter::new(parts.alert_cooldown_secs),
            fault_hook: None,
            cycle: 0,
        }
    }

    /// Wire production collaborators from configuration. The predictor is built
    /// by the caller so the model artifact is read once per process.
    pub fn from_config(cfg: &Config, predictor: SeverityPredictor) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fire-sentinel/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;

        let source = HotspotSource::new(Box::new(FirmsProvider::from_config(cfg, client.clone())));
        let enricher = WeatherEnricher::new(
            Arc::new(OpenMeteoProvider::from_config(cfg, client.clone())),
            Duration::from_millis(cfg.weather_pacing_ms),
        );
        let notifier: Arc<dyn Notifier> =
            match TelegramNotifier::from_config(&cfg.telegram, client) {
                Some(t) => Arc::new(t),
                None => {
                    tracing::warn!("Telegram credentials missing, alerts will only be logged");
                    Arc::new(LogNotifier)
                }
            };

        Ok(Self::new(MonitorParts {
            source,
            enricher,
            predictor,
            store: BatchStore::new(cfg.batch_path.clone()),
            notifier,
            synthetic_alerts: cfg.synthetic_alerts,
            alert_cooldown_secs: cfg.alert_cooldown_secs,
        }))
    }

    pub fn with_fault_hook(mut self, hook: FaultHook) -> Self {
        self.fault_hook = Some(hook);
        self
    }

    pub fn cycles_started(&self) -> u64 {
        self.cycle
    }

    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.cycle += 1;
        let cycle = self.cycle;
        tracing::info!(cycle, "monitoring cycle started");

        if let Some(hook) = &self.fault_hook {
            hook(cycle).context("fault hook")?;
        }

        let batch = self.source.fetch_hotspots().await;
        let provenance = batch.provenance;

        let (enriched, weather_outage) = match self.enricher.enrich(batch.hotspots).await {
            Ok(report) => (report, false),
            Err(e) => {
                tracing::error!(cycle, error = %e, "weather provider unavailable, scoring on defaults");
                (e.into_report(), true)
            }
        };

        let records = score_batch(enriched.records, provenance, &self.predictor);
        let decision = engine::decide(&records, provenance, self.policy);

        self.store
            .replace(&records)
            .await
            .context("persisting batch")?;
        gauge!("sentinel_last_batch_size").set(records.len() as f64);

        let delivered = self.deliver(&decision).await;

        let report = CycleReport {
            cycle,
            provenance,
            hotspots: records.len(),
            weather_failures: enriched.failed,
            weather_outage,
            tiers: TierCounts::tally(&records),
            unscored: records.iter().filter(|r| r.severity.is_none()).count(),
            decision,
            delivered,
        };
        tracing::info!(
            cycle,
            provenance = ?report.provenance,
            hotspots = report.hotspots,
            weather_failures = report.weather_failures,
            weather_outage,
            critical = report.tiers.critical,
            high = report.tiers.high,
            unscored = report.unscored,
            alert = report.decision.should_alert,
            delivered,
            "monitoring cycle complete"
        );
        Ok(report)
    }

    /// Hand the message to the notifier if the decision and cooldown allow it.
    /// Delivery failures are logged, not propagated.
    async fn deliver(&mut self, decision: &AlertDecision) -> bool {
        if decision.suppressed_synthetic {
            tracing::warn!(
                target: "notify",
                "alert criterion met on SYNTHETIC data, not notifying"
            );
            counter!("alerts_suppressed_total", "reason" => "synthetic").increment(1);
            return false;
        }
        let (Some(message), Some(payload)) = (decision.message(), decision.payload.as_ref())
        else {
            tracing::info!(target: "notify", "no hotspot reached the alert threshold");
            return false;
        };

        let now = Utc::now();
        if let Gate::Cooling { remaining } = self.antiflutter.check(now, &payload.locations) {
            tracing::info!(
                target: "notify",
                last_sent = ?self.antiflutter.last_sent(),
                reopens_in_secs = remaining.num_seconds(),
                "alert suppressed by cooldown"
            );
            counter!("alerts_suppressed_total", "reason" => "cooldown").increment(1);
            return false;
        }

        match self.notifier.send(message).await {
            Ok(()) => {
                self.antiflutter.mark_sent(now, &payload.locations);
                counter!("alerts_sent_total").increment(1);
                tracing::info!(target: "notify", notifier = self.notifier.name(), "alert sent");
                true
            }
            Err(e) => {
                counter!("notify_errors_total").increment(1);
                tracing::warn!(
                    target: "notify",
                    notifier = self.notifier.name(),
                    error = ?e,
                    "alert delivery failed"
                );
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl CycleRunner for Monitor {
    async fn run_cycle(&mut self) -> Result<CycleReport> {
        Monitor::run_cycle(self).await
    }
}
