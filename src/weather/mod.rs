//! Per-hotspot weather enrichment.
//!
//! One lookup per hotspot, serial, paced by a fixed delay. A failed lookup
//! substitutes `WeatherSample::SAFE_DEFAULT` for that point only; the batch is
//! never shortened. Only a batch where every lookup failed is escalated.

pub mod open_meteo;

use anyhow::Result;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Hotspot, WeatherOrigin, WeatherSample};

#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherSample>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedHotspot {
    pub hotspot: Hotspot,
    pub weather: WeatherSample,
    pub origin: WeatherOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentReport {
    /// Same length and order as the input.
    pub records: Vec<EnrichedHotspot>,
    pub succeeded: usize,
    pub failed: usize,
}

/// Every lookup in a non-empty batch failed. The defaulted records are still
/// carried so the batch can be scored and persisted.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("all {attempted} weather lookups failed (last error: {last_error})")]
    Total {
        attempted: usize,
        last_error: String,
        report: EnrichmentReport,
    },
}

impl EnrichmentError {
    /// The safe-default records gathered before the outage was detected.
    pub fn into_report(self) -> EnrichmentReport {
        match self {
            EnrichmentError::Total { report, .. } => report,
        }
    }
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("weather_lookups_total", "Weather lookups attempted.");
        describe_counter!(
            "weather_lookup_failures_total",
            "Weather lookups replaced by the safe default."
        );
        describe_counter!(
            "weather_outages_total",
            "Batches where every weather lookup failed."
        );
    });
}

pub struct WeatherEnricher {
    provider: Arc<dyn WeatherProvider>,
    pacing: Duration,
}

impl WeatherEnricher {
    pub fn new(provider: Arc<dyn WeatherProvider>, pacing: Duration) -> Self {
        Self { provider, pacing }
    }

    pub async fn enrich(
        &self,
        hotspots: Vec<Hotspot>,
    ) -> std::result::Result<EnrichmentReport, EnrichmentError> {
        ensure_metrics_described();

        let total = hotspots.len();
        tracing::info!(
            target: "weather",
            provider = self.provider.name(),
            points = total,
            "fetching local weather"
        );

        let mut records = Vec::with_capacity(total);
        let mut failed = 0usize;
        let mut last_error = String::new();

        for (i, hotspot) in hotspots.into_iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            counter!("weather_lookups_total").increment(1);

            let (weather, origin) = match self
                .provider
                .current(hotspot.latitude(), hotspot.longitude())
                .await
            {
                Ok(w) => (w, WeatherOrigin::Observed),
                Err(e) => {
                    tracing::debug!(
                        target: "weather",
                        error = ?e,
                        location = %hotspot.location_id(),
                        "weather lookup failed, using safe default"
                    );
                    counter!("weather_lookup_failures_total").increment(1);
                    failed += 1;
                    last_error = format!("{e:#}");
                    (WeatherSample::SAFE_DEFAULT, WeatherOrigin::Default)
                }
            };
            records.push(EnrichedHotspot {
                hotspot,
                weather,
                origin,
            });
        }

        let succeeded = total - failed;
        let report = EnrichmentReport {
            records,
            succeeded,
            failed,
        };
        if total > 0 && succeeded == 0 {
            tracing::error!(target: "weather", attempted = total, "every weather lookup failed");
            counter!("weather_outages_total").increment(1);
            return Err(EnrichmentError::Total {
                attempted: total,
                last_error,
                report,
            });
        }
        if failed > 0 {
            tracing::warn!(target: "weather", succeeded, failed, "partial weather enrichment");
        } else {
            tracing::info!(target: "weather", succeeded, "weather enrichment complete");
        }

        Ok(report)
    }
}
