// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::providers::synthetic::SyntheticProvider;
use crate::ingest::types::{HotspotBatch, HotspotProvider};
use crate::models::Provenance;
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "hotspot_fetch_total",
            "Hotspot fetches, labelled by provenance."
        );
        describe_counter!(
            "hotspot_fallback_total",
            "Fetches that fell back to the synthetic generator."
        );
        describe_counter!(
            "hotspot_rows_skipped_total",
            "Feed rows dropped for unusable coordinates."
        );
        describe_histogram!("hotspot_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Primary feed with a synthetic fallback. `fetch_hotspots` never fails.
pub struct HotspotSource {
    primary: Box<dyn HotspotProvider>,
}

impl HotspotSource {
    pub fn new(primary: Box<dyn HotspotProvider>) -> Self {
        Self { primary }
    }

    /// Live hotspots when the primary answers with at least one point,
    /// otherwise the fixed synthetic set tagged `Provenance::Synthetic`.
    pub async fn fetch_hotspots(&self) -> HotspotBatch {
        ensure_metrics_described();

        let fallback_reason = match self.primary.fetch().await {
            Ok(hotspots) if !hotspots.is_empty() => {
                tracing::info!(
                    target: "ingest",
                    provider = self.primary.name(),
                    hotspots = hotspots.len(),
                    "live hotspots received"
                );
                counter!("hotspot_fetch_total", "provenance" => "live").increment(1);
                return HotspotBatch {
                    hotspots,
                    provenance: Provenance::Live,
                };
            }
            Ok(_) => "empty result".to_string(),
            Err(e) => format!("{e:#}"),
        };

        tracing::warn!(
            target: "ingest",
            provider = self.primary.name(),
            reason = %fallback_reason,
            "hotspot feed unavailable, using SYNTHETIC hotspots"
        );
        counter!("hotspot_fallback_total").increment(1);
        counter!("hotspot_fetch_total", "provenance" => "synthetic").increment(1);

        HotspotBatch {
            hotspots: SyntheticProvider::hotspots(),
            provenance: Provenance::Synthetic,
        }
    }
}
