use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::ingest::types::HotspotProvider;
use crate::models::Hotspot;

/// (lat, lon, brightness): five plausible points in Pará, Brazil.
const POINTS: [(f64, f64, f64); 5] = [
    (-3.4, -52.0, 350.0),
    (-4.5, -53.1, 310.0),
    (-3.8, -52.5, 380.0),
    (-6.2, -50.0, 330.0),
    (-5.1, -51.5, 360.0),
];

/// Deterministic stand-in used when the live feed is unavailable.
/// For liveness and tests only; never real detections.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn hotspots() -> Vec<Hotspot> {
        let acquired_at = Utc
            .with_ymd_and_hms(2025, 10, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        POINTS
            .iter()
            .filter_map(|&(lat, lon, b)| Hotspot::new(lat, lon, acquired_at, Some(b)).ok())
            .collect()
    }
}

#[async_trait]
impl HotspotProvider for SyntheticProvider {
    async fn fetch(&self) -> Result<Vec<Hotspot>> {
        Ok(Self::hotspots())
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_set_is_stable() {
        let a = SyntheticProvider::hotspots();
        let b = SyntheticProvider::hotspots();
        assert_eq!(a.len(), 5);
        assert_eq!(a, b);
        assert_eq!(a[0].latitude(), -3.4);
        assert_eq!(a[0].longitude(), -52.0);
        assert_eq!(a[2].brightness(), Some(380.0));
    }
}
