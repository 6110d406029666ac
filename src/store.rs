//! Persisted batch: the latest cycle's records as CSV.
//!
//! Each write replaces the whole file (temp file + rename); no history is kept.
//! An absent severity is written as an empty cell, never as zero.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::{
    FireIndices, Hotspot, Provenance, RiskRecord, RiskTier, SeverityScore, SeveritySource,
    WeatherOrigin, WeatherSample,
};

/// Flat CSV row; column order is the file's header order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    pub latitude: f64,
    pub longitude: f64,
    pub acquired_at: DateTime<Utc>,
    pub brightness: Option<f64>,
    pub temp: f64,
    pub rh: f64,
    pub wind: f64,
    pub rain: f64,
    pub weather_origin: WeatherOrigin,
    pub ffmc: f64,
    pub isi: f64,
    pub fwi: f64,
    pub risk_tier: RiskTier,
    pub severity: Option<f64>,
    pub severity_source: Option<SeveritySource>,
    pub alert: bool,
    pub provenance: Provenance,
}

impl From<&RiskRecord> for BatchRow {
    fn from(r: &RiskRecord) -> Self {
        Self {
            latitude: r.hotspot.latitude(),
            longitude: r.hotspot.longitude(),
            acquired_at: r.hotspot.acquired_at(),
            brightness: r.hotspot.brightness(),
            temp: r.weather.temperature_c,
            rh: r.weather.relative_humidity,
            wind: r.weather.wind_kmh,
            rain: r.weather.rain_mm,
            weather_origin: r.weather_origin,
            ffmc: r.indices.ffmc,
            isi: r.indices.isi,
            fwi: r.indices.fwi,
            risk_tier: r.tier,
            severity: r.severity.map(|s| s.value),
            severity_source: r.severity.map(|s| s.source),
            alert: r.alert,
            provenance: r.provenance,
        }
    }
}

impl TryFrom<BatchRow> for RiskRecord {
    type Error = anyhow::Error;

    fn try_from(row: BatchRow) -> Result<Self> {
        let severity = match (row.severity, row.severity_source) {
            (Some(value), Some(source)) => Some(SeverityScore::new(value, source)),
            (None, None) => None,
            _ => return Err(anyhow!("severity and severity_source must be set together")),
        };
        Ok(RiskRecord {
            hotspot: Hotspot::new(row.latitude, row.longitude, row.acquired_at, row.brightness)?,
            weather: WeatherSample::new(row.temp, row.rh, row.wind, row.rain),
            weather_origin: row.weather_origin,
            indices: FireIndices {
                ffmc: row.ffmc,
                isi: row.isi,
                fwi: row.fwi,
            },
            tier: row.risk_tier,
            severity,
            alert: row.alert,
            provenance: row.provenance,
        })
    }
}

/// Where the latest batch lives.
#[derive(Debug, Clone)]
pub struct BatchStore {
    path: PathBuf,
}

impl BatchStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stored batch with `records`.
    pub async fn replace(&self, records: &[RiskRecord]) -> Result<()> {
        let bytes = encode_batch(records)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("renaming {} → {}", tmp.display(), self.path.display()))?;
        tracing::info!(
            target: "store",
            path = %self.path.display(),
            records = records.len(),
            "batch persisted"
        );
        Ok(())
    }

    pub async fn load(&self) -> Result<Vec<RiskRecord>> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        decode_batch(&body)
    }
}

pub fn encode_batch(records: &[RiskRecord]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    if records.is_empty() {
        // serde-driven headers only appear with the first row
        wtr.write_record([
            "latitude",
            "longitude",
            "acquired_at",
            "brightness",
            "temp",
            "rh",
            "wind",
            "rain",
            "weather_origin",
            "ffmc",
            "isi",
            "fwi",
            "risk_tier",
            "severity",
            "severity_source",
            "alert",
            "provenance",
        ])?;
    }
    for r in records {
        wtr.serialize(BatchRow::from(r))?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow!("flushing CSV batch: {}", e.error()))
}

pub fn decode_batch(body: &str) -> Result<Vec<RiskRecord>> {
    let mut rdr = csv::Reader::from_reader(body.as_bytes());
    rdr.deserialize::<BatchRow>()
        .enumerate()
        .map(|(i, row)| {
            let row = row.with_context(|| format!("row {}", i + 1))?;
            RiskRecord::try_from(row).with_context(|| format!("row {}", i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(severity: Option<SeverityScore>) -> RiskRecord {
        RiskRecord {
            hotspot: Hotspot::new(
                -3.4,
                -52.0,
                Utc.with_ymd_and_hms(2025, 10, 1, 4, 12, 0).unwrap(),
                Some(350.0),
            )
            .unwrap(),
            weather: WeatherSample::new(35.0, 20.0, 25.0, 0.0),
            weather_origin: WeatherOrigin::Observed,
            indices: FireIndices {
                ffmc: 75.1,
                isi: 5.2,
                fwi: 7.8,
            },
            tier: RiskTier::Moderate,
            severity,
            alert: false,
            provenance: Provenance::Live,
        }
    }

    #[test]
    fn header_and_empty_severity_cell() {
        let bytes = encode_batch(&[record(None)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "latitude,longitude,acquired_at,brightness,temp,rh,wind,rain,weather_origin,ffmc,isi,fwi,risk_tier,severity,severity_source,alert,provenance"
        );
        let row = lines.next().unwrap();
        assert!(row.contains(",MODERATE,,,false,live"), "{row}");
    }

    #[test]
    fn empty_batch_still_has_header() {
        let text = String::from_utf8(encode_batch(&[]).unwrap()).unwrap();
        assert!(text.starts_with("latitude,longitude,"));
        assert!(decode_batch(&text).unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_overwrites_previous_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = BatchStore::new(dir.path().join("nested/live_monitor.csv"));

        let first = vec![record(None), record(None), record(None)];
        store.replace(&first).await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 3);

        let second = vec![record(Some(SeverityScore::new(6.24, SeveritySource::Formula)))];
        store.replace(&second).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            loaded[0].severity.map(|s| s.source),
            Some(SeveritySource::Formula)
        );
        assert!(!dir.path().join("nested/live_monitor.csv.tmp").exists());
    }
}
