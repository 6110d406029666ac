//! Core records flowing through one monitoring cycle.
//!
//! Hotspot → (WeatherSample, FireIndices) → RiskRecord. A fresh set of records
//! is produced every cycle; nothing here is mutated across cycles.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One detected fire point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HotspotFields")]
pub struct Hotspot {
    latitude: f64,
    longitude: f64,
    acquired_at: DateTime<Utc>,
    brightness: Option<f64>,
}

/// Wire shape of `Hotspot`; deserialized values pass through `Hotspot::new`.
#[derive(Deserialize)]
struct HotspotFields {
    latitude: f64,
    longitude: f64,
    acquired_at: DateTime<Utc>,
    #[serde(default)]
    brightness: Option<f64>,
}

impl TryFrom<HotspotFields> for Hotspot {
    type Error = anyhow::Error;

    fn try_from(f: HotspotFields) -> Result<Self> {
        Hotspot::new(f.latitude, f.longitude, f.acquired_at, f.brightness)
    }
}

impl Hotspot {
    /// Rejects non-finite or out-of-range coordinates.
    pub fn new(
        latitude: f64,
        longitude: f64,
        acquired_at: DateTime<Utc>,
        brightness: Option<f64>,
    ) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            bail!("invalid latitude {latitude}");
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            bail!("invalid longitude {longitude}");
        }
        Ok(Self {
            latitude,
            longitude,
            acquired_at,
            brightness: brightness.filter(|b| b.is_finite()),
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    pub fn brightness(&self) -> Option<f64> {
        self.brightness
    }

    /// Short location identifier used in alert payloads, e.g. `-3.40,-52.00`.
    pub fn location_id(&self) -> String {
        format!("{:.2},{:.2}", self.latitude, self.longitude)
    }
}

/// Current weather at a hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// °C
    pub temperature_c: f64,
    /// %, 0–100
    pub relative_humidity: f64,
    /// km/h, ≥ 0
    pub wind_kmh: f64,
    /// mm, ≥ 0
    pub rain_mm: f64,
}

impl WeatherSample {
    /// Substituted for any point whose weather lookup failed.
    pub const SAFE_DEFAULT: WeatherSample = WeatherSample {
        temperature_c: 30.0,
        relative_humidity: 50.0,
        wind_kmh: 10.0,
        rain_mm: 0.0,
    };

    pub fn new(temperature_c: f64, relative_humidity: f64, wind_kmh: f64, rain_mm: f64) -> Self {
        Self {
            temperature_c,
            relative_humidity,
            wind_kmh,
            rain_mm,
        }
    }

    /// Checks the physical ranges a feed response must respect.
    pub fn validate(&self) -> Result<()> {
        let all_finite = [
            self.temperature_c,
            self.relative_humidity,
            self.wind_kmh,
            self.rain_mm,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            bail!("non-finite weather value: {self:?}");
        }
        if !(0.0..=100.0).contains(&self.relative_humidity) {
            bail!("relative humidity out of range: {}", self.relative_humidity);
        }
        if self.wind_kmh < 0.0 {
            bail!("negative wind speed: {}", self.wind_kmh);
        }
        if self.rain_mm < 0.0 {
            bail!("negative rainfall: {}", self.rain_mm);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherOrigin {
    Observed,
    Default,
}

/// Derived fire-behavior indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireIndices {
    pub ffmc: f64,
    pub isi: f64,
    pub fwi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Moderate,
    High,
    Critical,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Moderate => "MODERATE",
            RiskTier::High => "HIGH",
            RiskTier::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a batch came from the real feed or the synthetic generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeveritySource {
    Model,
    Formula,
}

/// Severity in [0,100] plus which strategy produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityScore {
    pub value: f64,
    pub source: SeveritySource,
}

impl SeverityScore {
    /// Clamps into [0,100].
    pub fn new(value: f64, source: SeveritySource) -> Self {
        Self {
            value: value.clamp(0.0, 100.0),
            source,
        }
    }
}

/// The unit that flows end-to-end, gets persisted and drives alerting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub hotspot: Hotspot,
    pub weather: WeatherSample,
    pub weather_origin: WeatherOrigin,
    pub indices: FireIndices,
    pub tier: RiskTier,
    /// `None` when no strategy could score the record; never defaulted to zero.
    pub severity: Option<SeverityScore>,
    pub alert: bool,
    pub provenance: Provenance,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn hotspot_rejects_bad_coordinates() {
        assert!(Hotspot::new(f64::NAN, 0.0, ts(), None).is_err());
        assert!(Hotspot::new(91.0, 0.0, ts(), None).is_err());
        assert!(Hotspot::new(0.0, -180.5, ts(), None).is_err());
        assert!(Hotspot::new(-3.4, -52.0, ts(), Some(350.0)).is_ok());
    }

    #[test]
    fn deserializing_goes_through_validation() {
        let h = Hotspot::new(-3.4, -52.0, ts(), Some(330.5)).unwrap();
        let json = serde_json::to_value(&h).unwrap();
        let back: Hotspot = serde_json::from_value(json).unwrap();
        assert_eq!(back, h);

        let bad = serde_json::json!({
            "latitude": 95.0,
            "longitude": -52.0,
            "acquired_at": "2025-10-01T00:00:00Z"
        });
        let err = serde_json::from_value::<Hotspot>(bad).unwrap_err();
        assert!(err.to_string().contains("invalid latitude"), "{err}");
    }

    #[test]
    fn location_id_has_two_decimals() {
        let h = Hotspot::new(-3.4, -52.0, ts(), None).unwrap();
        assert_eq!(h.location_id(), "-3.40,-52.00");
    }

    #[test]
    fn weather_validation_bounds() {
        assert!(WeatherSample::SAFE_DEFAULT.validate().is_ok());
        assert!(WeatherSample::new(30.0, 101.0, 1.0, 0.0).validate().is_err());
        assert!(WeatherSample::new(30.0, 40.0, -1.0, 0.0).validate().is_err());
        assert!(WeatherSample::new(f64::INFINITY, 40.0, 1.0, 0.0)
            .validate()
            .is_err());
    }

    #[test]
    fn severity_score_clamps() {
        assert_eq!(SeverityScore::new(-50.0, SeveritySource::Model).value, 0.0);
        assert_eq!(SeverityScore::new(150.0, SeveritySource::Model).value, 100.0);
    }

    #[test]
    fn tier_serializes_uppercase() {
        let v = serde_json::to_value(RiskTier::Critical).unwrap();
        assert_eq!(v, serde_json::json!("CRITICAL"));
    }
}
