// tests/fire_indices.rs
use chrono::{TimeZone, Utc};
use fire_sentinel::config::SyntheticAlertPolicy;
use fire_sentinel::engine;
use fire_sentinel::features::{ffmc, fwi, isi};
use fire_sentinel::models::{
    Hotspot, Provenance, RiskTier, SeveritySource, WeatherOrigin, WeatherSample,
};
use fire_sentinel::monitor::score_batch;
use fire_sentinel::weather::EnrichedHotspot;
use fire_sentinel::{compute_indices, SeverityPredictor};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn hot_dry_windy_afternoon() {
    let w = WeatherSample::new(35.0, 20.0, 25.0, 0.0);
    let idx = compute_indices(&w);
    assert!(close(idx.ffmc, 75.10976948408343), "ffmc={}", idx.ffmc);
    assert!(close(idx.isi, 5.2), "isi={}", idx.isi);
    assert!(close(idx.fwi, 7.8), "fwi={}", idx.fwi);
}

#[test]
fn safe_default_weather() {
    let idx = compute_indices(&WeatherSample::SAFE_DEFAULT);
    assert!(close(idx.ffmc, 67.15575620767495), "ffmc={}", idx.ffmc);
    assert!(close(idx.isi, 2.08), "isi={}", idx.isi);
    assert!(close(idx.fwi, 3.12), "fwi={}", idx.fwi);
}

#[test]
fn standalone_functions_agree_with_compute_indices() {
    let w = WeatherSample::new(28.0, 65.0, 12.0, 3.0);
    let idx = compute_indices(&w);
    let f = ffmc(28.0, 65.0);
    let i = isi(12.0, f);
    assert_eq!(idx.ffmc, f);
    assert_eq!(idx.isi, i);
    assert_eq!(idx.fwi, fwi(i));
}

#[test]
fn rain_does_not_change_the_indices() {
    let dry = compute_indices(&WeatherSample::new(35.0, 20.0, 25.0, 0.0));
    let wet = compute_indices(&WeatherSample::new(35.0, 20.0, 25.0, 40.0));
    assert_eq!(dry, wet);
}

#[test]
fn extreme_wind_reaches_critical() {
    let idx = compute_indices(&WeatherSample::new(35.0, 20.0, 200.0, 0.0));
    assert!((idx.fwi - 62.4).abs() < 1e-6, "fwi={}", idx.fwi);
    assert_eq!(fire_sentinel::classify(idx.fwi), RiskTier::Critical);
}

#[test]
fn single_hotspot_end_to_end_with_formula_severity() {
    let hotspot = Hotspot::new(
        -3.4,
        -52.0,
        Utc.with_ymd_and_hms(2025, 10, 1, 4, 12, 0).unwrap(),
        Some(350.2),
    )
    .unwrap();
    let enriched = vec![EnrichedHotspot {
        hotspot,
        weather: WeatherSample::new(35.0, 20.0, 25.0, 0.0),
        origin: WeatherOrigin::Observed,
    }];

    let records = score_batch(enriched, Provenance::Live, &SeverityPredictor::Formula);
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.tier, RiskTier::Moderate);
    assert!(!r.alert);

    let sev = r.severity.expect("formula always scores a finite FWI");
    assert_eq!(sev.source, SeveritySource::Formula);
    assert!((sev.value - 6.24).abs() < 1e-9, "severity={}", sev.value);

    let d = engine::decide(&records, Provenance::Live, SyntheticAlertPolicy::Suppress);
    assert!(!d.should_alert);
    assert!(d.payload.is_none());
}
