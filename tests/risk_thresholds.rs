// tests/risk_thresholds.rs
use fire_sentinel::classify;
use fire_sentinel::models::RiskTier;
use fire_sentinel::risk::{CRITICAL_ABOVE, HIGH_ABOVE};

#[test]
fn boundaries_belong_to_the_lower_tier() {
    assert_eq!(classify(HIGH_ABOVE), RiskTier::Moderate);
    assert_eq!(classify(CRITICAL_ABOVE), RiskTier::High);
}

#[test]
fn tiers_across_the_range() {
    let cases = [
        (0.0, RiskTier::Moderate),
        (7.8, RiskTier::Moderate),
        (20.0001, RiskTier::High),
        (35.0, RiskTier::High),
        (50.0001, RiskTier::Critical),
        (62.4, RiskTier::Critical),
        (1_000.0, RiskTier::Critical),
    ];
    for (fwi, want) in cases {
        assert_eq!(classify(fwi), want, "fwi={fwi}");
    }
}

#[test]
fn tier_ordering_and_labels() {
    assert!(RiskTier::Moderate < RiskTier::High);
    assert!(RiskTier::High < RiskTier::Critical);
    assert_eq!(RiskTier::Critical.to_string(), "CRITICAL");
    assert_eq!(
        serde_json::to_string(&RiskTier::High).unwrap(),
        "\"HIGH\""
    );
}

#[test]
fn non_finite_fwi_is_moderate() {
    assert_eq!(classify(f64::NAN), RiskTier::Moderate);
}
