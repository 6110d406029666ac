//! Risk tier classification.
//!
//! The only place the FWI thresholds live. Boundaries fall to the lower tier.

use crate::models::RiskTier;

pub const CRITICAL_ABOVE: f64 = 50.0;
pub const HIGH_ABOVE: f64 = 20.0;

pub fn classify(fwi: f64) -> RiskTier {
    if fwi > CRITICAL_ABOVE {
        RiskTier::Critical
    } else if fwi > HIGH_ABOVE {
        RiskTier::High
    } else {
        RiskTier::Moderate
    }
}
