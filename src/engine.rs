//! # Alert Decision Engine
//! Pure logic that maps a scored batch → `AlertDecision`.
//! No I/O; evaluating the same batch twice yields the same decision.
//!
//! Criterion per record: tier CRITICAL or severity above 80.

use crate::config::SyntheticAlertPolicy;
use crate::decision::{AlertDecision, AlertPayload, MAX_LOCATIONS};
use crate::models::{Provenance, RiskRecord, RiskTier};

pub const SEVERITY_ALERT_ABOVE: f64 = 80.0;

/// Whether one record meets the alert criterion on its own.
pub fn is_alert_worthy(tier: RiskTier, severity: Option<f64>) -> bool {
    tier == RiskTier::Critical || severity.is_some_and(|s| s > SEVERITY_ALERT_ABOVE)
}

pub fn record_is_alert_worthy(record: &RiskRecord) -> bool {
    is_alert_worthy(record.tier, record.severity.map(|s| s.value))
}

pub fn decide(
    records: &[RiskRecord],
    provenance: Provenance,
    policy: SyntheticAlertPolicy,
) -> AlertDecision {
    let hits: Vec<&RiskRecord> = records
        .iter()
        .filter(|r| record_is_alert_worthy(r))
        .collect();
    if hits.is_empty() {
        return AlertDecision::quiet();
    }

    let max_fwi = hits
        .iter()
        .map(|r| r.indices.fwi)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut locations: Vec<String> = Vec::with_capacity(MAX_LOCATIONS);
    for r in &hits {
        if locations.len() == MAX_LOCATIONS {
            break;
        }
        let id = r.hotspot.location_id();
        if !locations.contains(&id) {
            locations.push(id);
        }
    }

    let synthetic = provenance == Provenance::Synthetic;
    let critical = hits.iter().filter(|r| r.tier == RiskTier::Critical).count();
    let message = compose_message(hits.len(), critical, max_fwi, &locations, synthetic);
    let payload = AlertPayload {
        count: hits.len(),
        max_fwi,
        locations,
        message,
    };

    if synthetic && policy == SyntheticAlertPolicy::Suppress {
        AlertDecision::suppressed(payload)
    } else {
        AlertDecision::alert(payload)
    }
}

/// Hits may qualify on severity alone; the headline must not claim a tier.
fn compose_message(
    count: usize,
    critical: usize,
    max_fwi: f64,
    locations: &[String],
    synthetic: bool,
) -> String {
    let mut msg = format!(
        "🚨 *FIRE ALERT: {count} HOTSPOT{} OVER ALERT THRESHOLD* 🚨\n\n🔥 *Max FWI:* {max_fwi:.1}\n🔴 *CRITICAL tier:* {critical} of {count}\n📍 *Locations:* {}",
        if count == 1 { "" } else { "S" },
        locations.join(" | ")
    );
    if synthetic {
        msg.push_str("\n\n⚠️ _Synthetic test data, not real detections._");
    }
    msg
}
