// src/notify/antiflutter.rs
use chrono::{DateTime, Duration, Utc};

/// Outcome of asking the gate whether an alert may go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    /// An alert was sent recently; `remaining` until the gate reopens.
    Cooling { remaining: Duration },
}

impl Gate {
    pub fn is_open(&self) -> bool {
        matches!(self, Gate::Open)
    }
}

/// Holds back repeat alerts across monitoring cycles.
///
/// An alert is a repeat when it names the same set of locations as the last one
/// delivered; alerts about other locations pass straight through. Only delivery
/// is gated: the decision for a batch is computed the same way whether or not
/// the gate is open. State moves only through `mark_sent`, so a failed delivery
/// leaves the gate open for the next cycle.
#[derive(Debug, Clone)]
pub struct AntiFlutter {
    cooldown: Duration,
    last_sent: Option<DateTime<Utc>>,
    last_key: Vec<String>,
}

fn alert_key(locations: &[String]) -> Vec<String> {
    let mut key = locations.to_vec();
    key.sort();
    key.dedup();
    key
}

impl AntiFlutter {
    /// Negative cooldowns collapse to zero.
    pub fn new(cooldown_secs: i64) -> Self {
        Self {
            cooldown: Duration::seconds(cooldown_secs.max(0)),
            last_sent: None,
            last_key: Vec::new(),
        }
    }

    /// `locations` identifies the alert; order does not matter.
    pub fn check(&self, now: DateTime<Utc>, locations: &[String]) -> Gate {
        let Some(sent) = self.last_sent else {
            return Gate::Open;
        };
        if alert_key(locations) != self.last_key {
            return Gate::Open;
        }
        let reopens = sent + self.cooldown;
        if now >= reopens {
            Gate::Open
        } else {
            Gate::Cooling {
                remaining: reopens - now,
            }
        }
    }

    pub fn mark_sent(&mut self, at: DateTime<Utc>, locations: &[String]) {
        self.last_sent = Some(at);
        self.last_key = alert_key(locations);
    }

    pub fn last_sent(&self) -> Option<DateTime<Utc>> {
        self.last_sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
    }

    fn locs(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn open_until_something_is_sent() {
        let gate = AntiFlutter::new(10_800);
        assert_eq!(gate.check(t0(), &locs(&["-3.40,-52.00"])), Gate::Open);
        assert_eq!(gate.last_sent(), None);
    }

    #[test]
    fn cooling_reports_time_left() {
        let mut gate = AntiFlutter::new(10_800);
        gate.mark_sent(t0(), &locs(&["-3.40,-52.00"]));
        assert_eq!(
            gate.check(t0() + Duration::minutes(30), &locs(&["-3.40,-52.00"])),
            Gate::Cooling {
                remaining: Duration::minutes(150)
            }
        );
    }

    #[test]
    fn reopens_exactly_at_cooldown_end() {
        let mut gate = AntiFlutter::new(10_800);
        let key = locs(&["-3.40,-52.00"]);
        gate.mark_sent(t0(), &key);
        assert!(!gate.check(t0() + Duration::seconds(10_799), &key).is_open());
        assert!(gate.check(t0() + Duration::hours(3), &key).is_open());
    }

    #[test]
    fn new_locations_pass_during_cooldown() {
        let mut gate = AntiFlutter::new(10_800);
        gate.mark_sent(t0(), &locs(&["-3.40,-52.00"]));
        let later = t0() + Duration::minutes(10);
        assert!(gate.check(later, &locs(&["-12.00,-52.00"])).is_open());
        assert!(gate
            .check(later, &locs(&["-3.40,-52.00", "-12.00,-52.00"]))
            .is_open());
    }

    #[test]
    fn same_locations_in_another_order_are_a_repeat() {
        let mut gate = AntiFlutter::new(10_800);
        gate.mark_sent(t0(), &locs(&["-3.40,-52.00", "-12.00,-52.00"]));
        let gate_state = gate.check(
            t0() + Duration::minutes(10),
            &locs(&["-12.00,-52.00", "-3.40,-52.00"]),
        );
        assert!(!gate_state.is_open());
    }

    #[test]
    fn zero_or_negative_cooldown_never_blocks() {
        let mut gate = AntiFlutter::new(-5);
        gate.mark_sent(t0(), &locs(&["-3.40,-52.00"]));
        assert!(gate.check(t0(), &locs(&["-3.40,-52.00"])).is_open());
    }
}
