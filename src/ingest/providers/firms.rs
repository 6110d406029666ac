use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use metrics::{counter, histogram};
use std::time::Duration;

use crate::config::{Config, Region};
use crate::ingest::types::HotspotProvider;
use crate::models::Hotspot;

/// Column positions resolved once from the CSV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmsSchema {
    pub latitude: usize,
    pub longitude: usize,
    pub brightness: Option<usize>,
    pub acq_date: Option<usize>,
    pub acq_time: Option<usize>,
}

const LATITUDE: &[&str] = &["latitude", "lat"];
const LONGITUDE: &[&str] = &["longitude", "lon"];
const BRIGHTNESS: &[&str] = &["brightness", "bright_ti4", "bright_ti5"];
const ACQ_DATE: &[&str] = &["acq_date"];
const ACQ_TIME: &[&str] = &["acq_time"];

impl FirmsSchema {
    pub fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            names.iter().find_map(|n| {
                headers
                    .iter()
                    .position(|h| h.trim().eq_ignore_ascii_case(n))
            })
        };
        Ok(Self {
            latitude: find(LATITUDE).ok_or_else(|| anyhow!("FIRMS CSV has no latitude column"))?,
            longitude: find(LONGITUDE)
                .ok_or_else(|| anyhow!("FIRMS CSV has no longitude column"))?,
            brightness: find(BRIGHTNESS),
            acq_date: find(ACQ_DATE),
            acq_time: find(ACQ_TIME),
        })
    }

    fn hotspot(&self, row: &csv::StringRecord, fetched_at: DateTime<Utc>) -> Result<Hotspot> {
        let num = |idx: usize| -> Result<f64> {
            let raw = row.get(idx).unwrap_or_default().trim();
            raw.parse::<f64>()
                .with_context(|| format!("column {idx}: {raw:?} is not a number"))
        };
        let lat = num(self.latitude)?;
        let lon = num(self.longitude)?;
        let brightness = self.brightness.and_then(|i| num(i).ok());

        let date = self
            .acq_date
            .and_then(|i| row.get(i))
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());
        let time = self
            .acq_time
            .and_then(|i| row.get(i))
            .and_then(parse_hhmm)
            .unwrap_or(NaiveTime::MIN);
        let acquired_at = date
            .map(|d| d.and_time(time).and_utc())
            .unwrap_or(fetched_at);

        Hotspot::new(lat, lon, acquired_at, brightness)
    }
}

/// FIRMS reports acquisition time as `HHMM` (sometimes without the leading zero).
fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let s = s.trim().replace(':', "");
    let n: u32 = s.parse().ok()?;
    NaiveTime::from_hms_opt(n / 100, n % 100, 0)
}

/// Parse a FIRMS CSV body. Rows with unusable coordinates are skipped.
/// Returns (hotspots, skipped_rows).
pub fn parse_firms_csv(body: &str, fetched_at: DateTime<Utc>) -> Result<(Vec<Hotspot>, usize)> {
    let t0 = std::time::Instant::now();
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());
    let headers = rdr.headers().context("reading FIRMS CSV header")?.clone();
    let schema = FirmsSchema::from_headers(&headers)?;

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for row in rdr.records() {
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = ?e, "unreadable FIRMS row");
                skipped += 1;
                continue;
            }
        };
        match schema.hotspot(&row, fetched_at) {
            Ok(h) => out.push(h),
            Err(e) => {
                tracing::debug!(error = ?e, "skipping FIRMS row");
                skipped += 1;
            }
        }
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("hotspot_parse_ms").record(ms);
    if skipped > 0 {
        counter!("hotspot_rows_skipped_total").increment(skipped as u64);
    }
    Ok((out, skipped))
}

/// Keys FIRMS would reject, or that were never filled in.
pub fn is_placeholder_key(key: &str) -> bool {
    let k = key.trim();
    k.is_empty() || k.starts_with('#') || k.eq_ignore_ascii_case("DEMO_KEY")
}

pub struct FirmsProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: Option<String>,
        client: reqwest::Client,
        timeout: Duration,
    },
}

impl FirmsProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    /// `url` is `None` when the key is missing or a placeholder; fetches then fail fast
    /// without touching the network.
    pub fn from_config(cfg: &Config, client: reqwest::Client) -> Self {
        let url = cfg
            .firms_api_key
            .as_deref()
            .filter(|k| !is_placeholder_key(k))
            .map(|key| firms_url(&cfg.firms_base, key, &cfg.firms_sensor, &cfg.region, cfg.firms_days));
        Self {
            mode: Mode::Http {
                url,
                client,
                timeout: Duration::from_millis(cfg.firms_timeout_ms),
            },
        }
    }
}

pub fn firms_url(base: &str, key: &str, sensor: &str, region: &Region, days: u8) -> String {
    let base = base.trim_end_matches('/');
    match region {
        Region::Country { code } => format!(
            "{base}/api/country/csv/{key}/{sensor}/{}/{days}",
            code.to_ascii_uppercase()
        ),
        Region::Area {
            west,
            south,
            east,
            north,
        } => format!("{base}/api/area/csv/{key}/{sensor}/{west},{south},{east},{north}/{days}"),
    }
}

#[async_trait]
impl HotspotProvider for FirmsProvider {
    async fn fetch(&self) -> Result<Vec<Hotspot>> {
        let now = Utc::now();
        match &self.mode {
            Mode::Fixture(s) => Ok(parse_firms_csv(s, now)?.0),
            Mode::Http {
                url,
                client,
                timeout,
            } => {
                let Some(url) = url else {
                    bail!("FIRMS API key missing or placeholder");
                };
                tracing::info!(target: "ingest", "querying FIRMS hotspot feed");
                let resp = client
                    .get(url)
                    .timeout(*timeout)
                    .send()
                    .await
                    .context("firms http get()")?
                    .error_for_status()
                    .context("firms non-2xx")?;
                let body = resp.text().await.context("firms http .text()")?;
                let (hotspots, skipped) = parse_firms_csv(&body, now)?;
                tracing::info!(
                    target: "ingest",
                    hotspots = hotspots.len(),
                    skipped,
                    "FIRMS feed parsed"
                );
                Ok(hotspots)
            }
        }
    }

    fn name(&self) -> &'static str {
        "firms"
    }
}
