use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::WeatherProvider;
use crate::config::Config;
use crate::models::WeatherSample;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,rain";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Current {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    /// km/h (Open-Meteo default unit)
    wind_speed_10m: f64,
    rain: f64,
}

/// Parse the `current` block of an Open-Meteo forecast response.
pub fn parse_current(body: &str) -> Result<WeatherSample> {
    let r: ForecastResponse = serde_json::from_str(body).context("parse open-meteo JSON")?;
    let c = r.current;
    let sample = WeatherSample::new(
        c.temperature_2m,
        c.relative_humidity_2m,
        c.wind_speed_10m,
        c.rain,
    );
    sample.validate()?;
    Ok(sample)
}

#[derive(Clone)]
pub struct OpenMeteoProvider {
    base: String,
    timezone: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OpenMeteoProvider {
    pub fn from_config(cfg: &Config, client: reqwest::Client) -> Self {
        Self {
            base: cfg.weather_base.trim_end_matches('/').to_string(),
            timezone: cfg.weather_timezone.clone(),
            client,
            timeout: Duration::from_millis(cfg.weather_timeout_ms),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherSample> {
        let url = format!("{}/v1/forecast", self.base);
        let lat = latitude.to_string();
        let lon = longitude.to_string();
        let body = self
            .client
            .get(&url)
            .query(&[
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("current", CURRENT_FIELDS),
                ("timezone", self.timezone.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .context("open-meteo http get()")?
            .error_for_status()
            .context("open-meteo non-2xx")?
            .text()
            .await
            .context("open-meteo http .text()")?;
        parse_current(&body)
    }

    fn name(&self) -> &'static str {
        "open-meteo"
    }
}
