//! Runtime configuration for the monitor.
//!
//! Loaded once at startup and passed explicitly into every collaborator.
//! Resolution order:
//! 1) TOML file at `$SENTINEL_CONFIG`, else `config/sentinel.toml` if present, else defaults
//! 2) env overrides for credentials and the most common knobs
//! 3) `validate()`; any failure is fatal

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_CONFIG_PATH: &str = "SENTINEL_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/sentinel.toml";

const ENV_FIRMS_API_KEY: &str = "FIRMS_API_KEY";
const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
const ENV_MODEL_PATH: &str = "SENTINEL_MODEL_PATH";
const ENV_INTERVAL_SECS: &str = "SENTINEL_INTERVAL_SECS";

/// Upper bound for a single weather lookup.
pub const MAX_WEATHER_TIMEOUT_MS: u64 = 5_000;
/// Largest day range the FIRMS area and country endpoints accept.
pub const MAX_FIRMS_DAYS: u8 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config file {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("SENTINEL_CONFIG points to non-existent path {}", .0.display())]
    MissingFile(PathBuf),
    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("malformed region: {0}")]
    Region(String),
    #[error("invalid schedule: {0}")]
    Schedule(String),
    #[error("weather timeout {0} ms must be within 1..=5000 ms")]
    WeatherTimeout(u64),
    #[error("invalid FIRMS setting: {0}")]
    Firms(String),
    #[error("require_model is set but no model_path is configured")]
    ModelPathRequired,
}

/// Geographic scope of the hotspot query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Region {
    /// ISO 3166-1 alpha-3 country code, e.g. "BRA".
    Country { code: String },
    /// Bounding box in degrees.
    Area {
        west: f64,
        south: f64,
        east: f64,
        north: f64,
    },
}

impl Default for Region {
    fn default() -> Self {
        Region::Country { code: "BRA".into() }
    }
}

impl Region {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Region::Country { code } => {
                if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(ConfigError::Region(format!(
                        "country code must be 3 ASCII letters, got {code:?}"
                    )));
                }
            }
            Region::Area {
                west,
                south,
                east,
                north,
            } => {
                if ![west, south, east, north].iter().all(|v| v.is_finite()) {
                    return Err(ConfigError::Region("non-finite bbox coordinate".into()));
                }
                if !(-180.0..=180.0).contains(west) || !(-180.0..=180.0).contains(east) {
                    return Err(ConfigError::Region(format!(
                        "longitude out of range: west={west}, east={east}"
                    )));
                }
                if !(-90.0..=90.0).contains(south) || !(-90.0..=90.0).contains(north) {
                    return Err(ConfigError::Region(format!(
                        "latitude out of range: south={south}, north={north}"
                    )));
                }
                if west >= east || south >= north {
                    return Err(ConfigError::Region(format!(
                        "empty bbox: west={west}, south={south}, east={east}, north={north}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Whether a batch produced by the synthetic generator may trigger a real alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticAlertPolicy {
    #[default]
    Suppress,
    Allow,
}

fn default_firms_base() -> String {
    "https://firms.modaps.eosdis.nasa.gov".into()
}
fn default_firms_sensor() -> String {
    "VIIRS_SNPP_NRT".into()
}
fn default_firms_days() -> u8 {
    1
}
fn default_firms_timeout_ms() -> u64 {
    10_000
}
fn default_weather_base() -> String {
    "https://api.open-meteo.com".into()
}
fn default_weather_timezone() -> String {
    "America/Sao_Paulo".into()
}
fn default_weather_timeout_ms() -> u64 {
    5_000
}
fn default_weather_pacing_ms() -> u64 {
    200
}
fn default_interval_secs() -> u64 {
    10_800
}
fn default_backoff_secs() -> u64 {
    10
}
fn default_true() -> bool {
    true
}
fn default_batch_path() -> PathBuf {
    PathBuf::from("data/processed/live_monitor.csv")
}
fn default_telegram_base() -> String {
    "https://api.telegram.org".into()
}
fn default_notify_timeout_ms() -> u64 {
    10_000
}
fn default_alert_cooldown_secs() -> i64 {
    10_800
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub chat_id: Option<String>,
    #[serde(default = "default_telegram_base")]
    pub api_base: String,
    #[serde(default = "default_notify_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub region: Region,
    pub firms_api_key: Option<String>,
    pub firms_base: String,
    pub firms_sensor: String,
    pub firms_days: u8,
    pub firms_timeout_ms: u64,

    pub weather_base: String,
    pub weather_timezone: String,
    pub weather_timeout_ms: u64,
    /// Delay between consecutive weather lookups.
    pub weather_pacing_ms: u64,

    pub interval_secs: u64,
    /// Wait after a failed cycle; must be shorter than `interval_secs`.
    pub backoff_secs: u64,

    pub model_path: Option<PathBuf>,
    /// Use the FWI formula when the model is unavailable.
    pub severity_fallback: bool,
    /// Refuse to start without a configured model path.
    pub require_model: bool,

    pub batch_path: PathBuf,

    pub telegram: TelegramConfig,
    pub synthetic_alerts: SyntheticAlertPolicy,
    pub alert_cooldown_secs: i64,

    /// Bind address for `/metrics` and `/healthz`; disabled when `None`.
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: Region::default(),
            firms_api_key: None,
            firms_base: default_firms_base(),
            firms_sensor: default_firms_sensor(),
            firms_days: default_firms_days(),
            firms_timeout_ms: default_firms_timeout_ms(),
            weather_base: default_weather_base(),
            weather_timezone: default_weather_timezone(),
            weather_timeout_ms: default_weather_timeout_ms(),
            weather_pacing_ms: default_weather_pacing_ms(),
            interval_secs: default_interval_secs(),
            backoff_secs: default_backoff_secs(),
            model_path: None,
            severity_fallback: default_true(),
            require_model: false,
            batch_path: default_batch_path(),
            telegram: TelegramConfig {
                token: None,
                chat_id: None,
                api_base: default_telegram_base(),
                timeout_ms: default_notify_timeout_ms(),
            },
            synthetic_alerts: SyntheticAlertPolicy::default(),
            alert_cooldown_secs: default_alert_cooldown_secs(),
            metrics_addr: None,
        }
    }
}

impl Config {
    /// Parse a TOML document without env overrides or validation.
    pub fn from_toml_str(s: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// File (env path, then default path, then built-in defaults) + env overrides + validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(ConfigError::MissingFile(pb));
            }
            Self::load_from(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::load_from(&default)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Credentials and the common knobs come from the environment when set.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = non_empty_env(ENV_FIRMS_API_KEY) {
            self.firms_api_key = Some(v);
        }
        if let Some(v) = non_empty_env(ENV_TELEGRAM_TOKEN) {
            self.telegram.token = Some(v);
        }
        if let Some(v) = non_empty_env(ENV_TELEGRAM_CHAT_ID) {
            self.telegram.chat_id = Some(v);
        }
        if let Some(v) = non_empty_env(ENV_MODEL_PATH) {
            self.model_path = Some(PathBuf::from(v));
        }
        if let Some(v) = non_empty_env(ENV_INTERVAL_SECS) {
            self.interval_secs = v.parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_INTERVAL_SECS,
                value: v,
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.region.validate()?;
        if self.interval_secs == 0 {
            return Err(ConfigError::Schedule("interval_secs must be > 0".into()));
        }
        if self.backoff_secs >= self.interval_secs {
            return Err(ConfigError::Schedule(format!(
                "backoff_secs ({}) must be shorter than interval_secs ({})",
                self.backoff_secs, self.interval_secs
            )));
        }
        if self.weather_timeout_ms == 0 || self.weather_timeout_ms > MAX_WEATHER_TIMEOUT_MS {
            return Err(ConfigError::WeatherTimeout(self.weather_timeout_ms));
        }
        if self.firms_days == 0 || self.firms_days > MAX_FIRMS_DAYS {
            return Err(ConfigError::Firms(format!(
                "firms_days must be within 1..={MAX_FIRMS_DAYS}, got {}",
                self.firms_days
            )));
        }
        if self.firms_timeout_ms == 0 {
            return Err(ConfigError::Firms("firms_timeout_ms must be > 0".into()));
        }
        if self.require_model && self.model_path.is_none() {
            return Err(ConfigError::ModelPathRequired);
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    /// Log the effective configuration with secrets masked.
    pub fn log_config(&self) {
        tracing::info!(
            region = ?self.region,
            sensor = %self.firms_sensor,
            firms_key = mask(self.firms_api_key.as_deref()),
            interval_secs = self.interval_secs,
            backoff_secs = self.backoff_secs,
            model_path = ?self.model_path,
            severity_fallback = self.severity_fallback,
            batch_path = %self.batch_path.display(),
            telegram = self.telegram.token.is_some() && self.telegram.chat_id.is_some(),
            synthetic_alerts = ?self.synthetic_alerts,
            "configuration loaded"
        );
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn mask(secret: Option<&str>) -> String {
    match secret {
        None => "<unset>".into(),
        Some(s) => format!("<{} chars>", s.len()),
    }
}
