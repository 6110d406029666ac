//! Severity scoring (0–100).
//!
//! Two strategies, picked once when the predictor is built:
//! - `Model`: a loaded regressor; output clamped to [0,100]. Inference errors
//!   degrade to the formula for that record, with a warning.
//! - `Formula`: `FWI * FALLBACK_SEVERITY_PER_FWI`, clamped.
//!
//! `Disabled` exists for deployments that turn the formula fallback off; it
//! yields `None` so the gap stays visible downstream.

pub mod artifact;

use anyhow::Result;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;

use crate::models::{FireIndices, SeverityScore, SeveritySource, WeatherSample};
use artifact::ModelArtifact;

/// Canonical fallback multiplier: severity = FWI * 0.8.
pub const FALLBACK_SEVERITY_PER_FWI: f64 = 0.8;

pub const FEATURE_COUNT: usize = 5;

/// Model input, in artifact order: temp, rh, wind, rain, FWI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityFeatures {
    pub temperature_c: f64,
    pub relative_humidity: f64,
    pub wind_kmh: f64,
    pub rain_mm: f64,
    pub fwi: f64,
}

impl SeverityFeatures {
    pub fn new(weather: &WeatherSample, indices: &FireIndices) -> Self {
        Self {
            temperature_c: weather.temperature_c,
            relative_humidity: weather.relative_humidity,
            wind_kmh: weather.wind_kmh,
            rain_mm: weather.rain_mm,
            fwi: indices.fwi,
        }
    }

    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.temperature_c,
            self.relative_humidity,
            self.wind_kmh,
            self.rain_mm,
            self.fwi,
        ]
    }
}

/// A learned model. Raw output; clamping is the predictor's job.
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &SeverityFeatures) -> Result<f64>;
    fn name(&self) -> &'static str;
}

/// `clamp(FWI * 0.8, 0, 100)`; `None` only for a non-finite FWI.
pub fn fallback_severity(fwi: f64) -> Option<SeverityScore> {
    if !fwi.is_finite() {
        return None;
    }
    Some(SeverityScore::new(
        fwi * FALLBACK_SEVERITY_PER_FWI,
        SeveritySource::Formula,
    ))
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "severity_fallback_total",
            "Model inferences that degraded to the FWI formula."
        );
    });
}

#[derive(Clone)]
pub enum SeverityPredictor {
    Model {
        regressor: Arc<dyn Regressor>,
        fallback: bool,
    },
    Formula,
    Disabled,
}

impl std::fmt::Debug for SeverityPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeverityPredictor::Model {
                regressor,
                fallback,
            } => f
                .debug_struct("Model")
                .field("regressor", &regressor.name())
                .field("fallback", fallback)
                .finish(),
            SeverityPredictor::Formula => f.write_str("Formula"),
            SeverityPredictor::Disabled => f.write_str("Disabled"),
        }
    }
}

impl SeverityPredictor {
    /// Reads the artifact (if any) once. A missing or corrupt artifact is not
    /// fatal: the predictor starts in formula mode, or `Disabled` when the
    /// fallback is switched off.
    pub fn load(model_path: Option<&Path>, fallback: bool) -> Self {
        ensure_metrics_described();
        let without_model = if fallback {
            SeverityPredictor::Formula
        } else {
            SeverityPredictor::Disabled
        };

        let Some(path) = model_path else {
            tracing::warn!(
                target: "severity",
                mode = ?without_model,
                "no model path configured, severity model unavailable"
            );
            return without_model;
        };

        match ModelArtifact::load(path) {
            Ok(model) => {
                tracing::info!(
                    target: "severity",
                    path = %path.display(),
                    kind = model.name(),
                    "severity model loaded"
                );
                SeverityPredictor::Model {
                    regressor: Arc::new(model),
                    fallback,
                }
            }
            Err(e) => {
                tracing::warn!(
                    target: "severity",
                    error = %e,
                    mode = ?without_model,
                    "severity model unavailable"
                );
                without_model
            }
        }
    }

    pub fn with_regressor(regressor: Arc<dyn Regressor>) -> Self {
        SeverityPredictor::Model {
            regressor,
            fallback: true,
        }
    }

    pub fn predict(&self, features: &SeverityFeatures) -> Option<SeverityScore> {
        match self {
            SeverityPredictor::Formula => fallback_severity(features.fwi),
            SeverityPredictor::Disabled => None,
            SeverityPredictor::Model {
                regressor,
                fallback,
            } => match regressor.predict(features) {
                Ok(raw) if raw.is_finite() => {
                    Some(SeverityScore::new(raw, SeveritySource::Model))
                }
                Ok(raw) => self.degrade(*fallback, features, &format!("non-finite output {raw}")),
                Err(e) => self.degrade(*fallback, features, &format!("{e:#}")),
            },
        }
    }

    fn degrade(
        &self,
        fallback: bool,
        features: &SeverityFeatures,
        reason: &str,
    ) -> Option<SeverityScore> {
        tracing::warn!(target: "severity", reason, fallback, "model inference failed");
        counter!("severity_fallback_total").increment(1);
        if fallback {
            fallback_severity(features.fwi)
        } else {
            None
        }
    }

    pub fn is_model_backed(&self) -> bool {
        matches!(self, SeverityPredictor::Model { .. })
    }
}
