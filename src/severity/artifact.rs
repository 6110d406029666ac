//! Serialized regression models.
//!
//! Artifacts are JSON documents tagged by `kind`:
//!
//! ```json
//! { "kind": "linear", "intercept": 4.0, "coefficients": [0.5, -0.1, 1.5, -10.0, 0.6] }
//! ```
//!
//! or a symmetric ("oblivious") tree ensemble, where every level of a tree
//! shares one split and leaf index bit `i` is set when
//! `features[splits[i].feature] > splits[i].border`:
//!
//! ```json
//! { "kind": "oblivious_trees", "bias": 20.0, "scale": 1.0,
//!   "trees": [ { "splits": [ {"feature": 2, "border": 15.0} ], "leaf_values": [-5.0, 12.0] } ] }
//! ```

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::{Regressor, SeverityFeatures, FEATURE_COUNT};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact not found at {0}")]
    NotFound(String),
    #[error("reading model artifact {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("decoding model artifact {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid model artifact {path}: {reason}")]
    Invalid { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub feature: usize,
    pub border: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObliviousTree {
    pub splits: Vec<Split>,
    /// Length must be `2^splits.len()`.
    pub leaf_values: Vec<f64>,
}

impl ObliviousTree {
    fn leaf(&self, x: &SeverityFeatures) -> Result<f64> {
        let mut idx = 0usize;
        for (bit, split) in self.splits.iter().enumerate() {
            let Some(v) = x.as_array().get(split.feature).copied() else {
                bail!("split references feature {} of {FEATURE_COUNT}", split.feature);
            };
            if v > split.border {
                idx |= 1 << bit;
            }
        }
        match self.leaf_values.get(idx) {
            Some(v) => Ok(*v),
            None => bail!("leaf index {idx} out of {} leaves", self.leaf_values.len()),
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    ObliviousTrees {
        #[serde(default)]
        bias: f64,
        #[serde(default = "default_scale")]
        scale: f64,
        trees: Vec<ObliviousTree>,
    },
}

impl ModelArtifact {
    pub fn from_json(s: &str, path: &str) -> Result<Self, ArtifactError> {
        let m: ModelArtifact = serde_json::from_str(s).map_err(|source| ArtifactError::Decode {
            path: path.to_string(),
            source,
        })?;
        m.check().map_err(|reason| ArtifactError::Invalid {
            path: path.to_string(),
            reason,
        })?;
        Ok(m)
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let shown = path.display().to_string();
        if !path.exists() {
            return Err(ArtifactError::NotFound(shown));
        }
        let data = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: shown.clone(),
            source,
        })?;
        Self::from_json(&data, &shown)
    }

    /// Structural checks that make inference total for well-formed inputs.
    fn check(&self) -> std::result::Result<(), String> {
        match self {
            ModelArtifact::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != FEATURE_COUNT {
                    return Err(format!(
                        "expected {FEATURE_COUNT} coefficients, got {}",
                        coefficients.len()
                    ));
                }
                if !intercept.is_finite() || !coefficients.iter().all(|c| c.is_finite()) {
                    return Err("non-finite parameter".into());
                }
            }
            ModelArtifact::ObliviousTrees { bias, scale, trees } => {
                if !bias.is_finite() || !scale.is_finite() {
                    return Err("non-finite bias/scale".into());
                }
                for (i, t) in trees.iter().enumerate() {
                    if t.splits.len() > 16 {
                        return Err(format!("tree {i} is deeper than 16"));
                    }
                    if t.leaf_values.len() != 1usize << t.splits.len() {
                        return Err(format!(
                            "tree {i}: {} leaves for depth {}",
                            t.leaf_values.len(),
                            t.splits.len()
                        ));
                    }
                    if let Some(s) = t.splits.iter().find(|s| s.feature >= FEATURE_COUNT) {
                        return Err(format!("tree {i}: feature index {} out of range", s.feature));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Regressor for ModelArtifact {
    fn predict(&self, x: &SeverityFeatures) -> Result<f64> {
        let raw = match self {
            ModelArtifact::Linear {
                intercept,
                coefficients,
            } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(x.as_array().iter())
                        .map(|(c, v)| c * v)
                        .sum::<f64>()
            }
            ModelArtifact::ObliviousTrees { bias, scale, trees } => {
                let mut acc = 0.0;
                for t in trees {
                    acc += t.leaf(x)?;
                }
                bias + scale * acc
            }
        };
        if !raw.is_finite() {
            bail!("model produced non-finite output {raw}");
        }
        Ok(raw)
    }

    fn name(&self) -> &'static str {
        match self {
            ModelArtifact::Linear { .. } => "linear",
            ModelArtifact::ObliviousTrees { .. } => "oblivious_trees",
        }
    }
}
