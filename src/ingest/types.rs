// src/ingest/types.rs
use anyhow::Result;

use crate::models::{Hotspot, Provenance};

#[async_trait::async_trait]
pub trait HotspotProvider: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Hotspot>>;
    fn name(&self) -> &'static str;
}

/// Hotspots for one cycle plus where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotBatch {
    pub hotspots: Vec<Hotspot>,
    pub provenance: Provenance,
}

impl HotspotBatch {
    pub fn is_synthetic(&self) -> bool {
        self.provenance == Provenance::Synthetic
    }

    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }
}
