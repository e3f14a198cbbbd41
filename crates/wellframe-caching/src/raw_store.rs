//! The seam to the relational database layer.
//!
//! The caches never talk to a live database; they are handed a
//! [`RawStore`] at construction. Absence is `None`, not an error; the
//! cache layer turns it into a typed lookup failure.

use std::collections::HashMap;
use std::sync::Mutex;
use wellframe_structures::{FeatureType, RunId, RunMetadata, SensorKind, WellId};

/// Supplier of raw sensor blobs, per-well feature blobs, and run
/// metadata, by identifier.
pub trait RawStore {
    /// The stored blob for one raw sensor of one run.
    fn fetch_raw(&self, kind: SensorKind, run: RunId) -> Option<Vec<u8>>;

    /// Wells, hardware generation, declared battery length, and ideal
    /// framerate for one run.
    fn fetch_metadata(&self, run: RunId) -> Option<RunMetadata>;

    /// The stored feature blob for one (well, feature type) pair.
    fn fetch_well_feature(&self, well: WellId, feature: FeatureType) -> Option<Vec<u8>>;

    /// The run a well belongs to.
    fn run_of_well(&self, well: WellId) -> Option<RunId>;
}

/// An in-memory [`RawStore`] for tests and fixtures.
///
/// Counts fetches per sensor key so idempotence properties can be
/// asserted against it.
#[derive(Debug, Default)]
pub struct InMemoryRawStore {
    sensors: HashMap<(SensorKind, RunId), Vec<u8>>,
    metadata: HashMap<RunId, RunMetadata>,
    well_features: HashMap<(WellId, FeatureType), Vec<u8>>,
    fetch_counts: Mutex<HashMap<(SensorKind, RunId), usize>>,
}

impl InMemoryRawStore {
    pub fn new() -> InMemoryRawStore {
        InMemoryRawStore::default()
    }

    pub fn insert_sensor(&mut self, kind: SensorKind, run: RunId, blob: Vec<u8>) {
        self.sensors.insert((kind, run), blob);
    }

    pub fn insert_metadata(&mut self, metadata: RunMetadata) {
        self.metadata.insert(metadata.run, metadata);
    }

    pub fn insert_well_feature(&mut self, well: WellId, feature: FeatureType, blob: Vec<u8>) {
        self.well_features.insert((well, feature), blob);
    }

    /// How many times `fetch_raw` was called for this key.
    pub fn fetch_count(&self, kind: SensorKind, run: RunId) -> usize {
        self.fetch_counts
            .lock()
            .map(|counts| counts.get(&(kind, run)).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total `fetch_raw` calls across all keys.
    pub fn total_fetches(&self) -> usize {
        self.fetch_counts
            .lock()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }
}

impl RawStore for InMemoryRawStore {
    fn fetch_raw(&self, kind: SensorKind, run: RunId) -> Option<Vec<u8>> {
        if let Ok(mut counts) = self.fetch_counts.lock() {
            *counts.entry((kind, run)).or_insert(0) += 1;
        }
        self.sensors.get(&(kind, run)).cloned()
    }

    fn fetch_metadata(&self, run: RunId) -> Option<RunMetadata> {
        self.metadata.get(&run).cloned()
    }

    fn fetch_well_feature(&self, well: WellId, feature: FeatureType) -> Option<Vec<u8>> {
        self.well_features.get(&(well, feature)).cloned()
    }

    fn run_of_well(&self, well: WellId) -> Option<RunId> {
        self.metadata
            .values()
            .find(|m| m.wells.iter().any(|w| w.id == well))
            .map(|m| m.run)
    }
}
