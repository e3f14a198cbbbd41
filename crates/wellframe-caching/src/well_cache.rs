//! The whole-run derived-table cache.
//!
//! One file per (feature type, run) holds the complete table for that
//! run: every well, never a caller-filtered subset. Narrower queries go
//! through [`crate::CachingWellFrameBuilder`], which filters in memory
//! after load. This granularity is what makes repeated, overlapping
//! well-level queries cheap.

use crate::feature_calc::calc_feature;
use crate::interpolation::AlignmentSettings;
use crate::raw_store::RawStore;
use crate::sensor_cache::SensorCache;
use crate::store::{CacheStore, LocalDiskStore};
use ndarray::Array2;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};
use wellframe_serialization::{read_table, write_table};
use wellframe_structures::{
    FeatureType, Result, RunId, WellFrame, WellRow, WellframeError,
};

/// A per-run failure from a batch download.
pub type FailedRun = (RunId, WellframeError);

/// A cache of [`WellFrame`]s for one particular feature.
pub struct WellCache<R: RawStore> {
    feature: FeatureType,
    cache_dir: PathBuf,
    store: Box<dyn CacheStore>,
    sensor_cache: SensorCache<R>,
    raw: Arc<R>,
    settings: AlignmentSettings,
}

impl<R: RawStore> WellCache<R> {
    /// Creates a cache rooted at `{cache_root}/wells/{feature}`, sharing
    /// `cache_root` with the sensor cache it builds internally.
    pub fn new(cache_root: &Path, feature: FeatureType, raw: Arc<R>) -> Result<WellCache<R>> {
        let sensor_cache = SensorCache::new(cache_root, Arc::clone(&raw))?;
        Ok(WellCache {
            feature,
            cache_dir: cache_root.join("wells").join(feature.internal_name()),
            store: Box::new(LocalDiskStore),
            sensor_cache,
            raw,
            settings: AlignmentSettings::default(),
        })
    }

    pub fn with_alignment_settings(mut self, settings: AlignmentSettings) -> WellCache<R> {
        self.settings = settings;
        self
    }

    /// Passes a waveform rendering rate through to the inner sensor
    /// cache.
    pub fn with_waveform_hz(mut self, hz: f64) -> WellCache<R> {
        self.sensor_cache = self.sensor_cache.with_waveform_hz(hz);
        self
    }

    pub fn feature(&self) -> FeatureType {
        self.feature
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn raw_store(&self) -> &Arc<R> {
        &self.raw
    }

    pub fn sensor_cache(&self) -> &SensorCache<R> {
        &self.sensor_cache
    }

    pub fn path_of(&self, run: RunId) -> PathBuf {
        self.cache_dir.join(format!("{}.wft", run.0))
    }

    pub fn key_from_path(&self, path: &Path) -> Option<RunId> {
        if path.extension()?.to_str()? != "wft" {
            return None;
        }
        Some(RunId(path.file_stem()?.to_str()?.parse().ok()?))
    }

    pub fn contains(&self, run: RunId) -> bool {
        self.store.exists(&self.path_of(run))
    }

    /// Every run currently cached for this feature.
    pub fn contents(&self) -> Vec<RunId> {
        let mut runs = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&self.cache_dir) {
            for entry in entries.flatten() {
                if let Some(run) = self.key_from_path(&entry.path()) {
                    runs.push(run);
                }
            }
        }
        runs.sort();
        runs
    }

    pub fn delete(&self, run: RunId) -> Result<()> {
        self.store.delete(&self.path_of(run))
    }

    /// Computes and persists the table of every run not already cached.
    ///
    /// One bad run does not abort the batch; failures come back in the
    /// returned list and the caller must inspect them.
    pub fn download(&self, runs: &BTreeSet<RunId>) -> Result<Vec<FailedRun>> {
        if runs.is_empty() {
            return Err(WellframeError::EmptyCollection("no runs requested".into()));
        }
        let missing: Vec<RunId> = runs.iter().copied().filter(|r| !self.contains(*r)).collect();
        debug!("got {:?} as missing runs", missing);
        let mut failures = Vec::new();
        for run in missing {
            match self.build_run(run) {
                Ok(frame) => {
                    let saved_to = self.path_of(run);
                    info!("saving run {} to {}", run, saved_to.display());
                    if let Err(e) = self
                        .store
                        .write(&saved_to, &write_table(&self.feature.internal_name(), &frame))
                    {
                        error!("failed to save {}: {}", run, e);
                        failures.push((run, e));
                    }
                }
                Err(e) => {
                    error!("failed to build table for {}: {}", run, e);
                    failures.push((run, e));
                }
            }
        }
        Ok(failures)
    }

    /// Loads one run's table, downloading it first if absent.
    pub fn load(&self, run: RunId) -> Result<WellFrame> {
        let mut failures = self.download(&BTreeSet::from([run]))?;
        if let Some((_, e)) = failures.pop() {
            return Err(e);
        }
        self.read_run(run)
    }

    /// Loads and concatenates several runs' tables.
    ///
    /// If any requested run is missing or unreadable after download was
    /// attempted, the typed error surfaces instead of partial data.
    pub fn load_multiple(&self, runs: &BTreeSet<RunId>) -> Result<WellFrame> {
        let mut failures = self.download(runs)?;
        if let Some((_, e)) = failures.pop() {
            return Err(e);
        }
        let mut frames = Vec::with_capacity(runs.len());
        for run in runs {
            frames.push(self.read_run(*run)?);
        }
        WellFrame::concat(frames)
    }

    fn read_run(&self, run: RunId) -> Result<WellFrame> {
        let bytes = self.store.read(&self.path_of(run))?;
        read_table(&self.feature.internal_name(), &bytes)
    }

    /// Computes the complete table for one run: one row per well, every
    /// well included.
    fn build_run(&self, run: RunId) -> Result<WellFrame> {
        let metadata = self
            .raw
            .fetch_metadata(run)
            .ok_or_else(|| WellframeError::Lookup(format!("metadata for {run}")))?;
        if metadata.wells.is_empty() {
            return Err(WellframeError::EmptyCollection(format!("{run} has no wells")));
        }
        let mut wells = metadata.wells.clone();
        wells.sort_by_key(|w| (w.index, w.id));
        let mut rows = Vec::with_capacity(wells.len());
        let mut series = Vec::with_capacity(wells.len());
        for well in &wells {
            let blob = self
                .raw
                .fetch_well_feature(well.id, self.feature)
                .ok_or_else(|| {
                    WellframeError::Lookup(format!(
                        "feature {} for well {}",
                        self.feature, well.id
                    ))
                })?;
            let values = calc_feature(
                self.feature,
                &self.sensor_cache,
                &metadata,
                well.id,
                &blob,
                &self.settings,
            )?;
            rows.push(WellRow::from_info(run, well));
            series.push(values);
        }
        // Wells of one run almost always agree on length; pad the rare
        // stragglers with NaN the same way cross-run concatenation does
        let width = series.iter().map(|s| s.len()).max().unwrap_or(0);
        let mut features = Array2::from_elem((series.len(), width), f32::NAN);
        for (i, s) in series.iter().enumerate() {
            features.slice_mut(ndarray::s![i, ..s.len()]).assign(s);
        }
        WellFrame::new(rows, features)
    }
}
