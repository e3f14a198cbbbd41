//! Query-level façade over the well cache.
//!
//! Callers ask for an exact set of wells or runs; the builder guarantees
//! the owning runs are cached in full, then narrows the result to just
//! the requested wells in memory. Narrowing never feeds back into the
//! cache, so overlapping well-level queries stay cheap.

use crate::raw_store::RawStore;
use crate::well_cache::WellCache;
use std::collections::BTreeSet;
use tracing::debug;
use wellframe_structures::{
    FeatureType, Result, RunId, WellFrame, WellId, WellRow, WellframeError,
};

type Labeler = Box<dyn Fn(&WellRow) -> String>;

/// Builds a [`WellFrame`] for an exact set of wells or runs, backed by a
/// [`WellCache`].
///
/// The cache saves whole runs; the builder returns only the wells of
/// interest unless [`Self::include_full_runs`] is set.
pub struct CachingWellFrameBuilder<'a, R: RawStore> {
    cache: &'a WellCache<R>,
    wells: Option<BTreeSet<WellId>>,
    runs: Option<BTreeSet<RunId>>,
    include_full_runs: bool,
    labeler: Option<Labeler>,
}

impl<'a, R: RawStore> CachingWellFrameBuilder<'a, R> {
    /// Queries an exact set of wells.
    pub fn wells(
        wells: impl IntoIterator<Item = WellId>,
        cache: &'a WellCache<R>,
    ) -> CachingWellFrameBuilder<'a, R> {
        CachingWellFrameBuilder {
            cache,
            wells: Some(wells.into_iter().collect()),
            runs: None,
            include_full_runs: false,
            labeler: None,
        }
    }

    /// Queries an exact set of runs.
    pub fn runs(
        runs: impl IntoIterator<Item = RunId>,
        cache: &'a WellCache<R>,
    ) -> CachingWellFrameBuilder<'a, R> {
        CachingWellFrameBuilder {
            cache,
            wells: None,
            runs: Some(runs.into_iter().collect()),
            include_full_runs: true,
            labeler: None,
        }
    }

    /// Returns every well of a run if any well of it matched the query.
    /// Costs nothing extra: whole runs are cached either way.
    pub fn include_full_runs(mut self) -> CachingWellFrameBuilder<'a, R> {
        self.include_full_runs = true;
        self
    }

    /// Asserts the feature this query expects. Must equal the cache's
    /// feature; the builder cannot serve one feature from another's
    /// cache.
    pub fn with_feature(self, feature: FeatureType) -> Result<CachingWellFrameBuilder<'a, R>> {
        if feature != self.cache.feature() {
            return Err(WellframeError::ContradictoryRequest(format!(
                "requested feature {}, but the cache uses {}",
                feature,
                self.cache.feature()
            )));
        }
        Ok(self)
    }

    /// Relabels rows after load. Does not affect caching semantics.
    pub fn with_labeler(
        mut self,
        labeler: impl Fn(&WellRow) -> String + 'static,
    ) -> CachingWellFrameBuilder<'a, R> {
        self.labeler = Some(Box::new(labeler));
        self
    }

    /// Loads the owning runs from the cache (downloading any that are
    /// missing) and returns the requested table.
    pub fn build(self) -> Result<WellFrame> {
        let owning_runs = self.owning_runs()?;
        debug!("getting full cached tables for {} runs", owning_runs.len());
        let mut frame = self.cache.load_multiple(&owning_runs)?;
        if let Some(wells) = &self.wells {
            if !self.include_full_runs {
                frame = frame.filter_wells(wells);
            }
        }
        if let Some(labeler) = &self.labeler {
            frame = frame.relabel(labeler);
        }
        Ok(frame.sort_standard())
    }

    /// The runs whose tables must be materialized for this query.
    fn owning_runs(&self) -> Result<BTreeSet<RunId>> {
        if let Some(runs) = &self.runs {
            if runs.is_empty() {
                return Err(WellframeError::EmptyCollection("no runs requested".into()));
            }
            return Ok(runs.clone());
        }
        let wells = self.wells.as_ref().filter(|w| !w.is_empty()).ok_or_else(|| {
            WellframeError::EmptyCollection("no wells requested".into())
        })?;
        let mut runs = BTreeSet::new();
        for well in wells {
            let run = self
                .cache
                .raw_store()
                .run_of_well(*well)
                .ok_or_else(|| WellframeError::Lookup(format!("run of well {well}")))?;
            runs.insert(run);
        }
        Ok(runs)
    }
}
