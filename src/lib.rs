//! # wellframe
//!
//! Caching and time-alignment pipeline for behavioral screening sensor
//! data. Instrument recordings and per-well measurements are produced
//! once per experimental run; wellframe serves them repeatedly as
//! aligned, analysis-ready tables without re-fetching or re-computing.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wellframe::caching::{CachingWellFrameBuilder, InMemoryRawStore, WellCache};
//! use wellframe::structures::{FeatureType, WellId};
//!
//! # fn main() -> wellframe::structures::Result<()> {
//! let raw = Arc::new(InMemoryRawStore::new()); // or a real database seam
//! let cache = WellCache::new("cache".as_ref(), FeatureType::MI, raw)?;
//!
//! // Requesting one well caches its entire run, so the next
//! // overlapping query is free
//! let frame = CachingWellFrameBuilder::wells([WellId(101)], &cache).build()?;
//! println!("{} wells x {} frames", frame.n_wells(), frame.n_frames());
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! - [`structures`] — sensor kinds, feature types, battery windows,
//!   well tables, and the error taxonomy
//! - [`serialization`] — wire decoding and the on-disk container formats
//! - [`caching`] — the sensor cache, frame alignment, well-table cache,
//!   and query builder
//! - [`config`] — TOML configuration with environment overrides

pub use wellframe_caching as caching;
pub use wellframe_config as config;
pub use wellframe_serialization as serialization;
pub use wellframe_structures as structures;

use wellframe_caching::AlignmentSettings;
use wellframe_config::WellframeConfig;

/// Translates loaded configuration into alignment policies.
pub fn alignment_settings(config: &WellframeConfig) -> AlignmentSettings {
    AlignmentSettings {
        stringent: config.alignment.stringent,
        mismatch_tolerance_frames: config.alignment.mismatch_tolerance_frames,
        drift_frames: config.alignment.drift_frames,
    }
}

/// Builds a [`caching::WellCache`] from loaded configuration.
pub fn well_cache_from_config<R: caching::RawStore>(
    config: &WellframeConfig,
    feature: structures::FeatureType,
    raw: std::sync::Arc<R>,
) -> structures::Result<caching::WellCache<R>> {
    Ok(caching::WellCache::new(&config.cache.root, feature, raw)?
        .with_alignment_settings(alignment_settings(config))
        .with_waveform_hz(config.audio.waveform_hz))
}
