//! The wellframe caching pipeline: sensor dependency resolution, frame
//! alignment, whole-run well tables, and the query façade over them.
//!
//! Control flows downward on cache misses and upward as materialized
//! values: `CachingWellFrameBuilder` → `WellCache` → feature calculation
//! → `align_frames` → `SensorCache` → `RawStore`. Everything is
//! single-threaded and blocking; the filesystem is the only shared
//! state.

mod feature_calc;
mod frame_builder;
mod interpolation;
mod raw_store;
mod sensor_cache;
mod store;
mod well_cache;

pub use feature_calc::calc_feature;
pub use frame_builder::CachingWellFrameBuilder;
pub use interpolation::{align_frames, AlignmentSettings};
pub use raw_store::{InMemoryRawStore, RawStore};
pub use sensor_cache::{FailedSensorKey, SensorCache, SensorValue};
pub use store::{CacheStore, LocalDiskStore};
pub use well_cache::{FailedRun, WellCache};
