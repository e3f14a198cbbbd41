//! The core crate for wellframe. Defines the data types shared by the
//! caching pipeline: sensor kinds and their dependency registry, feature
//! types, battery windows, time-dependent sensor series, and the
//! one-row-per-well table every query ultimately produces.

mod battery;
mod error;
mod feature_type;
mod run;
mod sensor_kind;
mod well_frame;

pub use battery::{BatteryWindow, TimeDepSensor, TimingSensor, Waveform};
pub use error::{Result, WellframeError};
pub use feature_type::{FeatureName, FeatureType};
pub use run::{HardwareGeneration, RunId, RunMetadata, WellId, WellInfo};
pub use sensor_kind::{FormatClass, SensorKind, SensorKindRegistry, WireFormat};
pub use well_frame::{WellFrame, WellRow};
