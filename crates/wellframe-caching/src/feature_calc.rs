//! Computation of one well's feature values from its stored blob.
//!
//! Non-interpolated features are a direct decode plus the storage
//! quantization. Interpolated features additionally resample onto the
//! ideal-framerate timeline, using the camera and stimulus clocks that
//! the sensor cache materializes for the well's run.

use crate::interpolation::{align_frames, AlignmentSettings};
use crate::raw_store::RawStore;
use crate::sensor_cache::SensorCache;
use ndarray::Array1;
use wellframe_serialization::{finalize, from_blob};
use wellframe_structures::{
    FeatureType, Result, RunMetadata, SensorKind, WellId, WellframeError,
};

/// Calculates the feature values for one well.
///
/// For interpolated features this triggers sensor-cache materialization
/// of the run's camera and stimulus clocks.
pub fn calc_feature<R: RawStore>(
    feature: FeatureType,
    sensor_cache: &SensorCache<R>,
    metadata: &RunMetadata,
    well: WellId,
    blob: &[u8],
    settings: &AlignmentSettings,
) -> Result<Array1<f32>> {
    let values = from_blob(feature, blob)?;
    if !feature.is_interpolated() {
        return Ok(finalize(values));
    }
    if !feature.applies_to(metadata.generation) {
        return Err(WellframeError::ContradictoryRequest(format!(
            "feature {} does not apply to {} data (well {})",
            feature, metadata.generation, well
        )));
    }
    let frame_timestamps = sensor_cache
        .load_raw_millis(SensorKind::RawCameraMillis, metadata.run)?
        .mapv(|ms| ms as f64);
    let stim_timestamps = sensor_cache.load_raw_millis(SensorKind::RawStimulusMillis, metadata.run)?;
    let aligned = align_frames(
        feature,
        &values.mapv(|v| v as f64),
        &frame_timestamps,
        &stim_timestamps,
        metadata.ideal_framerate,
        metadata.battery_length_ms,
        settings,
    )?;
    Ok(aligned.mapv(|v| v as f32))
}
