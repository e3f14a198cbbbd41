//! Resampling of frame-indexed features onto the ideal-framerate
//! timeline of one battery.
//!
//! Camera timestamps are set by the hardware and jitter around the
//! declared framerate; stimulus timestamps come from an independent
//! clock. Alignment produces an array sampled exactly at the ideal
//! framerate, covering the battery from its empirical start to its
//! declared stop.
//!
//! The interpolation rule is a zero-order hold: a feature value is the
//! state of the well between two captures, not a continuous signal, so
//! blending adjacent samples would manufacture values that never
//! occurred.

use ndarray::Array1;
use tracing::debug;
use wellframe_structures::{FeatureType, Result, WellframeError};

/// Tunable policies of [`align_frames`].
#[derive(Debug, Clone, Copy)]
pub struct AlignmentSettings {
    /// Fail on recoverable problems instead of repairing them
    pub stringent: bool,
    /// Allowed |n_timestamps - n_features| before alignment refuses,
    /// as a multiple of the ideal step in ms. Ignored when stringent.
    pub mismatch_tolerance_frames: f64,
    /// Clock drift that triggers the drift policy, in ideal frames
    pub drift_frames: f64,
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        AlignmentSettings {
            stringent: false,
            mismatch_tolerance_frames: 100.0,
            drift_frames: 2.0,
        }
    }
}

impl AlignmentSettings {
    pub fn stringent() -> AlignmentSettings {
        AlignmentSettings {
            stringent: true,
            ..AlignmentSettings::default()
        }
    }
}

/// Resamples `feature_values` onto the ideal-framerate timeline bounded
/// by the empirical battery start and the declared battery stop.
///
/// Pure and deterministic: no I/O, no caching, identical inputs give
/// identical outputs.
///
/// * `feature_values` — one value per captured frame
/// * `frame_timestamps_ms` — capture time of each frame, same clock as
///   the stimulus timestamps
/// * `stim_timestamps_ms` — the stimulus clock; its first and last
///   entries define the empirical battery window
/// * `ideal_framerate` — frames per second from the hardware config
/// * `declared_battery_length_ms` — the battery length the protocol
///   declares, which bounds the output regardless of clock drift
///
/// Output length is always `ceil(declared_length / step)` for the ideal
/// step `1000 / ideal_framerate`. Timestamps outside the known range
/// hold the nearest edge value rather than failing.
pub fn align_frames(
    feature: FeatureType,
    feature_values: &Array1<f64>,
    frame_timestamps_ms: &Array1<f64>,
    stim_timestamps_ms: &Array1<i64>,
    ideal_framerate: f64,
    declared_battery_length_ms: i64,
    settings: &AlignmentSettings,
) -> Result<Array1<f64>> {
    if !(ideal_framerate > 0.0) {
        return Err(WellframeError::ContradictoryRequest(format!(
            "ideal framerate must be positive, got {ideal_framerate}"
        )));
    }
    let (battery_start_ms, battery_stop_ms_actual) =
        match (stim_timestamps_ms.first(), stim_timestamps_ms.last()) {
            (Some(first), Some(last)) => (*first as f64, *last as f64),
            _ => {
                return Err(WellframeError::EmptyCollection(
                    "stimulus clock has no timestamps".into(),
                ))
            }
        };
    let step_ms = 1000.0 / ideal_framerate;
    let expected_stop_ms = battery_start_ms + declared_battery_length_ms as f64;

    // The stimulus clock and the declared battery length disagreeing by
    // two or more frames means one of the clocks drifted.
    if (battery_stop_ms_actual - expected_stop_ms).abs() >= settings.drift_frames * step_ms {
        let msg = format!(
            "recorded stop time {} but start + battery length = {} + {} = {} (diff {}ms)",
            battery_stop_ms_actual,
            battery_start_ms,
            declared_battery_length_ms,
            expected_stop_ms,
            battery_stop_ms_actual - expected_stop_ms,
        );
        if settings.stringent {
            return Err(WellframeError::RefusingRequest(msg));
        }
        debug!("{msg}");
    }

    let frames_ms: Vec<f64> = frame_timestamps_ms
        .iter()
        .copied()
        .filter(|t| *t >= battery_start_ms && *t <= expected_stop_ms)
        .collect();
    let n_ideal = ((expected_stop_ms - battery_start_ms) / step_ms).ceil().max(0.0) as usize;

    let mismatch = frames_ms.len().abs_diff(feature_values.len());
    let tolerance = if settings.stringent {
        0.0
    } else {
        settings.mismatch_tolerance_frames * step_ms
    };
    if mismatch as f64 > tolerance {
        return Err(WellframeError::AlignmentMismatch {
            feature: feature.internal_name(),
            n_features: feature_values.len(),
            n_timestamps: frames_ms.len(),
            n_ideal,
        });
    }
    // Off by a few: trim either to the shorter and carry on.
    let n = frames_ms.len().min(feature_values.len());
    let frames_ms = &frames_ms[..n];

    if n == 0 {
        return Err(WellframeError::Integrity(format!(
            "no frame timestamps fall within the battery window for {feature}"
        )));
    }

    // Zero-order hold over the ideal timeline; both sequences are
    // time-sorted so one forward sweep suffices.
    let mut out = Vec::with_capacity(n_ideal);
    let mut at = 0usize;
    for k in 0..n_ideal {
        let t = battery_start_ms + k as f64 * step_ms;
        while at + 1 < n && frames_ms[at + 1] <= t {
            at += 1;
        }
        let value = if t < frames_ms[0] {
            feature_values[0]
        } else {
            feature_values[at]
        };
        out.push(value);
    }
    Ok(Array1::from(out))
}
