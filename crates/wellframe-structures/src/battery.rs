use crate::error::{Result, WellframeError};
use crate::run::RunId;
use ndarray::Array1;
use tracing::warn;

/// Empirical boundaries of one run's stimulus program, taken from the
/// first and last timestamps of the stimulus clock.
///
/// Computed on demand and owned transiently by whoever needs it; never
/// persisted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryWindow {
    pub run: RunId,
    pub start_ms: i64,
    pub end_ms: i64,
}

impl BatteryWindow {
    pub fn from_stimulus_millis(run: RunId, millis: &Array1<i64>) -> Result<BatteryWindow> {
        let (first, last) = match (millis.first(), millis.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Err(WellframeError::EmptyCollection(format!(
                    "stimulus clock for {run} has no timestamps"
                )))
            }
        };
        Ok(BatteryWindow {
            run,
            start_ms: first,
            end_ms: last,
        })
    }

    pub fn n_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

/// A composite sensor with a time component: a millisecond clock paired
/// 1:1 with a value sequence, plus the battery window of its run.
///
/// The equal-length invariant is checked at construction; a violation is
/// logged as an integrity warning but not repaired here.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDepSensor {
    pub run: RunId,
    pub millis: Array1<i64>,
    pub values: Array1<f64>,
    pub window: BatteryWindow,
    /// Samples per second for evenly-sampled signals (audio); None when
    /// the sampling cadence is hardware-jittered
    pub samples_per_sec: Option<f64>,
}

impl TimeDepSensor {
    pub fn new(
        run: RunId,
        millis: Array1<i64>,
        values: Array1<f64>,
        window: BatteryWindow,
        samples_per_sec: Option<f64>,
    ) -> TimeDepSensor {
        if millis.len() != values.len() {
            warn!(
                "millis length {} but data length {} for {}",
                millis.len(),
                values.len(),
                run
            );
        }
        TimeDepSensor {
            run,
            millis,
            values,
            window,
            samples_per_sec,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Restricts the series to the battery window, keeping timestamps in
    /// `[window.start_ms, window.end_ms]`. Returns a trimmed copy.
    ///
    /// Assumes the clock is sorted, as hardware clocks are.
    pub fn slice_to_window(&self) -> TimeDepSensor {
        let n = self.millis.len().min(self.values.len());
        let lo = partition_point(&self.millis, n, |m| m < self.window.start_ms);
        let hi = partition_point(&self.millis, n, |m| m <= self.window.end_ms).max(lo);
        TimeDepSensor {
            run: self.run,
            millis: self.millis.slice(ndarray::s![lo..hi]).to_owned(),
            values: self.values.slice(ndarray::s![lo..hi]).to_owned(),
            window: self.window,
            samples_per_sec: self.samples_per_sec,
        }
    }
}

/// First index in `millis[..n]` for which `pred` is false, assuming the
/// clock is partitioned by `pred` (sorted input).
fn partition_point<F: Fn(i64) -> bool>(millis: &Array1<i64>, n: usize, pred: F) -> usize {
    let (mut lo, mut hi) = (0usize, n);
    while lo < hi {
        let mid = (lo + hi) / 2;
        if pred(millis[mid]) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// A bare timing series: the millisecond clock of one sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingSensor {
    pub run: RunId,
    pub millis: Array1<i64>,
}

impl TimingSensor {
    pub fn start_ms(&self) -> Option<i64> {
        self.millis.first().copied()
    }

    pub fn end_ms(&self) -> Option<i64> {
        self.millis.last().copied()
    }

    pub fn len(&self) -> usize {
        self.millis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.millis.is_empty()
    }
}

/// An audio waveform: evenly-sampled amplitudes at a known rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub run: RunId,
    pub data: Array1<f64>,
    pub sampling_hz: f64,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

impl Waveform {
    pub fn n_ms(&self) -> f64 {
        self.data.len() as f64 / self.sampling_hz * 1000.0
    }

    /// Downsamples by splitting the data into discrete chunks and taking
    /// the mean of each chunk.
    pub fn downsample(&self, new_sampling_hz: f64) -> Result<Waveform> {
        if new_sampling_hz > self.sampling_hz {
            return Err(WellframeError::ContradictoryRequest(format!(
                "new sampling rate {} is higher than current {}",
                new_sampling_hz, self.sampling_hz
            )));
        }
        let chunk = (self.sampling_hz / new_sampling_hz) as usize;
        if chunk == 0 || self.data.is_empty() {
            return Ok(self.clone());
        }
        let means: Vec<f64> = (0..self.data.len())
            .step_by(chunk)
            .map(|start| {
                let end = (start + chunk).min(self.data.len());
                let group = self.data.slice(ndarray::s![start..end]);
                group.sum() / group.len() as f64
            })
            .collect();
        Ok(Waveform {
            run: self.run,
            data: Array1::from(means),
            sampling_hz: new_sampling_hz,
            minimum: self.minimum,
            maximum: self.maximum,
        })
    }

    /// Rescales amplitudes linearly into `[minimum, maximum]`.
    pub fn normalize(&self, minimum: f64, maximum: f64) -> Waveform {
        let lo = self.data.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = hi - lo;
        let data = if span == 0.0 || !span.is_finite() {
            Array1::from_elem(self.data.len(), minimum)
        } else {
            self.data.mapv(|y| (y - lo) * (maximum - minimum) / span + minimum)
        };
        Waveform {
            run: self.run,
            data,
            sampling_hz: self.sampling_hz,
            minimum: Some(minimum),
            maximum: Some(maximum),
        }
    }
}
