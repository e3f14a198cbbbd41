//! The sensor dependency cache.
//!
//! A requested sensor kind is resolved by first materializing every raw
//! component it depends on, depth-first, then decoding or assembling the
//! kind itself. Each entry lives at a deterministic path under
//! `{root}/sensors/{run}/`; the file's existence is the only cache
//! index. Failures while resolving a component leave already-written
//! siblings in place and the composite absent; there is no rollback.

use crate::raw_store::RawStore;
use crate::store::{CacheStore, LocalDiskStore};
use image::DynamicImage;
use ndarray::Array1;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use wellframe_serialization::{
    decode_wire, read_array, read_time_dep, read_waveform, write_array, write_time_dep,
    write_waveform, ArrayData, WireValue,
};
use wellframe_structures::{
    BatteryWindow, FormatClass, Result, RunId, SensorKind, SensorKindRegistry, TimeDepSensor,
    TimingSensor, Waveform, WellframeError, WireFormat,
};

/// Each entry of a microphone millis blob covers one hardware buffer of
/// this many audio samples.
const SAMPLES_PER_MILLIS_TICK: usize = 1024;

/// Sampling rate of the raw microphone recording.
const MICROPHONE_SAMPLE_RATE: f64 = 44100.0;

/// A decoded cache entry, discriminated the same way kinds are.
#[derive(Debug, Clone)]
pub enum SensorValue {
    /// A raw numeric or timing series
    Raw(ArrayData),
    /// A raw verbatim blob (compressed audio)
    RawBytes(Vec<u8>),
    /// A decoded still image
    Image(DynamicImage),
    /// A composite timing series
    Timing(TimingSensor),
    /// A composite time-dependent sensor, trimmed to its battery window
    TimeDep(TimeDepSensor),
    /// The downsampled, normalized microphone waveform
    Waveform(Waveform),
}

/// A per-key failure from a batch download.
pub type FailedSensorKey = (SensorKind, RunId, WellframeError);

/// A cache for sensor data from given runs.
pub struct SensorCache<R: RawStore> {
    cache_dir: PathBuf,
    store: Box<dyn CacheStore>,
    raw: Arc<R>,
    waveform_hz: f64,
    registry: SensorKindRegistry,
}

impl<R: RawStore> SensorCache<R> {
    /// Creates a cache rooted at `{cache_root}/sensors`, validating the
    /// sensor-kind registry up front.
    pub fn new(cache_root: &Path, raw: Arc<R>) -> Result<SensorCache<R>> {
        let registry = SensorKindRegistry::new()?;
        Ok(SensorCache {
            cache_dir: cache_root.join("sensors"),
            store: Box::new(LocalDiskStore),
            raw,
            waveform_hz: 1000.0,
            registry,
        })
    }

    /// Replaces the backing byte store (for alternative storage layers).
    pub fn with_store(mut self, store: Box<dyn CacheStore>) -> SensorCache<R> {
        self.store = store;
        self
    }

    /// Target rate for the microphone waveform rendering.
    pub fn with_waveform_hz(mut self, hz: f64) -> SensorCache<R> {
        self.waveform_hz = hz;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn raw_store(&self) -> &Arc<R> {
        &self.raw
    }

    pub fn registry(&self) -> &SensorKindRegistry {
        &self.registry
    }

    /// The unique path for a key. Pure: two keys never collide and one
    /// key never maps to two paths.
    pub fn path_of(&self, kind: SensorKind, run: RunId) -> PathBuf {
        self.cache_dir.join(run.0.to_string()).join(format!(
            "{}.{}",
            kind.file_name(),
            kind.format_class().extension()
        ))
    }

    /// Inverse of [`Self::path_of`], for directory scans.
    pub fn key_from_path(&self, path: &Path) -> Option<(SensorKind, RunId)> {
        let run: RunId = RunId(path.parent()?.file_name()?.to_str()?.parse().ok()?);
        let kind = SensorKind::from_file_name(path.file_stem()?.to_str()?)?;
        Some((kind, run))
    }

    pub fn contains(&self, kind: SensorKind, run: RunId) -> bool {
        self.store.exists(&self.path_of(kind, run))
    }

    /// Every key currently cached, by directory scan. Irrelevant files
    /// are skipped.
    pub fn contents(&self) -> Vec<(SensorKind, RunId)> {
        let mut keys = Vec::new();
        let run_dirs = match std::fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(_) => return keys,
        };
        for run_dir in run_dirs.flatten() {
            if let Ok(files) = std::fs::read_dir(run_dir.path()) {
                for file in files.flatten() {
                    if let Some(key) = self.key_from_path(&file.path()) {
                        keys.push(key);
                    }
                }
            }
        }
        keys.sort();
        keys
    }

    pub fn delete(&self, kind: SensorKind, run: RunId) -> Result<()> {
        self.store.delete(&self.path_of(kind, run))
    }

    /// Materializes every key not already cached, components first.
    ///
    /// Per-key failures are collected rather than aborting the batch;
    /// the caller must inspect the returned list.
    pub fn download(&self, keys: &BTreeSet<(SensorKind, RunId)>) -> Result<Vec<FailedSensorKey>> {
        if keys.is_empty() {
            return Err(WellframeError::EmptyCollection(
                "no sensor keys requested".into(),
            ));
        }
        let mut failures = Vec::new();
        for (kind, run) in keys {
            if let Err(e) = self.ensure(*kind, *run) {
                tracing::error!("failed to cache {} for {}: {}", kind, run, e);
                failures.push((*kind, *run, e));
            }
        }
        Ok(failures)
    }

    /// Materializes a single key (and its components) and returns the
    /// decoded on-disk value. Never returns partially-resolved data.
    pub fn load(&self, kind: SensorKind, run: RunId) -> Result<SensorValue> {
        self.ensure(kind, run)?;
        let bytes = self.store.read(&self.path_of(kind, run))?;
        let value = match kind.format_class() {
            FormatClass::Image => SensorValue::Image(decode_image(kind, &bytes)?),
            FormatClass::AudioWaveform => SensorValue::Waveform(read_waveform(&bytes)?),
            FormatClass::AudioComposite => {
                if kind.is_raw() {
                    SensorValue::RawBytes(bytes)
                } else {
                    SensorValue::TimeDep(read_time_dep(&bytes)?)
                }
            }
            FormatClass::Timing => {
                let millis = read_array(&bytes)?.as_i64()?.clone();
                if kind.is_raw() {
                    SensorValue::Raw(ArrayData::I64(millis))
                } else {
                    SensorValue::Timing(TimingSensor { run, millis })
                }
            }
            FormatClass::RawNumeric => {
                if kind.is_raw() {
                    SensorValue::Raw(read_array(&bytes)?)
                } else {
                    SensorValue::TimeDep(read_time_dep(&bytes)?)
                }
            }
        };
        Ok(value)
    }

    /// The empirical stimulus-program boundaries of a run.
    pub fn battery_window(&self, run: RunId) -> Result<BatteryWindow> {
        let millis = self.load_raw_millis(SensorKind::RawStimulusMillis, run)?;
        BatteryWindow::from_stimulus_millis(run, &millis)
    }

    /// Loads a raw timing kind as a bare i64 series.
    pub fn load_raw_millis(&self, kind: SensorKind, run: RunId) -> Result<Array1<i64>> {
        if !kind.is_raw() || kind.format_class() != FormatClass::Timing {
            return Err(WellframeError::UnsupportedOperation(format!(
                "{kind} is not a raw timing kind"
            )));
        }
        self.ensure(kind, run)?;
        let bytes = self.store.read(&self.path_of(kind, run))?;
        Ok(read_array(&bytes)?.as_i64()?.clone())
    }

    pub fn load_photosensor(&self, run: RunId) -> Result<TimeDepSensor> {
        self.load_time_dep(SensorKind::Photosensor, run)
    }

    pub fn load_thermosensor(&self, run: RunId) -> Result<TimeDepSensor> {
        self.load_time_dep(SensorKind::Thermosensor, run)
    }

    pub fn load_microphone(&self, run: RunId) -> Result<TimeDepSensor> {
        self.load_time_dep(SensorKind::Microphone, run)
    }

    pub fn load_waveform(&self, run: RunId) -> Result<Waveform> {
        match self.load(SensorKind::MicrophoneWaveform, run)? {
            SensorValue::Waveform(waveform) => Ok(waveform),
            _ => Err(WellframeError::Integrity(
                "waveform entry decoded to a non-waveform value".into(),
            )),
        }
    }

    pub fn load_preview_frame(&self, run: RunId) -> Result<DynamicImage> {
        self.load_image(SensorKind::PreviewFrame, run)
    }

    pub fn load_secondary_camera(&self, run: RunId) -> Result<DynamicImage> {
        self.load_image(SensorKind::SecondaryCamera, run)
    }

    fn load_time_dep(&self, kind: SensorKind, run: RunId) -> Result<TimeDepSensor> {
        match self.load(kind, run)? {
            SensorValue::TimeDep(sensor) => Ok(sensor),
            _ => Err(WellframeError::Integrity(format!(
                "{kind} entry decoded to a non-time-dependent value"
            ))),
        }
    }

    fn load_image(&self, kind: SensorKind, run: RunId) -> Result<DynamicImage> {
        match self.load(kind, run)? {
            SensorValue::Image(img) => Ok(img),
            _ => Err(WellframeError::Integrity(format!(
                "{kind} entry decoded to a non-image value"
            ))),
        }
    }

    //region Resolution

    /// Materializes one key if absent: components first, then the key.
    fn ensure(&self, kind: SensorKind, run: RunId) -> Result<()> {
        if self.contains(kind, run) {
            debug!("{} for {} already cached", kind, run);
            return Ok(());
        }
        for component in kind.components() {
            debug!("resolving component {} of {} for {}", component, kind, run);
            self.ensure(*component, run)?;
        }
        if kind.is_raw() {
            self.fetch_raw_entry(kind, run)
        } else {
            self.assemble(kind, run)
        }
    }

    /// Fetches, decodes, and persists one raw kind.
    fn fetch_raw_entry(&self, kind: SensorKind, run: RunId) -> Result<()> {
        debug!("downloading {} for {} from the raw store", kind, run);
        let blob = self
            .raw
            .fetch_raw(kind, run)
            .ok_or_else(|| WellframeError::Lookup(format!("sensor {kind} on {run}")))?;
        let format = kind.wire_format().ok_or_else(|| {
            WellframeError::UnsupportedOperation(format!("{kind} has no wire format"))
        })?;
        let decoded = decode_wire(format, &blob)?;
        let path = self.path_of(kind, run);
        match (kind.format_class(), decoded) {
            (FormatClass::Image, WireValue::Bytes(bytes)) => {
                // Decode now so a corrupt blob fails here, then persist
                // the re-encoded form
                let img = image::load_from_memory(&bytes).map_err(|e| {
                    WellframeError::Integrity(format!("undecodable image blob for {kind}: {e}"))
                })?;
                self.store.write(&path, &encode_jpeg(&img)?)
            }
            (FormatClass::AudioComposite, WireValue::Bytes(bytes)) => {
                self.store.write(&path, &bytes)
            }
            (FormatClass::Timing | FormatClass::RawNumeric, WireValue::Ints(ints)) => {
                self.store.write(&path, &write_array(&ArrayData::I64(ints)))
            }
            (FormatClass::Timing | FormatClass::RawNumeric, WireValue::Floats(floats)) => {
                self.store.write(&path, &write_array(&ArrayData::F64(floats)))
            }
            (class, value) => Err(WellframeError::Integrity(format!(
                "blob for {kind} decoded to an unexpected shape for {class:?}: {} entries",
                value.len()
            ))),
        }
    }

    /// Assembles one composite kind from its (already cached) components.
    fn assemble(&self, kind: SensorKind, run: RunId) -> Result<()> {
        let path = self.path_of(kind, run);
        match kind {
            SensorKind::Photosensor | SensorKind::Thermosensor => {
                let sensor = self.assemble_time_dep(kind, run)?;
                self.store.write(&path, &write_time_dep(&sensor))
            }
            SensorKind::Microphone => {
                let sensor = self.assemble_audio(run)?;
                self.store.write(&path, &write_time_dep(&sensor))
            }
            SensorKind::MicrophoneWaveform => {
                let waveform = self.assemble_waveform(run)?;
                self.store.write(&path, &write_waveform(&waveform))
            }
            SensorKind::StimulusTimes | SensorKind::CameraTimes => {
                let millis_kind = kind.millis_component().ok_or_else(|| {
                    WellframeError::UnsupportedOperation(format!("{kind} has no millis component"))
                })?;
                let millis = self.read_component_i64(millis_kind, run)?;
                self.store.write(&path, &write_array(&ArrayData::I64(millis)))
            }
            SensorKind::SecondaryCamera | SensorKind::PreviewFrame => {
                let bytes_kind = kind.raw_bytes_component().ok_or_else(|| {
                    WellframeError::UnsupportedOperation(format!("{kind} has no bytes component"))
                })?;
                // The raw entry already holds the re-encoded image
                let bytes = self.store.read(&self.path_of(bytes_kind, run))?;
                self.store.write(&path, &bytes)
            }
            other => Err(WellframeError::UnsupportedOperation(format!(
                "sensor of kind {other} cannot be assembled"
            ))),
        }
    }

    fn assemble_time_dep(&self, kind: SensorKind, run: RunId) -> Result<TimeDepSensor> {
        let millis_kind = kind.millis_component().ok_or_else(|| {
            WellframeError::UnsupportedOperation(format!("{kind} has no millis component"))
        })?;
        let values_kind = kind.values_component().ok_or_else(|| {
            WellframeError::UnsupportedOperation(format!("{kind} has no values component"))
        })?;
        let millis = self.read_component_i64(millis_kind, run)?;
        let values = self.read_component_f64(values_kind, run)?;
        let window = self.battery_window(run)?;
        let sensor = TimeDepSensor::new(run, millis, values, window, None);
        Ok(sensor.slice_to_window())
    }

    fn assemble_audio(&self, run: RunId) -> Result<TimeDepSensor> {
        let ticks = self.read_component_i64(SensorKind::RawMicrophoneMillis, run)?;
        // Each logged milli covers one hardware buffer of samples
        let mut millis = Vec::with_capacity(ticks.len() * SAMPLES_PER_MILLIS_TICK);
        for tick in &ticks {
            millis.extend(std::iter::repeat(*tick).take(SAMPLES_PER_MILLIS_TICK));
        }
        let recording = self
            .store
            .read(&self.path_of(SensorKind::RawMicrophoneRecording, run))?;
        let samples = decode_wire(WireFormat::SignedShortBe, &recording)?.to_floats()?;
        let window = self.battery_window(run)?;
        debug!("trimming the microphone recording for {}", run);
        let sensor = TimeDepSensor::new(
            run,
            Array1::from(millis),
            samples,
            window,
            Some(MICROPHONE_SAMPLE_RATE),
        );
        Ok(sensor.slice_to_window())
    }

    fn assemble_waveform(&self, run: RunId) -> Result<Waveform> {
        let mic = self.load_microphone(run)?;
        debug!("making the waveform for the microphone recording of {}", run);
        let waveform = Waveform {
            run,
            data: mic.values,
            sampling_hz: mic.samples_per_sec.unwrap_or(MICROPHONE_SAMPLE_RATE),
            minimum: None,
            maximum: None,
        };
        Ok(waveform.downsample(self.waveform_hz)?.normalize(-1.0, 1.0))
    }

    fn read_component_i64(&self, kind: SensorKind, run: RunId) -> Result<Array1<i64>> {
        let bytes = self.store.read(&self.path_of(kind, run))?;
        Ok(read_array(&bytes)?.as_i64()?.clone())
    }

    fn read_component_f64(&self, kind: SensorKind, run: RunId) -> Result<Array1<f64>> {
        let bytes = self.store.read(&self.path_of(kind, run))?;
        Ok(read_array(&bytes)?.to_f64())
    }

    //endregion
}

fn decode_image(kind: SensorKind, bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| {
        WellframeError::Integrity(format!("undecodable cached image for {kind}: {e}"))
    })
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    // JPEG has no alpha; flatten first
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .map_err(|e| WellframeError::Integrity(format!("could not re-encode image: {e}")))?;
    Ok(out)
}
