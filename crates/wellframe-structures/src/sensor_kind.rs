use crate::error::{Result, WellframeError};

/// Broad classification of a sensor's decoded representation, which also
/// selects its on-disk file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatClass {
    /// A still image (webcam shot, plate preview)
    Image,
    /// Trimmed audio samples paired with a millisecond clock
    AudioComposite,
    /// A downsampled, normalized rendering of an audio recording
    AudioWaveform,
    /// A bare millisecond clock
    Timing,
    /// A numeric array with no further structure
    RawNumeric,
}

impl FormatClass {
    /// File extension used for cache entries of this class.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatClass::Image => "jpg",
            FormatClass::AudioComposite => "flac",
            FormatClass::AudioWaveform => "wfm",
            FormatClass::Timing | FormatClass::RawNumeric => "arr",
        }
    }
}

/// Encoding of a raw sensor blob as stored by the acquisition hardware.
///
/// Multi-byte formats are big-endian on the wire. The "squashed" unsigned
/// byte is a legacy encoding that stores `unsigned - 128` in a signed byte;
/// decoding must widen before re-adding the bias to avoid overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    SignedByte,
    SquashedUnsignedByte,
    SignedShortBe,
    UnsignedShortBe,
    SignedIntBe,
    UnsignedIntBe,
    FloatBe,
    DoubleBe,
    /// Bytes passed through untouched (compressed audio, encoded images)
    Verbatim,
}

/// A category of recorded signal: either raw (backed directly by one stored
/// blob) or composite (assembled from raw components).
///
/// Every composite kind lists the raw kinds it needs in `components()`;
/// a `SensorCache` materializes those, in order, before the composite
/// itself. Time-dependent composites split into a millis component and a
/// values component; image and waveform kinds wrap a single bytes
/// component instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SensorKind {
    // Composite kinds
    Photosensor,
    Thermosensor,
    Microphone,
    MicrophoneWaveform,
    SecondaryCamera,
    PreviewFrame,
    StimulusTimes,
    CameraTimes,
    // Raw kinds
    RawPhotosensorMillis,
    RawPhotosensorValues,
    RawThermosensorMillis,
    RawThermosensorValues,
    RawMicrophoneRecording,
    RawMicrophoneMillis,
    RawCameraMillis,
    RawStimulusMillis,
    RawStimulusValues,
    RawStimulusIds,
    RawSecondaryCamera,
    RawPreviewFrame,
}

impl SensorKind {
    pub const ALL: [SensorKind; 20] = [
        SensorKind::Photosensor,
        SensorKind::Thermosensor,
        SensorKind::Microphone,
        SensorKind::MicrophoneWaveform,
        SensorKind::SecondaryCamera,
        SensorKind::PreviewFrame,
        SensorKind::StimulusTimes,
        SensorKind::CameraTimes,
        SensorKind::RawPhotosensorMillis,
        SensorKind::RawPhotosensorValues,
        SensorKind::RawThermosensorMillis,
        SensorKind::RawThermosensorValues,
        SensorKind::RawMicrophoneRecording,
        SensorKind::RawMicrophoneMillis,
        SensorKind::RawCameraMillis,
        SensorKind::RawStimulusMillis,
        SensorKind::RawStimulusValues,
        SensorKind::RawStimulusIds,
        SensorKind::RawSecondaryCamera,
        SensorKind::RawPreviewFrame,
    ];

    pub fn is_raw(&self) -> bool {
        self.components().is_empty()
    }

    pub fn is_composite(&self) -> bool {
        !self.is_raw()
    }

    /// The raw kinds this one requires, in materialization order.
    pub fn components(&self) -> &'static [SensorKind] {
        match self {
            SensorKind::MicrophoneWaveform => &[SensorKind::Microphone],
            SensorKind::Microphone => &[
                SensorKind::RawMicrophoneMillis,
                SensorKind::RawMicrophoneRecording,
                SensorKind::RawStimulusMillis,
            ],
            SensorKind::Photosensor => &[
                SensorKind::RawPhotosensorMillis,
                SensorKind::RawPhotosensorValues,
                SensorKind::RawStimulusMillis,
            ],
            SensorKind::Thermosensor => &[
                SensorKind::RawThermosensorMillis,
                SensorKind::RawThermosensorValues,
                SensorKind::RawStimulusMillis,
            ],
            SensorKind::StimulusTimes => &[
                SensorKind::RawStimulusIds,
                SensorKind::RawStimulusMillis,
                SensorKind::RawStimulusValues,
            ],
            SensorKind::CameraTimes => &[SensorKind::RawCameraMillis],
            SensorKind::PreviewFrame => &[SensorKind::RawPreviewFrame],
            SensorKind::SecondaryCamera => &[SensorKind::RawSecondaryCamera],
            _ => &[],
        }
    }

    pub fn format_class(&self) -> FormatClass {
        match self {
            SensorKind::SecondaryCamera
            | SensorKind::PreviewFrame
            | SensorKind::RawSecondaryCamera
            | SensorKind::RawPreviewFrame => FormatClass::Image,
            SensorKind::Microphone | SensorKind::RawMicrophoneRecording => {
                FormatClass::AudioComposite
            }
            SensorKind::MicrophoneWaveform => FormatClass::AudioWaveform,
            SensorKind::StimulusTimes
            | SensorKind::CameraTimes
            | SensorKind::RawPhotosensorMillis
            | SensorKind::RawThermosensorMillis
            | SensorKind::RawMicrophoneMillis
            | SensorKind::RawCameraMillis
            | SensorKind::RawStimulusMillis => FormatClass::Timing,
            _ => FormatClass::RawNumeric,
        }
    }

    /// The millis component of a composite time-dependent or timing kind.
    pub fn millis_component(&self) -> Option<SensorKind> {
        match self {
            SensorKind::Microphone => Some(SensorKind::RawMicrophoneMillis),
            SensorKind::Photosensor => Some(SensorKind::RawPhotosensorMillis),
            SensorKind::Thermosensor => Some(SensorKind::RawThermosensorMillis),
            SensorKind::StimulusTimes => Some(SensorKind::RawStimulusMillis),
            SensorKind::CameraTimes => Some(SensorKind::RawCameraMillis),
            _ => None,
        }
    }

    /// The values component of a composite time-dependent kind.
    pub fn values_component(&self) -> Option<SensorKind> {
        match self {
            SensorKind::Microphone => Some(SensorKind::RawMicrophoneRecording),
            SensorKind::Photosensor => Some(SensorKind::RawPhotosensorValues),
            SensorKind::Thermosensor => Some(SensorKind::RawThermosensorValues),
            SensorKind::StimulusTimes => Some(SensorKind::RawStimulusValues),
            _ => None,
        }
    }

    /// The single bytes-backed component of an image or waveform kind.
    pub fn raw_bytes_component(&self) -> Option<SensorKind> {
        match self {
            SensorKind::PreviewFrame => Some(SensorKind::RawPreviewFrame),
            SensorKind::SecondaryCamera => Some(SensorKind::RawSecondaryCamera),
            _ => None,
        }
    }

    /// True for composite kinds pairing equal-length millis and values
    /// vectors. Always false for raw kinds.
    pub fn is_time_dependent(&self) -> bool {
        matches!(
            self,
            SensorKind::Photosensor | SensorKind::Thermosensor | SensorKind::Microphone
        )
    }

    pub fn is_timing(&self) -> bool {
        matches!(self, SensorKind::StimulusTimes | SensorKind::CameraTimes)
    }

    pub fn is_image(&self) -> bool {
        self.format_class() == FormatClass::Image
    }

    /// The stored encoding of a raw kind's blob. None for composites.
    pub fn wire_format(&self) -> Option<WireFormat> {
        match self {
            SensorKind::RawPhotosensorMillis
            | SensorKind::RawThermosensorMillis
            | SensorKind::RawMicrophoneMillis
            | SensorKind::RawCameraMillis
            | SensorKind::RawStimulusMillis => Some(WireFormat::UnsignedIntBe),
            SensorKind::RawPhotosensorValues | SensorKind::RawStimulusValues => {
                Some(WireFormat::SquashedUnsignedByte)
            }
            SensorKind::RawThermosensorValues => Some(WireFormat::SignedShortBe),
            SensorKind::RawStimulusIds => Some(WireFormat::UnsignedShortBe),
            SensorKind::RawMicrophoneRecording
            | SensorKind::RawSecondaryCamera
            | SensorKind::RawPreviewFrame => Some(WireFormat::Verbatim),
            _ => None,
        }
    }

    /// Lowercase file stem used in cache paths.
    pub fn file_name(&self) -> &'static str {
        match self {
            SensorKind::Photosensor => "photosensor",
            SensorKind::Thermosensor => "thermosensor",
            SensorKind::Microphone => "microphone",
            SensorKind::MicrophoneWaveform => "microphone_waveform",
            SensorKind::SecondaryCamera => "secondary_camera",
            SensorKind::PreviewFrame => "preview_frame",
            SensorKind::StimulusTimes => "stimulus_times",
            SensorKind::CameraTimes => "camera_times",
            SensorKind::RawPhotosensorMillis => "raw_photosensor_millis",
            SensorKind::RawPhotosensorValues => "raw_photosensor_values",
            SensorKind::RawThermosensorMillis => "raw_thermosensor_millis",
            SensorKind::RawThermosensorValues => "raw_thermosensor_values",
            SensorKind::RawMicrophoneRecording => "raw_microphone_recording",
            SensorKind::RawMicrophoneMillis => "raw_microphone_millis",
            SensorKind::RawCameraMillis => "raw_camera_millis",
            SensorKind::RawStimulusMillis => "raw_stimulus_millis",
            SensorKind::RawStimulusValues => "raw_stimulus_values",
            SensorKind::RawStimulusIds => "raw_stimulus_ids",
            SensorKind::RawSecondaryCamera => "raw_secondary_camera",
            SensorKind::RawPreviewFrame => "raw_preview_frame",
        }
    }

    /// Inverse of [`SensorKind::file_name`].
    pub fn from_file_name(name: &str) -> Option<SensorKind> {
        SensorKind::ALL.iter().copied().find(|k| k.file_name() == name)
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// The validated sensor-kind table.
///
/// The kind set itself is closed (it is an enum), but the component lists
/// are data, so the registry proves once at construction that the
/// dependency graph is acyclic and no deeper than [`Self::MAX_DEPTH`],
/// and that raw kinds carry wire formats while composites do not.
#[derive(Debug, Clone, Copy)]
pub struct SensorKindRegistry(());

impl SensorKindRegistry {
    pub const MAX_DEPTH: usize = 3;

    pub fn new() -> Result<SensorKindRegistry> {
        for kind in SensorKind::ALL {
            Self::check_depth(kind, 0)?;
            if kind.is_raw() && kind.wire_format().is_none() {
                return Err(WellframeError::Integrity(format!(
                    "raw kind {} has no wire format",
                    kind
                )));
            }
            if kind.is_composite() && kind.wire_format().is_some() {
                return Err(WellframeError::Integrity(format!(
                    "composite kind {} claims a wire format",
                    kind
                )));
            }
        }
        Ok(SensorKindRegistry(()))
    }

    fn check_depth(kind: SensorKind, depth: usize) -> Result<()> {
        if depth > Self::MAX_DEPTH {
            return Err(WellframeError::Integrity(format!(
                "sensor dependency chain through {} exceeds depth {}",
                kind,
                Self::MAX_DEPTH
            )));
        }
        for component in kind.components() {
            if *component == kind {
                return Err(WellframeError::Integrity(format!(
                    "sensor kind {} depends on itself",
                    kind
                )));
            }
            Self::check_depth(*component, depth + 1)?;
        }
        Ok(())
    }

    pub fn all(&self) -> impl Iterator<Item = SensorKind> {
        SensorKind::ALL.into_iter()
    }

    pub fn raw_kinds(&self) -> impl Iterator<Item = SensorKind> {
        SensorKind::ALL.into_iter().filter(SensorKind::is_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_validates() {
        let registry = SensorKindRegistry::new().unwrap();
        assert_eq!(registry.all().count(), 20);
        assert_eq!(registry.raw_kinds().count(), 12);
    }

    #[test]
    fn test_raw_kinds_have_no_components() {
        for kind in SensorKind::ALL {
            assert_eq!(kind.is_raw(), kind.components().is_empty());
        }
    }

    #[test]
    fn test_waveform_depends_on_microphone() {
        assert_eq!(
            SensorKind::MicrophoneWaveform.components(),
            &[SensorKind::Microphone]
        );
        // The microphone itself reaches three raw kinds
        assert_eq!(SensorKind::Microphone.components().len(), 3);
    }

    #[test]
    fn test_time_dependent_kinds_split_cleanly() {
        for kind in SensorKind::ALL {
            if kind.is_time_dependent() {
                assert!(kind.millis_component().is_some(), "{kind}");
                assert!(kind.values_component().is_some(), "{kind}");
            }
            if kind.is_image() && kind.is_composite() {
                assert!(kind.raw_bytes_component().is_some(), "{kind}");
                assert!(kind.millis_component().is_none(), "{kind}");
            }
        }
    }

    #[test]
    fn test_file_name_round_trip() {
        for kind in SensorKind::ALL {
            assert_eq!(SensorKind::from_file_name(kind.file_name()), Some(kind));
        }
    }

    #[test]
    fn test_extension_by_class() {
        assert_eq!(SensorKind::PreviewFrame.format_class().extension(), "jpg");
        assert_eq!(SensorKind::Microphone.format_class().extension(), "flac");
        assert_eq!(
            SensorKind::RawMicrophoneRecording.format_class().extension(),
            "flac"
        );
        assert_eq!(
            SensorKind::MicrophoneWaveform.format_class().extension(),
            "wfm"
        );
        assert_eq!(SensorKind::Photosensor.format_class().extension(), "arr");
    }
}
