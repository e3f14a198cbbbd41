use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one execution of an experimental protocol on one plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Identifier of one experimental unit (plate position) within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WellId(pub u64);

impl fmt::Display for WellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Generation of acquisition hardware a run was recorded on.
///
/// Interpolated features require the frame-accurate timestamps that only
/// the Pointgrey cameras provide; older Pike hardware reports timestamps
/// too coarsely for per-frame alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareGeneration {
    LegacyPike,
    Pike,
    PointgreyAlpha,
    Pointgrey,
}

impl HardwareGeneration {
    pub fn all() -> &'static [HardwareGeneration] {
        &[
            HardwareGeneration::LegacyPike,
            HardwareGeneration::Pike,
            HardwareGeneration::PointgreyAlpha,
            HardwareGeneration::Pointgrey,
        ]
    }

    /// The generations with image-sensor-resolved frame timestamps.
    pub fn pointgrey() -> &'static [HardwareGeneration] {
        &[HardwareGeneration::PointgreyAlpha, HardwareGeneration::Pointgrey]
    }

    pub fn is_pointgrey(&self) -> bool {
        matches!(
            self,
            HardwareGeneration::PointgreyAlpha | HardwareGeneration::Pointgrey
        )
    }
}

impl fmt::Display for HardwareGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HardwareGeneration::LegacyPike => "legacy_pike",
            HardwareGeneration::Pike => "pike",
            HardwareGeneration::PointgreyAlpha => "pointgrey_alpha",
            HardwareGeneration::Pointgrey => "pointgrey",
        };
        write!(f, "{}", s)
    }
}

/// Metadata of one well, as reported by the raw store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellInfo {
    pub id: WellId,
    /// Zero-based position of the well on its plate, in row-major order
    pub index: u32,
    pub label: String,
}

/// Per-run metadata supplied by the raw store.
///
/// `battery_length_ms` is the declared length of the stimulus program;
/// the empirical length comes from the stimulus clock sensor instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run: RunId,
    pub wells: Vec<WellInfo>,
    pub generation: HardwareGeneration,
    pub battery_length_ms: i64,
    /// Frames per second declared in the camera hardware configuration
    pub ideal_framerate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_ids() {
        assert_eq!(RunId(17).to_string(), "r17");
        assert_eq!(WellId(4).to_string(), "w4");
    }

    #[test]
    fn test_pointgrey_generations() {
        assert!(HardwareGeneration::Pointgrey.is_pointgrey());
        assert!(!HardwareGeneration::Pike.is_pointgrey());
        assert_eq!(HardwareGeneration::pointgrey().len(), 2);
    }

    #[test]
    fn test_metadata_serde_round_trip() {
        let metadata = RunMetadata {
            run: RunId(5),
            wells: vec![WellInfo {
                id: WellId(50),
                index: 0,
                label: "A01".into(),
            }],
            generation: HardwareGeneration::Pointgrey,
            battery_length_ms: 5000,
            ideal_framerate: 100.0,
        };
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("\"pointgrey\""));
        let back: RunMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }
}
