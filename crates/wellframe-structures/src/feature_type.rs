use crate::error::{Result, WellframeError};
use crate::run::HardwareGeneration;
use std::fmt;

/// The named per-well measurements wellframe can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureName {
    /// Motion index: summed inter-frame pixel difference
    Mi,
    /// Frame difference with a 10-frame lag
    Cd10,
}

impl FeatureName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureName::Mi => "MI",
            FeatureName::Cd10 => "cd(10)",
        }
    }
}

/// A named, per-well, possibly time-aligned derived measurement.
///
/// Two feature types are equal iff their (name, interpolated) pair
/// matches; the plain and interpolated flavors of one measurement cache
/// into separate directories and never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureType {
    name: FeatureName,
    interpolated: bool,
}

impl FeatureType {
    pub const MI: FeatureType = FeatureType {
        name: FeatureName::Mi,
        interpolated: false,
    };
    pub const CD_10: FeatureType = FeatureType {
        name: FeatureName::Cd10,
        interpolated: false,
    };
    pub const MI_I: FeatureType = FeatureType {
        name: FeatureName::Mi,
        interpolated: true,
    };
    pub const CD_10_I: FeatureType = FeatureType {
        name: FeatureName::Cd10,
        interpolated: true,
    };

    pub const KNOWN: [FeatureType; 4] = [
        FeatureType::MI,
        FeatureType::CD_10,
        FeatureType::MI_I,
        FeatureType::CD_10_I,
    ];

    /// Fetches a feature type from its internal name.
    pub fn of(internal_name: &str) -> Result<FeatureType> {
        FeatureType::KNOWN
            .into_iter()
            .find(|f| f.internal_name() == internal_name)
            .ok_or_else(|| WellframeError::Lookup(format!("feature {internal_name}")))
    }

    pub fn name(&self) -> FeatureName {
        self.name
    }

    /// Name used for cache directories and error messages; the
    /// interpolated flavor is suffixed so the two never collide.
    pub fn internal_name(&self) -> String {
        if self.interpolated {
            format!("{}-i", self.name.as_str())
        } else {
            self.name.as_str().to_string()
        }
    }

    /// Whether values correspond 1:1 to video frames.
    pub fn time_dependent(&self) -> bool {
        true
    }

    /// Bytes per value in the stored blob (big-endian f32).
    pub fn stride_bytes(&self) -> usize {
        4
    }

    /// Whether the feature is resampled onto the ideal-framerate timeline.
    pub fn is_interpolated(&self) -> bool {
        self.interpolated
    }

    /// Generations of video data this feature applies to. Interpolation
    /// needs image-sensor-resolved timestamps, so the interpolated
    /// flavors are limited to the Pointgrey generations.
    pub fn applicable_generations(&self) -> &'static [HardwareGeneration] {
        if self.interpolated {
            HardwareGeneration::pointgrey()
        } else {
            HardwareGeneration::all()
        }
    }

    pub fn applies_to(&self, generation: HardwareGeneration) -> bool {
        self.applicable_generations().contains(&generation)
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.internal_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_names_are_distinct() {
        let names: std::collections::BTreeSet<String> = FeatureType::KNOWN
            .iter()
            .map(|f| f.internal_name())
            .collect();
        assert_eq!(names.len(), FeatureType::KNOWN.len());
    }

    #[test]
    fn test_of_round_trips() {
        for feature in FeatureType::KNOWN {
            assert_eq!(FeatureType::of(&feature.internal_name()).unwrap(), feature);
        }
        assert!(FeatureType::of("nope").is_err());
    }

    #[test]
    fn test_equality_is_name_and_flavor() {
        assert_ne!(FeatureType::MI, FeatureType::MI_I);
        assert_eq!(FeatureType::of("MI-i").unwrap(), FeatureType::MI_I);
    }

    #[test]
    fn test_interpolated_needs_pointgrey() {
        assert!(FeatureType::MI.applies_to(HardwareGeneration::Pike));
        assert!(!FeatureType::MI_I.applies_to(HardwareGeneration::Pike));
        assert!(FeatureType::MI_I.applies_to(HardwareGeneration::Pointgrey));
    }
}
