// Copyright 2025 wellframe contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete wellframe configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WellframeConfig {
    pub cache: CacheConfig,
    pub alignment: AlignmentConfig,
    pub audio: AudioConfig,
}

impl Default for WellframeConfig {
    fn default() -> Self {
        WellframeConfig {
            cache: CacheConfig::default(),
            alignment: AlignmentConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

/// Where cache entries live on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Root directory; sensors cache under `{root}/sensors`, well
    /// tables under `{root}/wells`
    pub root: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            root: PathBuf::from(".wellframe-cache"),
        }
    }
}

/// Policies of the frame-alignment algorithm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Fail on recoverable problems instead of repairing them
    pub stringent: bool,
    /// Allowed |timestamps - features| before alignment refuses, as a
    /// multiple of the ideal frame step. The historical default of 100
    /// is deliberately permissive; tighten it per deployment.
    pub mismatch_tolerance_frames: f64,
    /// Clock drift, in ideal frames, that triggers the drift policy
    pub drift_frames: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        AlignmentConfig {
            stringent: false,
            mismatch_tolerance_frames: 100.0,
            drift_frames: 2.0,
        }
    }
}

/// Audio rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Target rate for the cached microphone waveform, in Hz
    pub waveform_hz: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig { waveform_hz: 1000.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: WellframeConfig = toml::from_str(
            r#"
            [alignment]
            stringent = true
            "#,
        )
        .unwrap();
        assert!(config.alignment.stringent);
        assert_eq!(config.alignment.mismatch_tolerance_frames, 100.0);
        assert_eq!(config.audio.waveform_hz, 1000.0);
    }
}
