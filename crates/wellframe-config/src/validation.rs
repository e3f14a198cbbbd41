// Copyright 2025 wellframe contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation.

use crate::{ConfigError, ConfigResult, WellframeConfig};

/// Checks that the numeric policies make sense before any cache is
/// built from them.
pub fn validate_config(config: &WellframeConfig) -> ConfigResult<()> {
    if config.cache.root.as_os_str().is_empty() {
        return Err(ConfigError::InvalidValue(
            "cache.root must not be empty".into(),
        ));
    }
    if config.alignment.mismatch_tolerance_frames < 0.0 {
        return Err(ConfigError::InvalidValue(format!(
            "alignment.mismatch_tolerance_frames must be >= 0, got {}",
            config.alignment.mismatch_tolerance_frames
        )));
    }
    if config.alignment.drift_frames < 0.0 {
        return Err(ConfigError::InvalidValue(format!(
            "alignment.drift_frames must be >= 0, got {}",
            config.alignment.drift_frames
        )));
    }
    if !(config.audio.waveform_hz > 0.0) {
        return Err(ConfigError::InvalidValue(format!(
            "audio.waveform_hz must be positive, got {}",
            config.audio.waveform_hz
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_tolerance_rejected() {
        let mut config = WellframeConfig::default();
        config.alignment.mismatch_tolerance_frames = -1.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_waveform_rate_rejected() {
        let mut config = WellframeConfig::default();
        config.audio.waveform_hz = 0.0;
        assert!(validate_config(&config).is_err());
    }
}
