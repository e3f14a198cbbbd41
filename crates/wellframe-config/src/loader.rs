// Copyright 2025 wellframe contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Two-tier loading: the TOML file provides base values, then
//! environment variables override individual fields.

use crate::{ConfigError, ConfigResult, WellframeConfig};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "wellframe.toml";
const CONFIG_PATH_VAR: &str = "WELLFRAME_CONFIG_PATH";

/// Find the wellframe configuration file.
///
/// Search order:
/// 1. `WELLFRAME_CONFIG_PATH` environment variable
/// 2. Current working directory: `./wellframe.toml`
/// 3. Ancestor directories, up to 5 levels
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_VAR) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "config file specified by {} not found: {}",
            CONFIG_PATH_VAR,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd;
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent.to_path_buf();
                }
                None => break,
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::FileNotFound(format!(
        "'{CONFIG_FILE_NAME}' not found in any of these locations:\n{search_list}\n\nSet {CONFIG_PATH_VAR} to specify a custom location."
    )))
}

/// Load configuration from a TOML file with environment overrides
/// applied.
///
/// # Arguments
///
/// * `config_path` - Optional path to the config file. If `None`, the
///   file is searched for; a missing file falls back to defaults.
pub fn load_config(config_path: Option<&Path>) -> ConfigResult<WellframeConfig> {
    let mut config = match config_path {
        Some(path) => parse_file(path)?,
        None => match find_config_file() {
            Ok(path) => parse_file(&path)?,
            Err(ConfigError::FileNotFound(_)) => WellframeConfig::default(),
            Err(e) => return Err(e),
        },
    };
    apply_environment_overrides(&mut config);
    crate::validate_config(&config)?;
    Ok(config)
}

fn parse_file(path: &Path) -> ConfigResult<WellframeConfig> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment variable overrides to a configuration.
///
/// Supported variables:
/// - `WELLFRAME_CACHE_ROOT` -> `cache.root`
/// - `WELLFRAME_STRINGENT` -> `alignment.stringent`
/// - `WELLFRAME_MISMATCH_TOLERANCE` -> `alignment.mismatch_tolerance_frames`
/// - `WELLFRAME_WAVEFORM_HZ` -> `audio.waveform_hz`
pub fn apply_environment_overrides(config: &mut WellframeConfig) {
    if let Ok(root) = env::var("WELLFRAME_CACHE_ROOT") {
        config.cache.root = PathBuf::from(root);
    }
    if let Ok(stringent) = env::var("WELLFRAME_STRINGENT") {
        if let Ok(value) = stringent.parse() {
            config.alignment.stringent = value;
        }
    }
    if let Ok(tolerance) = env::var("WELLFRAME_MISMATCH_TOLERANCE") {
        if let Ok(value) = tolerance.parse() {
            config.alignment.mismatch_tolerance_frames = value;
        }
    }
    if let Ok(hz) = env::var("WELLFRAME_WAVEFORM_HZ") {
        if let Ok(value) = hz.parse() {
            config.audio.waveform_hz = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[cache]\nroot = \"/data/wf\"").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.cache.root, PathBuf::from("/data/wf"));
        assert_eq!(config.alignment.drift_frames, 2.0);
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "cache = not toml").unwrap();
        assert!(matches!(
            load_config(Some(&path)).unwrap_err(),
            ConfigError::ParseError(_)
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[audio]\nwaveform_hz = -5.0").unwrap();
        assert!(matches!(
            load_config(Some(&path)).unwrap_err(),
            ConfigError::InvalidValue(_)
        ));
    }
}
