// Copyright 2025 wellframe contributors
// SPDX-License-Identifier: Apache-2.0

//! # wellframe configuration
//!
//! Type-safe configuration loader for the wellframe caches:
//! - TOML file parsing (`wellframe.toml`)
//! - Environment variable overrides
//! - Validation of the numeric policies
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wellframe_config::load_config;
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("cache root: {}", config.cache.root.display());
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_environment_overrides, find_config_file, load_config};
pub use types::*;
pub use validation::validate_config;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
