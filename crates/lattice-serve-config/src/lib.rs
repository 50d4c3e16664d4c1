//! Configuration management for the decoding service
//!
//! Supports loading configuration from:
//! - YAML/TOML files
//! - Environment variables (LATTICE_SERVE prefix)

pub mod model;
pub mod settings;

pub use model::{DecodeParams, ModelSpec};
pub use settings::{load_settings, Settings};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
