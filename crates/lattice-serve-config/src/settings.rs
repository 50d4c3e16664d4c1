//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ModelSpec};

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Deployed models, one pool each
    #[serde(default)]
    pub models: Vec<ModelSpec>,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "models".to_string(),
                message: "at least one model must be configured".to_string(),
            });
        }

        for spec in &self.models {
            let field = format!("models.{}-{}", spec.name, spec.language_code);

            if spec.n_decoders == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("{field}.n_decoders"),
                    message: "decoder pool size must be at least 1".to_string(),
                });
            }
            if spec.decode.beam <= 0.0 || spec.decode.lattice_beam <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("{field}.decode"),
                    message: "beam widths must be positive".to_string(),
                });
            }
            if spec.decode.min_active > spec.decode.max_active {
                return Err(ConfigError::InvalidValue {
                    field: format!("{field}.decode"),
                    message: "min_active exceeds max_active".to_string(),
                });
            }
            if spec.decode.frame_subsampling_factor == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("{field}.decode.frame_subsampling_factor"),
                    message: "must be at least 1".to_string(),
                });
            }
            if !std::path::Path::new(&spec.path).exists() {
                // Warn only: model directories may be mounted after config load.
                tracing::warn!("Model directory not found: {} = {}", field, spec.path);
            }
        }

        Ok(())
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Emit per-stage decode timings at trace level
    #[serde(default)]
    pub stage_timings: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            stage_timings: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (LATTICE_SERVE prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("LATTICE_SERVE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
