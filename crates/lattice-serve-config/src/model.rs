//! Per-model specification and decode parameters

use serde::{Deserialize, Serialize};

/// Specification of one deployed model
///
/// A model is identified by its `(name, language_code)` pair; `path` points
/// at the model directory holding the decode graph, weights, symbol table
/// and feature configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model name (e.g. "general")
    pub name: String,

    /// Language code (e.g. "en", "hi")
    pub language_code: String,

    /// Model directory path
    pub path: String,

    /// Number of pre-built decoder sessions for this model
    ///
    /// This is the fixed pool capacity: callers beyond this count block on
    /// acquire until a session is released.
    #[serde(default = "default_n_decoders")]
    pub n_decoders: usize,

    /// Decode parameters
    #[serde(default)]
    pub decode: DecodeParams,
}

impl ModelSpec {
    /// Registry key for this spec
    pub fn id(&self) -> (String, String) {
        (self.name.clone(), self.language_code.clone())
    }
}

/// Tunable decode parameters shared by all sessions of one model
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecodeParams {
    /// Search beam width
    #[serde(default = "default_beam")]
    pub beam: f32,

    /// Maximum active search states
    #[serde(default = "default_max_active")]
    pub max_active: usize,

    /// Minimum active search states
    #[serde(default = "default_min_active")]
    pub min_active: usize,

    /// Lattice generation beam
    #[serde(default = "default_lattice_beam")]
    pub lattice_beam: f32,

    /// Acoustic scale applied during decoding (and word-level rescoring)
    #[serde(default = "default_acoustic_scale")]
    pub acoustic_scale: f32,

    /// Frame subsampling factor of the acoustic model
    #[serde(default = "default_frame_subsampling_factor")]
    pub frame_subsampling_factor: u32,

    /// Silence weight for adaptation-state updates
    ///
    /// 1.0 disables silence re-weighting.
    #[serde(default = "default_silence_weight")]
    pub silence_weight: f32,
}

fn default_n_decoders() -> usize {
    1
}
fn default_beam() -> f32 {
    13.0
}
fn default_max_active() -> usize {
    7000
}
fn default_min_active() -> usize {
    200
}
fn default_lattice_beam() -> f32 {
    6.0
}
fn default_acoustic_scale() -> f32 {
    1.0
}
fn default_frame_subsampling_factor() -> u32 {
    3
}
fn default_silence_weight() -> f32 {
    1.0
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            beam: default_beam(),
            max_active: default_max_active(),
            min_active: default_min_active(),
            lattice_beam: default_lattice_beam(),
            acoustic_scale: default_acoustic_scale(),
            frame_subsampling_factor: default_frame_subsampling_factor(),
            silence_weight: default_silence_weight(),
        }
    }
}

impl DecodeParams {
    /// Whether silence re-weighting of adaptation updates is enabled
    pub fn silence_weighting_enabled(&self) -> bool {
        self.silence_weight != 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_params_defaults() {
        let params = DecodeParams::default();
        assert_eq!(params.beam, 13.0);
        assert_eq!(params.max_active, 7000);
        assert_eq!(params.min_active, 200);
        assert_eq!(params.frame_subsampling_factor, 3);
        assert!(!params.silence_weighting_enabled());
    }

    #[test]
    fn test_silence_weighting_gate() {
        let params = DecodeParams {
            silence_weight: 0.001,
            ..DecodeParams::default()
        };
        assert!(params.silence_weighting_enabled());
    }

    #[test]
    fn test_model_spec_id() {
        let spec = ModelSpec {
            name: "general".to_string(),
            language_code: "en".to_string(),
            path: "models/general-en".to_string(),
            n_decoders: 4,
            decode: DecodeParams::default(),
        };
        assert_eq!(spec.id(), ("general".to_string(), "en".to_string()));
    }
}
