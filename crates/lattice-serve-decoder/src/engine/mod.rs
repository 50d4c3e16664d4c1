//! Capability interface of the external decoding engine
//!
//! The session/pool/synthesis core never touches acoustic models, feature
//! extraction or WFST search directly; it drives them through these narrow
//! traits. Production deployments bind a real engine, tests bind
//! [`stub::StubEngine`].

pub mod stub;
mod symbols;

pub use symbols::SymbolTable;

use std::any::Any;
use std::sync::Arc;

use lattice_serve_config::DecodeParams;
use lattice_serve_core::error::{DecodeError, ModelError};

use crate::model::ModelLayout;

/// A (frame index, weight) pair used for adaptation re-weighting
pub type FrameWeight = (u32, f32);

/// One linear path recovered from an n-best extraction
#[derive(Debug, Clone)]
pub struct LinearPath {
    /// Output word symbol ids along the path
    pub word_ids: Vec<u32>,

    /// Language-model weight component of the path
    pub lm_score: f32,

    /// Acoustic weight component of the path
    pub am_score: f32,
}

/// One word of a minimum-Bayes-risk one-best sequence
#[derive(Debug, Clone, Copy)]
pub struct MbrWord {
    /// Word symbol id
    pub word_id: u32,

    /// Per-word confidence (0.0 - 1.0)
    pub confidence: f32,

    /// First frame of the word (decoded-frame units)
    pub begin_frame: f32,

    /// Last frame of the word (decoded-frame units)
    pub end_frame: f32,
}

/// Outcome of word-boundary alignment of a lattice
pub enum WordAlignment {
    /// Alignment succeeded for the whole lattice
    Full(Box<dyn AlignedLattice>),

    /// Alignment failed part-way; the partial lattice is still usable
    Partial(Box<dyn AlignedLattice>),

    /// Nothing could be aligned
    Empty,
}

/// Opaque speaker/channel adaptation state
///
/// Owned by a decoder session and seeded into every feature-extraction
/// instance the session creates. `as_any` exists so engines can downcast to
/// their own concrete state type.
pub trait AdaptationState: Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Live feature-extraction instance for one utterance
pub trait FeaturePipeline: Send {
    /// Push a chunk of waveform samples
    fn accept_waveform(&mut self, sample_rate: f32, samples: &[f32]);

    /// Number of feature frames ready for the search
    fn frames_ready(&self) -> u32;

    /// Signal that no more audio will arrive
    fn input_finished(&mut self);

    /// Whether an adjunct (i-vector style) feature is present
    ///
    /// Silence re-weighting only applies when it is.
    fn has_adjunct_feature(&self) -> bool;

    /// Re-weight recent frames of the adjunct feature
    fn update_frame_weights(&mut self, weights: &[FrameWeight]);

    /// Export accumulated adaptation statistics back into `state`
    fn export_adaptation_state(&self, state: &mut dyn AdaptationState);
}

/// Live search instance for one utterance
pub trait LatticeSearch: Send {
    /// Advance the search over all frames the pipeline has ready
    fn advance(&mut self, features: &mut dyn FeaturePipeline) -> Result<(), DecodeError>;

    /// Close out the search; no further `advance` calls are meaningful
    fn finalize_decoding(&mut self);

    /// Number of frames decoded so far (zero means empty audio)
    fn frames_decoded(&self) -> u32;

    /// Extract the final weighted lattice
    fn lattice(&mut self) -> Result<Box<dyn Lattice>, DecodeError>;
}

/// Traceback-driven silence re-weighting helper
pub trait SilenceWeighter: Send {
    /// Whether re-weighting is enabled for this model
    fn active(&self) -> bool;

    /// Recompute the traceback from the in-progress search
    fn compute_traceback(&mut self, search: &dyn LatticeSearch);

    /// Weight deltas for frames up to `frames_ready`
    fn delta_weights(&mut self, frames_ready: u32) -> Vec<FrameWeight>;
}

/// Finalized weighted lattice with post-processing capabilities
pub trait Lattice: Send {
    /// Number of lattice states; zero means nothing was decoded
    fn num_states(&self) -> usize;

    /// Extract up to `n` lowest-weight linear paths, best first
    fn nbest_paths(&self, n: usize) -> Vec<LinearPath>;

    /// Align the lattice to word boundaries
    ///
    /// `max_states` bounds the state expansion; zero means unbounded.
    fn align_words(&self, max_states: u32) -> WordAlignment;
}

/// Word-aligned lattice ready for minimum-Bayes-risk decoding
pub trait AlignedLattice: Send {
    /// One-best word sequence with per-word confidence and frame spans
    ///
    /// The lattice weights are scaled by `(lm_scale, acoustic_scale)` before
    /// decoding.
    fn mbr_one_best(&self, lm_scale: f32, acoustic_scale: f32) -> Vec<MbrWord>;
}

/// Factory surface of a loaded decoding engine
///
/// Shared read-only across all sessions of one model; every method may be
/// called concurrently.
pub trait DecodingEngine: Send + Sync {
    /// Fresh adaptation state, created once per pooled session
    fn new_adaptation_state(&self) -> Box<dyn AdaptationState>;

    /// Fresh feature-extraction instance seeded with `adaptation`
    fn new_feature_pipeline(&self, adaptation: &dyn AdaptationState) -> Box<dyn FeaturePipeline>;

    /// Fresh search instance
    fn new_search(&self) -> Box<dyn LatticeSearch>;

    /// Silence re-weighting helper, if the model configures one
    fn new_silence_weighter(&self) -> Option<Box<dyn SilenceWeighter>>;
}

/// Loads a decoding engine from resolved model artifacts
pub trait EngineLoader {
    fn load(
        &self,
        layout: &ModelLayout,
        params: &DecodeParams,
    ) -> Result<Arc<dyn DecodingEngine>, ModelError>;
}
