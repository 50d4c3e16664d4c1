//! Deterministic in-memory decoding engine
//!
//! Stands in for the external acoustic/search engine in tests and local
//! development. Its output depends only on the total number of frames
//! consumed, never on how the audio was chunked, so it preserves the
//! chunk-boundary invariance the real engine guarantees.

use std::any::Any;
use std::sync::Arc;

use lattice_serve_config::DecodeParams;
use lattice_serve_core::error::{DecodeError, ModelError};

use super::{
    AdaptationState, AlignedLattice, DecodingEngine, EngineLoader, FeaturePipeline, FrameWeight,
    Lattice, LatticeSearch, LinearPath, MbrWord, SilenceWeighter, WordAlignment,
};
use crate::model::ModelLayout;

/// How the stub lattice responds to word alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StubAlignment {
    /// Whole lattice aligns
    #[default]
    Full,
    /// Alignment fails part-way; only the first half of the words align
    Partial,
    /// Nothing aligns
    Empty,
}

/// Tuning knobs for the stub engine
#[derive(Debug, Clone, Copy)]
pub struct StubEngineConfig {
    /// Emitted word ids cycle through `1..=vocabulary_size`
    pub vocabulary_size: u32,

    /// One word is emitted per this many decoded frames
    pub frames_per_word: u32,

    /// Alignment behavior of produced lattices
    pub alignment: StubAlignment,
}

impl Default for StubEngineConfig {
    fn default() -> Self {
        Self {
            vocabulary_size: 8,
            frames_per_word: 25,
            alignment: StubAlignment::Full,
        }
    }
}

/// Deterministic engine implementing the full capability surface
pub struct StubEngine {
    params: DecodeParams,
    config: StubEngineConfig,
}

impl StubEngine {
    pub fn new(params: DecodeParams, config: StubEngineConfig) -> Self {
        Self { params, config }
    }
}

impl DecodingEngine for StubEngine {
    fn new_adaptation_state(&self) -> Box<dyn AdaptationState> {
        Box::new(StubAdaptationState::default())
    }

    fn new_feature_pipeline(&self, adaptation: &dyn AdaptationState) -> Box<dyn FeaturePipeline> {
        let seeded_frames = adaptation
            .as_any()
            .downcast_ref::<StubAdaptationState>()
            .map(|state| state.frames_seen)
            .unwrap_or(0);
        Box::new(StubFeaturePipeline {
            sample_rate: None,
            total_samples: 0,
            finished: false,
            weights_applied: 0,
            seeded_frames,
        })
    }

    fn new_search(&self) -> Box<dyn LatticeSearch> {
        Box::new(StubSearch {
            frames_decoded: 0,
            finalized: false,
            subsampling: self.params.frame_subsampling_factor.max(1),
            config: self.config,
        })
    }

    fn new_silence_weighter(&self) -> Option<Box<dyn SilenceWeighter>> {
        Some(Box::new(StubSilenceWeighter {
            weight: self.params.silence_weight,
            traceback_frames: 0,
            weighted_up_to: 0,
        }))
    }
}

/// Loader binding the stub engine to any resolved model layout
pub struct StubEngineLoader {
    pub config: StubEngineConfig,
}

impl StubEngineLoader {
    pub fn new(config: StubEngineConfig) -> Self {
        Self { config }
    }
}

impl Default for StubEngineLoader {
    fn default() -> Self {
        Self::new(StubEngineConfig::default())
    }
}

impl EngineLoader for StubEngineLoader {
    fn load(
        &self,
        _layout: &ModelLayout,
        params: &DecodeParams,
    ) -> Result<Arc<dyn DecodingEngine>, ModelError> {
        Ok(Arc::new(StubEngine::new(*params, self.config)))
    }
}

/// Adaptation statistics carried across utterances on one session slot
#[derive(Debug, Default, Clone, Copy)]
pub struct StubAdaptationState {
    pub utterances_seen: u32,
    pub frames_seen: u64,
}

impl AdaptationState for StubAdaptationState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct StubFeaturePipeline {
    sample_rate: Option<f32>,
    total_samples: u64,
    finished: bool,
    weights_applied: usize,
    #[allow(dead_code)]
    seeded_frames: u64,
}

impl FeaturePipeline for StubFeaturePipeline {
    fn accept_waveform(&mut self, sample_rate: f32, samples: &[f32]) {
        self.sample_rate = Some(sample_rate);
        self.total_samples += samples.len() as u64;
    }

    fn frames_ready(&self) -> u32 {
        match self.sample_rate {
            // 10 ms frames
            Some(rate) if rate > 0.0 => (self.total_samples as f64 * 100.0 / rate as f64) as u32,
            _ => 0,
        }
    }

    fn input_finished(&mut self) {
        self.finished = true;
    }

    fn has_adjunct_feature(&self) -> bool {
        true
    }

    fn update_frame_weights(&mut self, weights: &[FrameWeight]) {
        self.weights_applied += weights.len();
    }

    fn export_adaptation_state(&self, state: &mut dyn AdaptationState) {
        if let Some(state) = state.as_any_mut().downcast_mut::<StubAdaptationState>() {
            state.utterances_seen += 1;
            state.frames_seen += self.frames_ready() as u64;
        }
    }
}

struct StubSearch {
    frames_decoded: u32,
    finalized: bool,
    subsampling: u32,
    config: StubEngineConfig,
}

impl LatticeSearch for StubSearch {
    fn advance(&mut self, features: &mut dyn FeaturePipeline) -> Result<(), DecodeError> {
        self.frames_decoded = features.frames_ready() / self.subsampling;
        Ok(())
    }

    fn finalize_decoding(&mut self) {
        self.finalized = true;
    }

    fn frames_decoded(&self) -> u32 {
        self.frames_decoded
    }

    fn lattice(&mut self) -> Result<Box<dyn Lattice>, DecodeError> {
        let n_words = self.frames_decoded / self.config.frames_per_word;
        let word_ids: Vec<u32> = (0..n_words)
            .map(|i| 1 + (i % self.config.vocabulary_size))
            .collect();
        Ok(Box::new(StubLattice::with_words(
            word_ids,
            self.frames_decoded,
            self.config.alignment,
        )))
    }
}

struct StubSilenceWeighter {
    weight: f32,
    traceback_frames: u32,
    weighted_up_to: u32,
}

impl SilenceWeighter for StubSilenceWeighter {
    fn active(&self) -> bool {
        self.weight != 1.0
    }

    fn compute_traceback(&mut self, search: &dyn LatticeSearch) {
        self.traceback_frames = search.frames_decoded();
    }

    fn delta_weights(&mut self, frames_ready: u32) -> Vec<FrameWeight> {
        let weights = (self.weighted_up_to..frames_ready)
            .map(|frame| (frame, self.weight))
            .collect();
        self.weighted_up_to = frames_ready;
        weights
    }
}

/// Deterministic lattice over a fixed word sequence
pub struct StubLattice {
    word_ids: Vec<u32>,
    frames: u32,
    alignment: StubAlignment,
}

impl StubLattice {
    /// Lattice with no states (nothing decoded)
    pub fn empty() -> Self {
        Self {
            word_ids: Vec::new(),
            frames: 0,
            alignment: StubAlignment::Full,
        }
    }

    /// Lattice over `word_ids` spanning `frames` decoded frames
    pub fn with_words(word_ids: Vec<u32>, frames: u32, alignment: StubAlignment) -> Self {
        Self {
            word_ids,
            frames,
            alignment,
        }
    }

    fn base_scores(&self) -> (f32, f32) {
        let lm = 0.5 * self.word_ids.len() as f32 + 3.0;
        let am = -1.7 * self.frames as f32;
        (lm, am)
    }
}

impl Lattice for StubLattice {
    fn num_states(&self) -> usize {
        if self.frames == 0 {
            0
        } else {
            self.frames as usize + 1
        }
    }

    fn nbest_paths(&self, n: usize) -> Vec<LinearPath> {
        if self.num_states() == 0 {
            return Vec::new();
        }

        let (lm, am) = self.base_scores();
        let distinct = self.word_ids.len().max(1).min(n);
        (0..distinct)
            .map(|rank| LinearPath {
                // lower-ranked paths shed their final word and score worse
                word_ids: self.word_ids[..self.word_ids.len() - rank].to_vec(),
                lm_score: lm + 2.0 * rank as f32,
                am_score: am + 5.0 * rank as f32,
            })
            .collect()
    }

    fn align_words(&self, _max_states: u32) -> WordAlignment {
        if self.word_ids.is_empty() || self.alignment == StubAlignment::Empty {
            return WordAlignment::Empty;
        }

        let span_frames = self.frames as f32 / self.word_ids.len() as f32;
        match self.alignment {
            StubAlignment::Full => WordAlignment::Full(Box::new(StubAlignedLattice {
                word_ids: self.word_ids.clone(),
                span_frames,
            })),
            StubAlignment::Partial => {
                let keep = (self.word_ids.len() / 2).max(1);
                WordAlignment::Partial(Box::new(StubAlignedLattice {
                    word_ids: self.word_ids[..keep].to_vec(),
                    span_frames,
                }))
            }
            StubAlignment::Empty => WordAlignment::Empty,
        }
    }
}

struct StubAlignedLattice {
    word_ids: Vec<u32>,
    span_frames: f32,
}

impl AlignedLattice for StubAlignedLattice {
    fn mbr_one_best(&self, _lm_scale: f32, _acoustic_scale: f32) -> Vec<MbrWord> {
        self.word_ids
            .iter()
            .enumerate()
            .map(|(i, &word_id)| MbrWord {
                word_id,
                confidence: (0.97 - 0.02 * i as f32).max(0.5),
                begin_frame: i as f32 * self.span_frames,
                end_frame: (i + 1) as f32 * self.span_frames,
            })
            .collect()
    }
}
