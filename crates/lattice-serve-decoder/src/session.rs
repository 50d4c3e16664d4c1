//! Per-utterance decoder session state machine
//!
//! A session is Idle until `start` creates fresh feature-extraction and
//! search instances, Active while audio is fed, and Finalizing once input is
//! closed out. Retrieving results (or starting again) returns it to Idle.
//! The speaker-adaptation state outlives individual utterances: it belongs
//! to the session object and is re-seeded into every new feature pipeline.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use lattice_serve_core::error::DecodeError;
use lattice_serve_core::Alternative;

use crate::engine::{AdaptationState, FeaturePipeline, LatticeSearch, SilenceWeighter};
use crate::model::ModelBundle;
use crate::synthesis;

/// Streaming state of a decoder session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No live feature/search instances
    Idle,
    /// Accepting audio chunks, search advancing
    Active,
    /// Input closed out, results pending
    Finalizing,
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Active => "active",
            SessionState::Finalizing => "finalizing",
        }
    }
}

/// Mutable decoding state for one utterance at a time
///
/// Exclusively owned by one caller between pool acquire and release. The
/// feature pipeline and search instance are always created and destroyed
/// together; a session is never partially reset.
pub struct DecoderSession {
    bundle: Arc<ModelBundle>,
    state: SessionState,
    utterance_id: Option<Uuid>,
    adaptation: Box<dyn AdaptationState>,
    features: Option<Box<dyn FeaturePipeline>>,
    search: Option<Box<dyn LatticeSearch>>,
    silence: Option<Box<dyn SilenceWeighter>>,
}

impl DecoderSession {
    pub(crate) fn new(bundle: Arc<ModelBundle>) -> Self {
        let adaptation = bundle.engine().new_adaptation_state();
        Self {
            bundle,
            state: SessionState::Idle,
            utterance_id: None,
            adaptation,
            features: None,
            search: None,
            silence: None,
        }
    }

    /// Begin a new utterance
    ///
    /// Discards any prior feature/search instances (idempotent from any
    /// state) and builds fresh ones, seeding the feature pipeline with the
    /// session's carried-over adaptation state.
    pub fn start(&mut self, utterance_id: Uuid) {
        self.free_instances();

        let engine = self.bundle.engine();
        self.features = Some(engine.new_feature_pipeline(self.adaptation.as_ref()));
        self.search = Some(engine.new_search());
        self.silence = engine.new_silence_weighter();

        self.utterance_id = Some(utterance_id);
        self.state = SessionState::Active;
        tracing::debug!(utterance = %utterance_id, model = %self.bundle.spec.name, "session started");
    }

    /// Feed one chunk of audio
    ///
    /// Chunks must be strictly time-ordered and non-overlapping; that is a
    /// caller precondition, not something the session can detect.
    pub fn feed_chunk(&mut self, sample_rate: f32, samples: &[f32]) -> Result<(), DecodeError> {
        if self.state != SessionState::Active {
            return Err(DecodeError::InvalidState {
                expected: "active",
                actual: self.state.name(),
            });
        }

        // start() put us in Active, so both instances exist
        let features = match self.features.as_mut() {
            Some(f) => f,
            None => {
                return Err(DecodeError::InvalidState {
                    expected: "active",
                    actual: "idle",
                })
            }
        };
        let search = match self.search.as_mut() {
            Some(s) => s,
            None => {
                return Err(DecodeError::InvalidState {
                    expected: "active",
                    actual: "idle",
                })
            }
        };

        features.accept_waveform(sample_rate, samples);

        if let Some(weighter) = self.silence.as_mut() {
            if weighter.active() && features.has_adjunct_feature() {
                let started = Instant::now();
                weighter.compute_traceback(&**search);
                let weights = weighter.delta_weights(features.frames_ready());
                features.update_frame_weights(&weights);
                tracing::trace!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    frames = weights.len(),
                    "silence re-weighting applied"
                );
            }
        }

        let started = Instant::now();
        search.advance(&mut **features)?;
        tracing::trace!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            frames_decoded = search.frames_decoded(),
            "search advanced"
        );

        Ok(())
    }

    /// Close out the utterance
    ///
    /// For non-bidirectional streams this signals end of input and forces
    /// the search to finish; a continuous bidirectional stream skips that
    /// and reads results from the in-progress search.
    pub fn finalize(&mut self, bidi_streaming: bool) -> Result<(), DecodeError> {
        if self.state != SessionState::Active {
            return Err(DecodeError::InvalidState {
                expected: "active",
                actual: self.state.name(),
            });
        }

        if let (Some(features), Some(search)) = (self.features.as_mut(), self.search.as_mut()) {
            if !bidi_streaming {
                features.input_finished();
                search.advance(&mut **features)?;
                search.finalize_decoding();
            }
            // carry adaptation statistics over to the next utterance on
            // this session slot
            features.export_adaptation_state(self.adaptation.as_mut());
        }

        self.state = SessionState::Finalizing;
        Ok(())
    }

    /// Synthesize ranked alternatives from the finalized search
    ///
    /// Zero decoded frames (silence / empty audio) is a benign condition and
    /// yields an empty list. The session returns to Idle afterwards.
    pub fn results(
        &mut self,
        n_best: usize,
        word_level: bool,
    ) -> Result<Vec<Alternative>, DecodeError> {
        if self.state != SessionState::Finalizing {
            return Err(DecodeError::InvalidState {
                expected: "finalizing",
                actual: self.state.name(),
            });
        }

        let alternatives = match self.search.as_mut() {
            Some(search) if search.frames_decoded() == 0 => {
                tracing::warn!(
                    utterance = ?self.utterance_id,
                    "audio may be empty: decoded no frames"
                );
                Vec::new()
            }
            Some(search) => {
                let lattice = search
                    .lattice()
                    .map_err(|e| DecodeError::LatticeExtraction(e.to_string()))?;
                synthesis::synthesize(lattice.as_ref(), &self.bundle, n_best, word_level)
            }
            None => Vec::new(),
        };

        self.free_instances();
        Ok(alternatives)
    }

    /// Current streaming state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Utterance id assigned at the most recent `start`
    pub fn utterance_id(&self) -> Option<Uuid> {
        self.utterance_id
    }

    /// The shared model bundle this session decodes against
    pub fn bundle(&self) -> &Arc<ModelBundle> {
        &self.bundle
    }

    /// Carried-over adaptation state for this session slot
    pub fn adaptation_state(&self) -> &dyn AdaptationState {
        self.adaptation.as_ref()
    }

    /// Drop feature/search instances together and return to Idle
    fn free_instances(&mut self) {
        self.features = None;
        self.search = None;
        self.silence = None;
        self.utterance_id = None;
        self.state = SessionState::Idle;
    }
}
