//! Decoder session management and streaming orchestration
//!
//! This crate turns audio sample buffers into ranked text hypotheses:
//! - Model resource bundles shared read-only across sessions
//! - Per-utterance decoder sessions with a strict streaming state machine
//! - A fixed-capacity blocking session pool (admission control)
//! - A chunk driver that makes batch and incremental feeding equivalent
//! - A hypothesis synthesizer turning final lattices into `Alternative`s
//!
//! The acoustic/search mathematics lives behind the narrow capability
//! traits in [`engine`]; a deterministic stub engine is provided for tests
//! and local development.

pub mod driver;
pub mod engine;
pub mod model;
pub mod pool;
pub mod registry;
pub mod session;
pub mod synthesis;

pub use driver::{feed_buffer, plan_chunks, DEFAULT_CHUNK_SECONDS};
pub use engine::{
    AdaptationState, AlignedLattice, DecodingEngine, EngineLoader, FeaturePipeline, FrameWeight,
    Lattice, LatticeSearch, LinearPath, MbrWord, SilenceWeighter, SymbolTable, WordAlignment,
};
pub use model::{ModelBundle, ModelLayout, SessionFactory};
pub use pool::{DecoderPool, SessionHandle};
pub use registry::ModelRegistry;
pub use session::{DecoderSession, SessionState};
pub use synthesis::synthesize;
