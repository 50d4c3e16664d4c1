//! Model resource bundle and session factory
//!
//! A [`ModelBundle`] holds everything immutable that decoder sessions share:
//! the loaded engine, the word symbol table and the decode parameters. It is
//! created once at startup and referenced read-only by every session.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use lattice_serve_config::ModelSpec;
use lattice_serve_core::error::ModelError;

use crate::engine::{DecodingEngine, EngineLoader, SymbolTable};
use crate::session::DecoderSession;

/// Resolved artifact paths inside one model directory
///
/// Directory contract: a decode graph (`HCLG.fst`), model weights
/// (`final.mdl`), a text symbol table (`words.txt`), an optional word
/// boundary file (`word_boundary.int`) and a `conf/` subdirectory with
/// feature and adjunct-feature configuration.
#[derive(Debug, Clone)]
pub struct ModelLayout {
    pub model_dir: PathBuf,
    pub graph: PathBuf,
    pub model: PathBuf,
    pub symbols: PathBuf,
    pub word_boundary: Option<PathBuf>,
    pub feature_conf: PathBuf,
    pub adjunct_conf: PathBuf,
}

impl ModelLayout {
    /// Resolve and verify the model directory contract
    ///
    /// Missing required artifacts are fatal. A missing word-boundary file
    /// only disables word-level output.
    pub fn resolve(model_dir: impl AsRef<Path>) -> Result<Self, ModelError> {
        let model_dir = model_dir.as_ref().to_path_buf();
        if !model_dir.is_dir() {
            return Err(ModelError::DirectoryNotFound(
                model_dir.display().to_string(),
            ));
        }

        let conf_dir = model_dir.join("conf");
        let graph = required(model_dir.join("HCLG.fst"))?;
        let model = required(model_dir.join("final.mdl"))?;
        let symbols = required(model_dir.join("words.txt"))?;
        let feature_conf = required(conf_dir.join("mfcc.conf"))?;
        let adjunct_conf = required(conf_dir.join("ivector_extractor.conf"))?;

        let word_boundary_path = model_dir.join("word_boundary.int");
        let word_boundary = if word_boundary_path.exists() {
            Some(word_boundary_path)
        } else {
            tracing::warn!(
                "Word boundary file {} not found. Disabling word level features.",
                word_boundary_path.display()
            );
            None
        };

        Ok(Self {
            model_dir,
            graph,
            model,
            symbols,
            word_boundary,
            feature_conf,
            adjunct_conf,
        })
    }

    /// Expand a possibly-relative auxiliary resource path against the model
    /// directory (e.g. normalization/LDA statistics named inside the feature
    /// configs).
    pub fn expand_relative(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.model_dir.join(candidate)
        }
    }
}

fn required(path: PathBuf) -> Result<PathBuf, ModelError> {
    if path.exists() {
        Ok(path)
    } else {
        Err(ModelError::MissingArtifact(path.display().to_string()))
    }
}

/// Immutable, process-lifetime model resources shared by all sessions
pub struct ModelBundle {
    /// Model identity, pool sizing and decode parameters
    pub spec: ModelSpec,
    engine: Arc<dyn DecodingEngine>,
    symbols: SymbolTable,
    word_level_enabled: bool,
}

impl ModelBundle {
    /// Load a bundle from its model directory
    pub fn load(spec: ModelSpec, loader: &dyn EngineLoader) -> Result<Arc<Self>, ModelError> {
        tracing::info!(model = %spec.name, language = %spec.language_code,
            "loading model from {}", spec.path);
        let started = Instant::now();

        let layout = ModelLayout::resolve(&spec.path)?;
        let symbols = SymbolTable::from_text_file(&layout.symbols)?;
        let engine = loader.load(&layout, &spec.decode)?;
        let word_level_enabled = layout.word_boundary.is_some();

        tracing::info!(
            model = %spec.name,
            symbols = symbols.len(),
            word_level_enabled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model loaded"
        );

        Ok(Arc::new(Self {
            spec,
            engine,
            symbols,
            word_level_enabled,
        }))
    }

    /// Assemble a bundle from already-loaded parts
    ///
    /// Used by embedders that bind their own engine, and by tests.
    pub fn from_parts(
        spec: ModelSpec,
        engine: Arc<dyn DecodingEngine>,
        symbols: SymbolTable,
        word_level_enabled: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            spec,
            engine,
            symbols,
            word_level_enabled,
        })
    }

    pub fn engine(&self) -> &Arc<dyn DecodingEngine> {
        &self.engine
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Whether the bundle carries word-boundary info
    ///
    /// When false, word-level output is never produced regardless of the
    /// request flag.
    pub fn word_level_enabled(&self) -> bool {
        self.word_level_enabled
    }
}

/// Builds decoder sessions bound to one shared bundle
///
/// Stateless beyond the bundle reference; `produce` may be called any number
/// of times with no side effects on the bundle.
pub struct SessionFactory {
    bundle: Arc<ModelBundle>,
}

impl SessionFactory {
    pub fn new(bundle: Arc<ModelBundle>) -> Self {
        Self { bundle }
    }

    /// Produce a new idle decoder session
    pub fn produce(&self) -> DecoderSession {
        DecoderSession::new(Arc::clone(&self.bundle))
    }
}
