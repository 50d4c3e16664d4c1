//! Multi-model registry
//!
//! A deployment serves several models side by side, each with its own
//! session pool; requests route by `(name, language_code)`.

use std::collections::HashMap;
use std::sync::Arc;

use lattice_serve_config::ModelSpec;
use lattice_serve_core::error::ModelError;

use crate::engine::EngineLoader;
use crate::model::ModelBundle;
use crate::pool::DecoderPool;

/// Registry key: (model name, language code)
pub type ModelId = (String, String);

/// One decoder pool per deployed model
#[derive(Default)]
pub struct ModelRegistry {
    pools: HashMap<ModelId, DecoderPool>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every spec and build its pool; any model failure aborts startup
    pub fn load_all(specs: &[ModelSpec], loader: &dyn EngineLoader) -> Result<Self, ModelError> {
        let mut registry = Self::new();
        for spec in specs {
            let bundle = ModelBundle::load(spec.clone(), loader)?;
            registry.insert(bundle);
        }
        Ok(registry)
    }

    /// Register a pool for an already-loaded bundle
    pub fn insert(&mut self, bundle: Arc<ModelBundle>) {
        let id = bundle.spec.id();
        self.pools.insert(id, DecoderPool::new(bundle));
    }

    /// Look up the pool for a model
    pub fn pool(&self, name: &str, language_code: &str) -> Option<&DecoderPool> {
        self.pools
            .get(&(name.to_string(), language_code.to_string()))
    }

    /// Registered model ids
    pub fn model_ids(&self) -> impl Iterator<Item = &ModelId> {
        self.pools.keys()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
