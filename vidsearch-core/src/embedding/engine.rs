//! Vector embedding engine
//!
//! High-level API for generating and caching embeddings. Every text is
//! normalized here, so builder and query paths cannot drift apart.

use super::discovery::find_model_cache_dir;
use super::embedder::Embedder;
use super::minilm::MiniLmEmbedding;
use super::normalize::normalize_text;
use crate::error::{Result, SearchError};
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;

/// Default number of cached query vectors
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Vector embedding engine with caching
///
/// Wraps an [`Embedder`] with text normalization, output validation and a
/// bounded DashMap cache keyed by normalized text.
pub struct VectorEngine {
    model: Arc<dyn Embedder>,
    cache: DashMap<String, Vec<f32>>,
    cache_capacity: usize,
    dimension: usize,
}

impl VectorEngine {
    /// Create VectorEngine with all-MiniLM-L6-v2
    ///
    /// # Arguments
    /// * `models_dir` - Optional model cache directory (see [`find_model_cache_dir`])
    pub fn new(models_dir: Option<&Path>) -> Result<Self> {
        let cache_dir = find_model_cache_dir(models_dir)?;
        let model = MiniLmEmbedding::load(&cache_dir)?;
        let engine = Self::with_embedder(Arc::new(model));

        log::info!("VectorEngine ready ({}d, {})", engine.dimension, engine.model_id());
        Ok(engine)
    }

    /// Create VectorEngine over any embedder
    pub fn with_embedder(model: Arc<dyn Embedder>) -> Self {
        let dimension = model.dimension();
        Self {
            model,
            cache: DashMap::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            dimension,
        }
    }

    /// Override the cache capacity (0 disables caching)
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Generate embedding with caching
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = normalize_text(text);

        if let Some(cached) = self.cache.get(&text) {
            return Ok(cached.clone());
        }

        let embedding = self.model.embed(&text)?;
        self.check_vector(&embedding)?;
        self.remember(text, &embedding);
        Ok(embedding)
    }

    /// Batch embed with caching
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let normalized: Vec<String> = texts.iter().map(|t| normalize_text(t)).collect();

        // Check cache for all texts
        let mut results: Vec<Option<Vec<f32>>> = normalized
            .iter()
            .map(|text| self.cache.get(text).map(|v| v.clone()))
            .collect();

        // Find uncached texts
        let uncached: Vec<(usize, &str)> = results
            .iter()
            .enumerate()
            .filter(|(_, cached)| cached.is_none())
            .map(|(i, _)| (i, normalized[i].as_str()))
            .collect();

        if uncached.is_empty() {
            return Ok(results.into_iter().flatten().collect());
        }

        // Batch embed uncached texts
        let uncached_texts: Vec<&str> = uncached.iter().map(|(_, t)| *t).collect();
        let new_embeddings = self.model.embed_batch(&uncached_texts)?;
        if new_embeddings.len() != uncached_texts.len() {
            return Err(SearchError::embedding(format!(
                "model returned {} vectors for {} texts",
                new_embeddings.len(),
                uncached_texts.len()
            )));
        }

        // Update cache and results
        for ((idx, text), emb) in uncached.iter().zip(new_embeddings.into_iter()) {
            self.check_vector(&emb)?;
            self.remember(text.to_string(), &emb);
            results[*idx] = Some(emb);
        }

        Ok(results.into_iter().flatten().collect())
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(SearchError::embedding("model returned non-finite component"));
        }
        Ok(())
    }

    fn remember(&self, text: String, embedding: &[f32]) {
        if self.cache.len() < self.cache_capacity {
            self.cache.insert(text, embedding.to_vec());
        }
    }

    /// Identifier of the underlying model
    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Get embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get cache size
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
