//! Embedding model capability
//!
//! The retrieval engine only needs `embed(text) -> vector`. Everything that
//! produces vectors implements [`Embedder`].

use std::collections::HashMap;

use crate::error::{Result, SearchError};

/// Dimension of the sentence embedding space used by the index
pub const EMBEDDING_DIM: usize = 384;

/// A deterministic sentence-embedding model
pub trait Embedder: Send + Sync {
    /// Identifier of the model and version; indexes record it
    fn model_id(&self) -> &str;

    /// Length of every vector this model returns
    fn dimension(&self) -> usize;

    /// Embed several texts; output order matches input order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| SearchError::embedding("model returned no vector"))
    }
}

/// Lookup-table embedder for fixtures and tests.
///
/// Known texts map to fixed vectors; unknown texts get a deterministic vector
/// derived from their bytes, or an error when `strict` is set.
#[derive(Debug, Clone)]
pub struct StaticEmbedder {
    model_id: String,
    dimension: usize,
    table: HashMap<String, Vec<f32>>,
    strict: bool,
}

impl StaticEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            model_id: "static".to_string(),
            dimension,
            table: HashMap::new(),
            strict: false,
        }
    }

    /// Fail on texts that were not registered with [`StaticEmbedder::with`]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Register a fixed vector for `text` (matched after normalization by the engine)
    pub fn with(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.table.insert(text.into(), vector);
        self
    }

    fn hashed(&self, text: &str) -> Vec<f32> {
        // FNV-1a seeded per component, mapped into [-0.5, 0.5)
        (0..self.dimension)
            .map(|i| {
                let mut hash: u64 = 0xcbf2_9ce4_8422_2325 ^ (i as u64);
                for byte in text.bytes() {
                    hash ^= u64::from(byte);
                    hash = hash.wrapping_mul(0x0100_0000_01b3);
                }
                (hash % 10_000) as f32 / 10_000.0 - 0.5
            })
            .collect()
    }
}

impl Embedder for StaticEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| match self.table.get(*text) {
                Some(vector) => Ok(vector.clone()),
                None if self.strict => Err(SearchError::embedding(format!(
                    "no fixture vector for '{}'",
                    text
                ))),
                None => Ok(self.hashed(text)),
            })
            .collect()
    }
}
