//! all-MiniLM-L6-v2 sentence embeddings via fastembed (ONNX Runtime)

use std::path::Path;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::embedder::{Embedder, EMBEDDING_DIM};
use crate::error::{Result, SearchError};

/// Model identifier recorded in every index built with [`MiniLmEmbedding`]
pub const MINILM_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// MiniLM configuration
#[derive(Debug, Clone)]
pub struct MiniLmConfig {
    /// Maximum sequence length in tokens (default: 256)
    pub max_length: usize,
    /// Batch size passed to ONNX Runtime (default: 64)
    pub batch_size: usize,
    /// Print download progress on first start (default: false)
    pub show_download_progress: bool,
}

impl Default for MiniLmConfig {
    fn default() -> Self {
        Self {
            max_length: 256,
            batch_size: 64,
            show_download_progress: false,
        }
    }
}

/// fastembed wrapper producing 384-d normalized sentence vectors
pub struct MiniLmEmbedding {
    model: TextEmbedding,
    config: MiniLmConfig,
}

impl MiniLmEmbedding {
    /// Load the model, downloading it into `cache_dir` on first use
    pub fn load(cache_dir: &Path) -> Result<Self> {
        Self::load_with_config(cache_dir, MiniLmConfig::default())
    }

    /// Load the model with custom configuration
    pub fn load_with_config(cache_dir: &Path, config: MiniLmConfig) -> Result<Self> {
        log::info!("Loading {} from: {}", MINILM_MODEL_ID, cache_dir.display());

        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(cache_dir.to_path_buf())
            .with_max_length(config.max_length)
            .with_show_download_progress(config.show_download_progress);

        let model = TextEmbedding::try_new(options)
            .map_err(|e| SearchError::model(format!("Failed to load {}: {}", MINILM_MODEL_ID, e)))?;

        log::info!(
            "Loaded {} ({}d, max {} tokens)",
            MINILM_MODEL_ID,
            EMBEDDING_DIM,
            config.max_length
        );

        Ok(Self {
            model,
            config,
        })
    }

}

impl Embedder for MiniLmEmbedding {
    fn model_id(&self) -> &str {
        MINILM_MODEL_ID
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        // embed takes &self, so concurrent queries run their inference in parallel
        self.model
            .embed(texts.to_vec(), Some(self.config.batch_size))
            .map_err(|e| SearchError::embedding(format!("Failed to encode texts: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_minilm_shares_across_threads_without_wrapper() {
        assert_send_sync::<TextEmbedding>();
        assert_send_sync::<MiniLmEmbedding>();
    }

    #[test]
    fn test_default_config() {
        let config = MiniLmConfig::default();
        assert_eq!(config.max_length, 256);
        assert_eq!(config.batch_size, 64);
        assert!(!config.show_download_progress);
    }
}
