//! Embedding module for semantic search
//!
//! Uses all-MiniLM-L6-v2 (384d) through fastembed; tests plug in
//! [`StaticEmbedder`].

mod discovery;
mod embedder;
mod engine;
mod minilm;
mod normalize;

pub use discovery::find_model_cache_dir;
pub use embedder::{Embedder, StaticEmbedder, EMBEDDING_DIM};
pub use engine::{VectorEngine, DEFAULT_CACHE_CAPACITY};
pub use minilm::{MiniLmConfig, MiniLmEmbedding, MINILM_MODEL_ID};
pub use normalize::normalize_text;
