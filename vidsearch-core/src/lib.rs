//! vidsearch core
//!
//! Embedding-based video retrieval: videos are found by what their title or
//! transcript means, not by keyword overlap.
//!
//! ## Features
//!
//! - **Index builder** - Embeds titles and transcripts into a columnar index artifact
//! - **L1 retrieval** - Manhattan distance to both fields, per-field minimum, cutoff, top-k
//! - **Snapshot serving** - Lock-free reads against an atomically swappable index
//! - **Raw record tables** - RocksDB store of ingested metadata and transcripts
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vidsearch_core::{IndexBuilder, RecordStore, SearchConfig, SearchService, VectorEngine};
//!
//! let engine = Arc::new(VectorEngine::new(None)?);
//!
//! // Offline: build and write the artifact
//! let records = RecordStore::open("data/records")?.load_records()?;
//! let output = IndexBuilder::new(Arc::clone(&engine)).build(records)?;
//! vidsearch_core::write_index(&output.index, "data/index.bin")?;
//!
//! // Online: load once, serve many
//! let service = SearchService::new(engine, SearchConfig::default())?;
//! service.load_index("data/index.bin")?;
//! let hits = service.search("deep learning", 5)?;
//! ```

pub mod artifact;
pub mod builder;
pub mod distance;
pub mod embedding;
pub mod error;
pub mod index;
pub mod record;
pub mod search;
pub mod service;
pub mod store;

// Re-exports for convenience
pub use artifact::{read_index, write_index};
pub use builder::{BuildOutput, BuildReport, BuilderConfig, IndexBuilder, RejectedRecord};
pub use embedding::{Embedder, StaticEmbedder, VectorEngine, EMBEDDING_DIM};
pub use error::SearchError;
pub use index::{IndexEntry, IndexMetadata, TranscriptVector, VideoIndex};
pub use record::{VideoMeta, VideoRecord};
pub use search::{MatchField, ScoredResult, SearchConfig, VideoHit};
pub use service::{IndexHandle, IndexStats, SearchService, Snapshot};
pub use store::RecordStore;
