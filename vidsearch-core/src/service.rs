//! Serving-side retrieval engine
//!
//! [`IndexHandle`] holds the current index snapshot. Readers clone the
//! snapshot `Arc` under a short read lock and then work lock-free; installing
//! a new index swaps the `Arc` under the write lock. A request therefore sees
//! exactly one index version from start to finish.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::artifact::read_index;
use crate::embedding::{normalize_text, VectorEngine};
use crate::error::{Result, SearchError};
use crate::index::VideoIndex;
use crate::search::{rank, ScoredResult, SearchConfig, VideoHit};

/// One installed index and its sequence number
#[derive(Debug)]
pub struct Snapshot {
    pub generation: u64,
    pub index: VideoIndex,
}

/// Atomically swappable reference to the serving index
#[derive(Debug, Default)]
pub struct IndexHandle {
    current: RwLock<Option<Arc<Snapshot>>>,
    generations: AtomicU64,
}

impl IndexHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, if any index has been installed
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    /// Replace the serving index; returns the new generation
    pub fn install(&self, index: VideoIndex) -> u64 {
        // numbered under the write lock so generations are installed in order
        let mut current = self.current.write();
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        // old snapshot is dropped once the last in-flight reader releases it
        let _previous = current.replace(Arc::new(Snapshot { generation, index }));
        generation
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }
}

/// Index status for diagnostics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub ready: bool,
    pub generation: u64,
    pub videos: usize,
    pub without_transcript: usize,
    pub model: Option<String>,
    pub dimension: Option<usize>,
    pub built_at: Option<DateTime<Utc>>,
}

/// Embeds queries and ranks them against the current snapshot
pub struct SearchService {
    engine: Arc<VectorEngine>,
    index: IndexHandle,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(engine: Arc<VectorEngine>, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            index: IndexHandle::new(),
            config,
        })
    }

    /// Install an index after checking it shares the engine's vector space
    pub fn install(&self, index: VideoIndex) -> Result<u64> {
        let metadata = index.metadata();
        if metadata.model != self.engine.model_id() {
            return Err(SearchError::ModelMismatch {
                index: metadata.model.clone(),
                engine: self.engine.model_id().to_string(),
            });
        }
        if metadata.dimension != self.engine.dimension() {
            return Err(SearchError::DimensionMismatch {
                expected: self.engine.dimension(),
                actual: metadata.dimension,
            });
        }

        let videos = index.len();
        let generation = self.index.install(index);
        log::info!("Installed index generation {} ({} videos)", generation, videos);
        Ok(generation)
    }

    /// Load an artifact from disk and install it.
    ///
    /// On any error the previously installed index keeps serving.
    pub fn load_index(&self, path: impl AsRef<Path>) -> Result<u64> {
        let index = read_index(path)?;
        self.install(index)
    }

    pub fn is_ready(&self) -> bool {
        self.index.is_loaded()
    }

    /// Top-`k` videos for `query`, best match first
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<VideoHit>> {
        Ok(self
            .search_scored(query, k)?
            .into_iter()
            .map(VideoHit::from)
            .collect())
    }

    /// Like [`SearchService::search`], keeping distances
    pub fn search_scored(&self, query: &str, k: usize) -> Result<Vec<ScoredResult>> {
        let text = normalize_text(query);
        if text.is_empty() {
            return Err(SearchError::invalid_query("query is empty"));
        }

        let snapshot = self
            .index
            .current()
            .ok_or_else(|| SearchError::not_ready("no index loaded"))?;

        if k == 0 {
            return Ok(vec![]);
        }

        let query_vector = self.engine.embed(&text)?;
        let results = rank(
            &snapshot.index,
            &query_vector,
            self.config.max_distance,
            k,
        )?;

        log::debug!(
            "query {:?}: {} results from generation {}",
            text,
            results.len(),
            snapshot.generation
        );
        Ok(results)
    }

    pub fn stats(&self) -> IndexStats {
        match self.index.current() {
            Some(snapshot) => {
                let metadata = snapshot.index.metadata();
                IndexStats {
                    ready: true,
                    generation: snapshot.generation,
                    videos: snapshot.index.len(),
                    without_transcript: snapshot.index.without_transcript(),
                    model: Some(metadata.model.clone()),
                    dimension: Some(metadata.dimension),
                    built_at: Some(metadata.built_at),
                }
            }
            None => IndexStats {
                ready: false,
                generation: 0,
                videos: 0,
                without_transcript: 0,
                model: None,
                dimension: None,
                built_at: None,
            },
        }
    }
}
