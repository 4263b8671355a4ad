//! Retrieval layer integration for the vidsearch server
//!
//! Provides async access to the blocking [`SearchService`] for the MCP runtime.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ServerError, ServerResult};
pub use vidsearch_core::{
    IndexStats, ScoredResult, SearchConfig, SearchError, SearchService, VectorEngine, VideoHit,
};

/// Retrieval manager for the server
///
/// Owns the search service once initialized and remembers which artifact it
/// was loaded from so the watcher can reload it.
pub struct RetrievalManager {
    service: Arc<RwLock<Option<Arc<SearchService>>>>,
    index_path: RwLock<Option<PathBuf>>,
    models_dir: Option<PathBuf>,
    config: SearchConfig,
}

impl RetrievalManager {
    /// Create a new RetrievalManager
    ///
    /// # Arguments
    /// * `models_dir` - Optional model cache directory, see `find_model_cache_dir`
    /// * `config` - Search defaults used for every query
    pub fn new(models_dir: Option<PathBuf>, config: SearchConfig) -> Self {
        Self {
            service: Arc::new(RwLock::new(None)),
            index_path: RwLock::new(None),
            models_dir,
            config,
        }
    }

    /// Load the embedding model, then the index artifact at `index_path`
    ///
    /// # Errors
    /// Returns error if the model cannot be loaded or the artifact is unreadable.
    pub async fn initialize(&self, index_path: &Path) -> ServerResult<()> {
        tracing::info!("[RetrievalManager::initialize] Index path: {:?}", index_path);
        tracing::info!("[RetrievalManager::initialize] Models dir: {:?}", self.models_dir);

        let models_dir = self.models_dir.clone();
        let engine = tokio::task::spawn_blocking(move || VectorEngine::new(models_dir.as_deref()))
            .await?
            .map_err(|e| {
                tracing::error!("[RetrievalManager::initialize] VectorEngine initialization failed: {:?}", e);
                e
            })?;
        tracing::info!("[RetrievalManager::initialize] VectorEngine ready ({})", engine.model_id());

        self.initialize_with_engine(Arc::new(engine), Some(index_path))
            .await
    }

    /// Initialize with an already constructed engine; `index_path` may be
    /// omitted to start serving without an index
    pub async fn initialize_with_engine(
        &self,
        engine: Arc<VectorEngine>,
        index_path: Option<&Path>,
    ) -> ServerResult<()> {
        let service = Arc::new(SearchService::new(engine, self.config.clone())?);

        if let Some(path) = index_path {
            let path = path.to_path_buf();
            let loader = Arc::clone(&service);
            let load_path = path.clone();
            let generation =
                tokio::task::spawn_blocking(move || loader.load_index(&load_path)).await??;
            tracing::info!(
                "[RetrievalManager::initialize] Loaded {:?} as generation {}",
                path,
                generation
            );
            *self.index_path.write().await = Some(path);
        }

        *self.service.write().await = Some(service);
        Ok(())
    }

    /// Check if the search service is initialized
    pub async fn is_initialized(&self) -> bool {
        self.service.read().await.is_some()
    }

    /// Artifact the current index was loaded from
    pub async fn index_path(&self) -> Option<PathBuf> {
        self.index_path.read().await.clone()
    }

    /// Re-read the index artifact and swap it in
    ///
    /// A failed reload leaves the previous index serving.
    pub async fn reload(&self) -> ServerResult<u64> {
        let service = self.get_service().await?;
        let path = self
            .index_path()
            .await
            .ok_or_else(|| SearchError::not_ready("no index path configured"))?;

        let generation =
            tokio::task::spawn_blocking(move || service.load_index(&path)).await??;
        Ok(generation)
    }

    /// Top-`k` videos for `query`; `k` defaults to the configured limit
    pub async fn search(&self, query: &str, k: Option<usize>) -> ServerResult<Vec<VideoHit>> {
        Ok(self
            .search_scored(query, k)
            .await?
            .into_iter()
            .map(VideoHit::from)
            .collect())
    }

    /// Like [`RetrievalManager::search`], keeping distances
    pub async fn search_scored(
        &self,
        query: &str,
        k: Option<usize>,
    ) -> ServerResult<Vec<ScoredResult>> {
        let service = self.get_service().await?;
        let k = k.unwrap_or(self.config.limit);
        let query = query.to_string();

        // embedding is CPU bound
        let results =
            tokio::task::spawn_blocking(move || service.search_scored(&query, k)).await??;
        Ok(results)
    }

    /// Index statistics; reports `ready: false` before initialization
    pub async fn stats(&self) -> IndexStats {
        match self.service.read().await.as_ref() {
            Some(service) => service.stats(),
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

    /// Get the underlying service, returning error if not initialized
    async fn get_service(&self) -> ServerResult<Arc<SearchService>> {
        self.service
            .read()
            .await
            .clone()
            .ok_or_else(|| ServerError::from(SearchError::not_ready("search service not initialized")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vidsearch_core::{
        write_index, IndexEntry, IndexMetadata, StaticEmbedder, TranscriptVector, VideoIndex,
    };

    const DIM: usize = 8;

    fn at(first: f32) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        v[0] = first;
        v
    }

    fn engine() -> Arc<VectorEngine> {
        let embedder = StaticEmbedder::new(DIM)
            .with("deep learning", at(0.0))
            .with("sourdough", at(40.0));
        Arc::new(VectorEngine::with_embedder(Arc::new(embedder)))
    }

    fn index(entries: Vec<(&str, &str, f32)>) -> VideoIndex {
        VideoIndex::new(
            IndexMetadata::new("static", DIM),
            entries
                .into_iter()
                .map(|(id, title, d)| IndexEntry {
                    video_id: id.into(),
                    title: title.into(),
                    title_embedding: at(d),
                    transcript_embedding: TranscriptVector::Missing,
                })
                .collect(),
        )
        .unwrap()
    }

    fn manager() -> RetrievalManager {
        RetrievalManager::new(None, SearchConfig::default().with_max_distance(9.0))
    }

    #[tokio::test]
    async fn test_retrieval_manager_uninitialized() {
        let manager = manager();
        assert!(!manager.is_initialized().await);
        assert!(!manager.stats().await.ready);

        let result = manager.search("deep learning", None).await;
        assert!(matches!(
            result,
            Err(ServerError::Search(SearchError::NotReady(_)))
        ));
    }

    #[tokio::test]
    async fn test_search_after_initialize() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.bin");
        write_index(
            &index(vec![
                ("A", "Neural networks basics", 3.1),
                ("B", "Cooking pasta", 9.8),
                ("C", "Intro to deep learning", 1.2),
            ]),
            &path,
        )
        .unwrap();

        let manager = manager();
        manager
            .initialize_with_engine(engine(), Some(&path))
            .await
            .unwrap();

        let hits = manager.search("deep learning", None).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.video_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A"]);

        let top = manager.search("deep learning", Some(1)).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].title, "Intro to deep learning");
    }

    #[tokio::test]
    async fn test_reload_picks_up_new_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.bin");
        write_index(&index(vec![("A", "first", 1.0)]), &path).unwrap();

        let manager = manager();
        manager
            .initialize_with_engine(engine(), Some(&path))
            .await
            .unwrap();
        assert_eq!(manager.stats().await.generation, 1);

        write_index(&index(vec![("A", "first", 1.0), ("B", "second", 2.0)]), &path).unwrap();
        assert_eq!(manager.reload().await.unwrap(), 2);

        let stats = manager.stats().await;
        assert_eq!(stats.videos, 2);
        assert_eq!(stats.generation, 2);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_serving() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.bin");
        write_index(&index(vec![("A", "first", 1.0)]), &path).unwrap();

        let manager = manager();
        manager
            .initialize_with_engine(engine(), Some(&path))
            .await
            .unwrap();

        std::fs::write(&path, b"not an index").unwrap();
        assert!(manager.reload().await.is_err());

        let hits = manager.search("deep learning", None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(manager.stats().await.generation, 1);
    }

    #[tokio::test]
    async fn test_initialized_without_index_is_not_ready() {
        let manager = manager();
        manager.initialize_with_engine(engine(), None).await.unwrap();
        assert!(manager.is_initialized().await);
        assert!(!manager.stats().await.ready);
        assert!(manager.reload().await.is_err());
        assert!(manager.search("deep learning", None).await.is_err());
    }

    #[tokio::test]
    #[ignore = "requires model files"]
    async fn test_retrieval_manager_with_minilm() {
        let manager = RetrievalManager::new(None, SearchConfig::default());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.bin");
        write_index(&VideoIndex::empty(vidsearch_core::embedding::MINILM_MODEL_ID, 384), &path)
            .unwrap();

        manager.initialize(&path).await.unwrap();
        assert!(manager.search("deep learning", None).await.unwrap().is_empty());
    }
}
