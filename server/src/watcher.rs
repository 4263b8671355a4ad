//! Index artifact watcher for hot reloads.

use crate::retrieval::RetrievalManager;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Default debounce interval in milliseconds.
const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Reloads the serving index whenever its artifact file is replaced.
pub struct IndexWatcher {
    _watcher: RecommendedWatcher,
}

impl IndexWatcher {
    /// Start watching `index_path`; reloads go through `manager`.
    ///
    /// The parent directory is watched, since atomic writes replace the file
    /// rather than modify it in place.
    pub fn new(manager: Arc<RetrievalManager>, index_path: &Path) -> Result<Self, notify::Error> {
        let file_name = index_path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| notify::Error::generic("index path has no file name"))?;
        let dir = match index_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, mut rx) = mpsc::channel::<Event>(100);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    // Use blocking_send since this is called from a sync context
                    let _ = tx.blocking_send(event);
                }
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!("Watching {:?} for index updates", dir.join(&file_name));

        tokio::spawn(async move {
            let debounce_duration = Duration::from_millis(DEFAULT_DEBOUNCE_MS);
            let mut pending: Option<Instant> = None;

            loop {
                tokio::select! {
                    event = rx.recv() => {
                        match event {
                            Some(event) => {
                                if touches_artifact(&event, &file_name) {
                                    pending = Some(Instant::now());
                                }
                            }
                            None => break, // Channel closed
                        }
                    }
                    _ = tokio::time::sleep(Duration::from_millis(50)) => {
                        let due = pending
                            .map(|at| at.elapsed() >= debounce_duration)
                            .unwrap_or(false);
                        if due {
                            pending = None;
                            Self::reload(&manager).await;
                        }
                    }
                }
            }
        });

        Ok(Self { _watcher: watcher })
    }

    async fn reload(manager: &RetrievalManager) {
        match manager.reload().await {
            Ok(generation) => {
                tracing::info!("Reloaded index as generation {}", generation);
            }
            Err(e) => {
                tracing::warn!("Index reload failed, keeping current index: {}", e);
            }
        }
    }
}

/// Whether `event` creates, replaces or modifies the artifact file
fn touches_artifact(event: &Event, file_name: &OsString) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_)
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
