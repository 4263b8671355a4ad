//! Model cache directory discovery
//!
//! fastembed downloads model files on first use; this decides where they live.

use crate::error::{Result, SearchError};
use std::path::{Path, PathBuf};

/// Find the model cache directory with priority:
/// 1. VIDSEARCH_MODELS_PATH environment variable
/// 2. Explicit path passed by the caller (CLI flag)
/// 3. User home directory (~/.vidsearch/models)
///
/// The directory is created if it does not exist yet.
pub fn find_model_cache_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = resolve_model_cache_dir(explicit)?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        log::info!("Created model cache directory: {}", dir.display());
    }
    Ok(dir)
}

fn resolve_model_cache_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    // Priority 1: VIDSEARCH_MODELS_PATH (container and CI deployments)
    if let Ok(models_path) = std::env::var("VIDSEARCH_MODELS_PATH") {
        if !models_path.trim().is_empty() {
            log::info!("Using VIDSEARCH_MODELS_PATH: {}", models_path);
            return Ok(PathBuf::from(models_path));
        }
        log::warn!("VIDSEARCH_MODELS_PATH is set but empty, ignoring");
    }

    // Priority 2: Explicit path
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    // Priority 3: User home directory
    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return Ok(PathBuf::from(home).join(".vidsearch").join("models"));
    }

    Err(SearchError::invalid_path(
        "Cannot determine model cache directory. Checked:\n\
         - VIDSEARCH_MODELS_PATH environment variable\n\
         - --models-dir flag\n\
         - ~/.vidsearch/models",
    ))
}
