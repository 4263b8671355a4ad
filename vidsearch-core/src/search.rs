//! Retrieval scoring
//!
//! Pure functions over a query vector and a [`VideoIndex`]: Manhattan
//! distance to both fields, per-field minimum, distance cutoff, stable
//! ascending sort, top-k.

use serde::Serialize;

use crate::distance::manhattan;
use crate::error::{Result, SearchError};
use crate::index::{IndexEntry, VideoIndex};

/// Default maximum number of results
pub const DEFAULT_LIMIT: usize = 10;
/// Default distance cutoff, tuned for normalized all-MiniLM-L6-v2 vectors
pub const DEFAULT_MAX_DISTANCE: f32 = 15.0;

/// Search configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Results returned when the caller does not pass `k` (default: 10)
    pub limit: usize,
    /// Candidates farther than this are dropped (default: 15.0)
    pub max_distance: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

impl SearchConfig {
    /// Defaults overridden by `VIDSEARCH_LIMIT` and `VIDSEARCH_MAX_DISTANCE`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("VIDSEARCH_LIMIT") {
            config.limit = raw.trim().parse().map_err(|_| {
                SearchError::config(format!("VIDSEARCH_LIMIT is not an integer: {}", raw))
            })?;
        }
        if let Ok(raw) = std::env::var("VIDSEARCH_MAX_DISTANCE") {
            config.max_distance = raw.trim().parse().map_err(|_| {
                SearchError::config(format!(
                    "VIDSEARCH_MAX_DISTANCE is not a number: {}",
                    raw
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Reject cutoffs that would make every comparison meaningless
    pub fn validate(&self) -> Result<()> {
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(SearchError::config(format!(
                "max_distance must be a finite, non-negative number (got {})",
                self.max_distance
            )));
        }
        Ok(())
    }
}

/// Which field produced a video's distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Title,
    Transcript,
}

/// One ranked candidate, with its internal distance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub video_id: String,
    pub title: String,
    pub distance: f32,
    pub matched: MatchField,
}

/// What callers outside the engine receive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoHit {
    pub video_id: String,
    pub title: String,
}

impl From<ScoredResult> for VideoHit {
    fn from(result: ScoredResult) -> Self {
        Self {
            video_id: result.video_id,
            title: result.title,
        }
    }
}

/// Smaller of the title and transcript distances; title wins ties.
///
/// A missing transcript never contributes a distance.
pub fn candidate_distance(query: &[f32], entry: &IndexEntry) -> (f32, MatchField) {
    let title = manhattan(query, &entry.title_embedding);
    match entry.transcript_embedding.as_slice() {
        Some(transcript) => {
            let transcript = manhattan(query, transcript);
            if transcript < title {
                (transcript, MatchField::Transcript)
            } else {
                (title, MatchField::Title)
            }
        }
        None => (title, MatchField::Title),
    }
}

/// Score every entry, keep those within `max_distance`, return the best `limit`.
pub fn rank(
    index: &VideoIndex,
    query: &[f32],
    max_distance: f32,
    limit: usize,
) -> Result<Vec<ScoredResult>> {
    if query.len() != index.dimension() {
        return Err(SearchError::DimensionMismatch {
            expected: index.dimension(),
            actual: query.len(),
        });
    }
    if limit == 0 {
        return Ok(vec![]);
    }

    let mut results: Vec<ScoredResult> = index
        .entries()
        .iter()
        .filter_map(|entry| {
            let (distance, matched) = candidate_distance(query, entry);
            (distance <= max_distance).then(|| ScoredResult {
                video_id: entry.video_id.clone(),
                title: entry.title.clone(),
                distance,
                matched,
            })
        })
        .collect();

    // sort_by is stable: equal distances keep index order
    results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    results.truncate(limit);

    Ok(results)
}
