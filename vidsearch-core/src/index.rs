//! In-memory video index
//!
//! Immutable once constructed. A serving process shares it behind an `Arc`
//! and replaces it wholesale on rebuild.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::{Result, SearchError};

/// Transcript embedding of one video
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptVector {
    /// Embedding of the normalized transcript
    Embedded(Vec<f32>),
    /// The video has no usable transcript; it can only match by title
    Missing,
}

impl TranscriptVector {
    pub fn as_slice(&self) -> Option<&[f32]> {
        match self {
            Self::Embedded(v) => Some(v),
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// One indexed video
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub video_id: String,
    pub title: String,
    pub title_embedding: Vec<f32>,
    pub transcript_embedding: TranscriptVector,
}

/// Provenance of an index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMetadata {
    /// Embedding model the vectors came from
    pub model: String,
    /// Vector length
    pub dimension: usize,
    /// When the builder finished
    pub built_at: DateTime<Utc>,
}

impl IndexMetadata {
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
            built_at: Utc::now(),
        }
    }
}

/// Ordered, validated collection of index entries
#[derive(Debug, Clone)]
pub struct VideoIndex {
    metadata: IndexMetadata,
    entries: Vec<IndexEntry>,
}

impl VideoIndex {
    /// Build an index, validating ids, dimensions and components
    pub fn new(metadata: IndexMetadata, entries: Vec<IndexEntry>) -> Result<Self> {
        let dim = metadata.dimension;
        let mut seen = HashSet::with_capacity(entries.len());

        for entry in &entries {
            if entry.video_id.is_empty() {
                return Err(SearchError::invalid_record("entry with empty video id"));
            }
            if !seen.insert(entry.video_id.as_str()) {
                return Err(SearchError::DuplicateVideoId(entry.video_id.clone()));
            }
            check_vector(&entry.title_embedding, dim, &entry.video_id)?;
            if let Some(v) = entry.transcript_embedding.as_slice() {
                check_vector(v, dim, &entry.video_id)?;
            }
        }

        Ok(Self { metadata, entries })
    }

    /// Index with no entries
    pub fn empty(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            metadata: IndexMetadata::new(model, dimension),
            entries: Vec::new(),
        }
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn dimension(&self) -> usize {
        self.metadata.dimension
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by video id (linear scan)
    pub fn get(&self, video_id: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.video_id == video_id)
    }

    /// Number of entries that can only match by title
    pub fn without_transcript(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.transcript_embedding.is_missing())
            .count()
    }
}

fn check_vector(vector: &[f32], dimension: usize, video_id: &str) -> Result<()> {
    if vector.len() != dimension {
        return Err(SearchError::DimensionMismatch {
            expected: dimension,
            actual: vector.len(),
        });
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(SearchError::corrupt(format!(
            "non-finite embedding component for video {}",
            video_id
        )));
    }
    Ok(())
}
