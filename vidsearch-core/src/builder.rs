//! Index builder
//!
//! Turns raw video records into a [`VideoIndex`]. Runs offline; a failed
//! build never touches the artifact that is currently serving.

use std::collections::HashSet;
use std::sync::Arc;

use crate::embedding::{normalize_text, VectorEngine};
use crate::error::{Result, SearchError};
use crate::index::{IndexEntry, IndexMetadata, TranscriptVector, VideoIndex};
use crate::record::VideoRecord;

/// Builder configuration
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Texts per embedding call (default: 64)
    pub batch_size: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self { batch_size: 64 }
    }
}

/// A record that was skipped during a build
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    /// Position in the input batch
    pub position: usize,
    pub reason: String,
}

/// Summary of a finished build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub indexed: usize,
    pub without_transcript: usize,
    pub rejected: Vec<RejectedRecord>,
}

/// Index plus the report describing how it was produced
#[derive(Debug)]
pub struct BuildOutput {
    pub index: VideoIndex,
    pub report: BuildReport,
}

/// Normalized, validated record waiting for its embeddings
struct PreparedRecord {
    video_id: String,
    title: String,
    title_text: String,
    transcript_text: String,
}

/// Builds indexes with a shared embedding engine
pub struct IndexBuilder {
    engine: Arc<VectorEngine>,
    config: BuilderConfig,
}

impl IndexBuilder {
    pub fn new(engine: Arc<VectorEngine>) -> Self {
        Self::with_config(engine, BuilderConfig::default())
    }

    pub fn with_config(engine: Arc<VectorEngine>, config: BuilderConfig) -> Self {
        Self { engine, config }
    }

    /// Build an index from a batch of records.
    ///
    /// Records without a video id or with a blank title are skipped and
    /// reported. A duplicate id, an embedding failure or a malformed model
    /// output fails the whole build.
    pub fn build(&self, records: Vec<VideoRecord>) -> Result<BuildOutput> {
        let mut report = BuildReport::default();
        let prepared = self.prepare(records, &mut report)?;

        log::info!(
            "Embedding {} records ({} rejected)",
            prepared.len(),
            report.rejected.len()
        );

        let titles: Vec<&str> = prepared.iter().map(|r| r.title_text.as_str()).collect();
        let title_vectors = self.embed_chunked(&titles)?;

        let with_transcript: Vec<usize> = prepared
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.transcript_text.is_empty())
            .map(|(i, _)| i)
            .collect();
        let transcripts: Vec<&str> = with_transcript
            .iter()
            .map(|&i| prepared[i].transcript_text.as_str())
            .collect();
        let mut transcript_vectors = self.embed_chunked(&transcripts)?.into_iter();

        let mut transcript_slots: Vec<TranscriptVector> =
            vec![TranscriptVector::Missing; prepared.len()];
        for &i in &with_transcript {
            match transcript_vectors.next() {
                Some(v) => transcript_slots[i] = TranscriptVector::Embedded(v),
                None => return Err(SearchError::embedding("missing transcript vectors")),
            }
        }

        let entries: Vec<IndexEntry> = prepared
            .into_iter()
            .zip(title_vectors)
            .zip(transcript_slots)
            .map(|((record, title_embedding), transcript_embedding)| IndexEntry {
                video_id: record.video_id,
                title: record.title,
                title_embedding,
                transcript_embedding,
            })
            .collect();

        let metadata = IndexMetadata::new(self.engine.model_id(), self.engine.dimension());
        let index = VideoIndex::new(metadata, entries)?;

        report.indexed = index.len();
        report.without_transcript = index.without_transcript();

        log::info!(
            "Built index: {} videos, {} title-only, {} rejected",
            report.indexed,
            report.without_transcript,
            report.rejected.len()
        );

        Ok(BuildOutput { index, report })
    }

    fn prepare(
        &self,
        records: Vec<VideoRecord>,
        report: &mut BuildReport,
    ) -> Result<Vec<PreparedRecord>> {
        let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
        let mut prepared = Vec::with_capacity(records.len());

        for (position, record) in records.into_iter().enumerate() {
            let video_id = record.id().to_string();
            if video_id.is_empty() {
                log::warn!("Skipping record {}: missing video id", position);
                report.rejected.push(RejectedRecord {
                    position,
                    reason: "missing video id".to_string(),
                });
                continue;
            }

            // an empty title would embed the same text the query path rejects
            let title_text = normalize_text(&record.title);
            if title_text.is_empty() {
                log::warn!("Skipping record {} ({}): empty title", position, video_id);
                report.rejected.push(RejectedRecord {
                    position,
                    reason: format!("empty title for {}", video_id),
                });
                continue;
            }

            if !seen.insert(video_id.clone()) {
                log::error!("Duplicate video id {} at record {}", video_id, position);
                return Err(SearchError::DuplicateVideoId(video_id));
            }

            prepared.push(PreparedRecord {
                title_text,
                transcript_text: normalize_text(&record.transcript),
                title: record.title,
                video_id,
            });
        }

        Ok(prepared)
    }

    fn embed_chunked(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            vectors.extend(self.engine.embed_batch(chunk)?);
        }
        Ok(vectors)
    }
}
