//! Index artifact on disk
//!
//! One bincode file: a small header followed by columnar data. Vectors are
//! stored as flat `f32` columns of `entries * dimension` components. A video
//! without a transcript has an all-zero transcript row and `has_transcript ==
//! false`; only the flag is consulted on load.
//!
//! Writes go to a temporary file in the destination directory and are renamed
//! into place, so a reader sees either the old artifact or the new one.

use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Result, SearchError};
use crate::index::{IndexEntry, IndexMetadata, TranscriptVector, VideoIndex};

const MAGIC: [u8; 8] = *b"VIDSRCH\0";
/// Artifact format version written by this build
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactHeader {
    magic: [u8; 8],
    format_version: u32,
    model: String,
    dimension: u32,
    entries: u64,
    built_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Columns {
    video_ids: Vec<String>,
    titles: Vec<String>,
    title_embeddings: Vec<f32>,
    transcript_embeddings: Vec<f32>,
    has_transcript: Vec<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Artifact {
    header: ArtifactHeader,
    columns: Columns,
}

/// Write `index` to `path`, atomically replacing any existing artifact
pub fn write_index(index: &VideoIndex, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let artifact = to_artifact(index);

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        bincode::serialize_into(&mut writer, &artifact)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| SearchError::Io(e.error))?;

    log::info!(
        "Wrote index artifact: {} ({} videos, {}d)",
        path.display(),
        index.len(),
        index.dimension()
    );
    Ok(())
}

/// Read and validate an artifact
pub fn read_index(path: impl AsRef<Path>) -> Result<VideoIndex> {
    let path = path.as_ref();
    // Whole-file read: length prefixes are then bounds-checked against the buffer
    let bytes = std::fs::read(path)?;
    let artifact: Artifact = bincode::deserialize(&bytes)
        .map_err(|e| SearchError::corrupt(format!("{}: {}", path.display(), e)))?;

    let index = from_artifact(artifact)?;
    log::info!(
        "Loaded index artifact: {} ({} videos, model {})",
        path.display(),
        index.len(),
        index.metadata().model
    );
    Ok(index)
}

fn to_artifact(index: &VideoIndex) -> Artifact {
    let dim = index.dimension();
    let n = index.len();
    let mut columns = Columns {
        video_ids: Vec::with_capacity(n),
        titles: Vec::with_capacity(n),
        title_embeddings: Vec::with_capacity(n * dim),
        transcript_embeddings: Vec::with_capacity(n * dim),
        has_transcript: Vec::with_capacity(n),
    };

    for entry in index.entries() {
        columns.video_ids.push(entry.video_id.clone());
        columns.titles.push(entry.title.clone());
        columns.title_embeddings.extend_from_slice(&entry.title_embedding);
        match &entry.transcript_embedding {
            TranscriptVector::Embedded(v) => {
                columns.transcript_embeddings.extend_from_slice(v);
                columns.has_transcript.push(true);
            }
            TranscriptVector::Missing => {
                columns
                    .transcript_embeddings
                    .extend(std::iter::repeat(0.0).take(dim));
                columns.has_transcript.push(false);
            }
        }
    }

    let metadata = index.metadata();
    Artifact {
        header: ArtifactHeader {
            magic: MAGIC,
            format_version: FORMAT_VERSION,
            model: metadata.model.clone(),
            dimension: dim as u32,
            entries: n as u64,
            built_at: metadata.built_at,
        },
        columns,
    }
}

fn from_artifact(artifact: Artifact) -> Result<VideoIndex> {
    let Artifact { header, columns } = artifact;

    if header.magic != MAGIC {
        return Err(SearchError::corrupt("not a vidsearch index (bad magic)"));
    }
    if header.format_version != FORMAT_VERSION {
        return Err(SearchError::corrupt(format!(
            "unsupported format version {} (expected {})",
            header.format_version, FORMAT_VERSION
        )));
    }

    let dim = header.dimension as usize;
    let n = usize::try_from(header.entries)
        .map_err(|_| SearchError::corrupt("entry count overflows usize"))?;
    if dim == 0 {
        return Err(SearchError::corrupt("zero dimension"));
    }

    let expected_floats = n
        .checked_mul(dim)
        .ok_or_else(|| SearchError::corrupt("column size overflows usize"))?;
    if columns.video_ids.len() != n
        || columns.titles.len() != n
        || columns.has_transcript.len() != n
        || columns.title_embeddings.len() != expected_floats
        || columns.transcript_embeddings.len() != expected_floats
    {
        return Err(SearchError::corrupt(format!(
            "column lengths disagree with header ({} entries, {}d)",
            n, dim
        )));
    }

    let entries: Vec<IndexEntry> = columns
        .video_ids
        .into_iter()
        .zip(columns.titles)
        .zip(columns.title_embeddings.chunks_exact(dim))
        .zip(columns.transcript_embeddings.chunks_exact(dim))
        .zip(columns.has_transcript)
        .map(|((((video_id, title), title_row), transcript_row), has)| IndexEntry {
            video_id,
            title,
            title_embedding: title_row.to_vec(),
            transcript_embedding: if has {
                TranscriptVector::Embedded(transcript_row.to_vec())
            } else {
                TranscriptVector::Missing
            },
        })
        .collect();

    let metadata = IndexMetadata {
        model: header.model,
        dimension: dim,
        built_at: header.built_at,
    };

    VideoIndex::new(metadata, entries).map_err(|e| match e {
        SearchError::CorruptArtifact(_) => e,
        other => SearchError::corrupt(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_index() -> VideoIndex {
        VideoIndex::new(
            IndexMetadata::new("static", 4),
            vec![
                IndexEntry {
                    video_id: "a".into(),
                    title: "Neural networks basics".into(),
                    title_embedding: vec![0.1, 0.2, 0.3, 0.4],
                    transcript_embedding: TranscriptVector::Embedded(vec![0.5, 0.6, 0.7, 0.8]),
                },
                IndexEntry {
                    video_id: "b".into(),
                    title: "Baking sourdough bread".into(),
                    title_embedding: vec![-0.1, 0.0, 0.0, 1.0],
                    transcript_embedding: TranscriptVector::Missing,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_write_then_read_preserves_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.bin");
        let index = sample_index();

        write_index(&index, &path).unwrap();
        let loaded = read_index(&path).unwrap();

        assert_eq!(loaded.entries(), index.entries());
        assert_eq!(loaded.metadata(), index.metadata());
        assert!(loaded.get("b").unwrap().transcript_embedding.is_missing());
    }

    #[test]
    fn test_overwrite_replaces_previous_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.bin");

        write_index(&sample_index(), &path).unwrap();
        write_index(&VideoIndex::empty("static", 4), &path).unwrap();

        assert!(read_index(&path).unwrap().is_empty());
        // no temporary files left behind
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_garbage_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.bin");
        std::fs::write(&path, b"definitely not bincode").unwrap();

        assert!(matches!(
            read_index(&path),
            Err(SearchError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_bad_magic_is_corrupt() {
        let mut artifact = to_artifact(&sample_index());
        artifact.header.magic = *b"NOTMAGIC";
        assert!(matches!(
            from_artifact(artifact),
            Err(SearchError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_truncated_column_is_corrupt() {
        let mut artifact = to_artifact(&sample_index());
        artifact.columns.title_embeddings.pop();
        assert!(matches!(
            from_artifact(artifact),
            Err(SearchError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_on_disk_are_corrupt() {
        let mut artifact = to_artifact(&sample_index());
        artifact.columns.video_ids[1] = "a".into();
        assert!(matches!(
            from_artifact(artifact),
            Err(SearchError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            read_index("/nonexistent/index.bin"),
            Err(SearchError::Io(_))
        ));
    }
}
