//! Raw video records
//!
//! Input to the index builder, as supplied by the ingestion side.

use serde::{Deserialize, Serialize};

/// One ingested video with its raw text fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Platform-assigned video identifier
    pub video_id: String,
    /// Video title as published
    pub title: String,
    /// Spoken transcript; empty when the video has no captions
    #[serde(default)]
    pub transcript: String,
}

impl VideoRecord {
    pub fn new(
        video_id: impl Into<String>,
        title: impl Into<String>,
        transcript: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            transcript: transcript.into(),
        }
    }

    /// Record without captions
    pub fn untranscribed(video_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(video_id, title, String::new())
    }

    /// Video id with surrounding whitespace removed
    pub fn id(&self) -> &str {
        self.video_id.trim()
    }
}

/// Row of the video metadata table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMeta {
    pub video_id: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserialize_without_transcript() {
        let json = r#"{"video_id":"dQw4w9WgXcQ","title":"Never Gonna Give You Up"}"#;
        let record: VideoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.video_id, "dQw4w9WgXcQ");
        assert!(record.transcript.is_empty());
    }

    #[test]
    fn test_id_is_trimmed() {
        let record = VideoRecord::untranscribed("  abc \n", "t");
        assert_eq!(record.id(), "abc");
    }
}
