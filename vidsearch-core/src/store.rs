//! RocksDB raw record tables
//!
//! Holds what the ingestion side collected: the video metadata table
//! (`video:{id}` → JSON [`VideoMeta`]) and the transcript table
//! (`transcript:{id}` → UTF-8 text). Only the index builder reads it.

use rocksdb::{Direction, IteratorMode, Options, DB};
use std::path::Path;

use crate::error::Result;
use crate::record::{VideoMeta, VideoRecord};

const VIDEO_PREFIX: &str = "video:";
const TRANSCRIPT_PREFIX: &str = "transcript:";

/// RocksDB-based store of raw video records
pub struct RecordStore {
    db: DB,
}

impl RecordStore {
    /// Open (or create) a RecordStore at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_background_jobs(2);
        opts.set_bytes_per_sync(1048576); // 1MB
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path)?;
        log::info!("RecordStore opened at: {}", path.display());

        Ok(Self { db })
    }

    /// Insert or replace a video's metadata row
    pub fn put_video(&self, meta: &VideoMeta) -> Result<()> {
        let key = format!("{}{}", VIDEO_PREFIX, meta.video_id);
        self.db.put(key.as_bytes(), serde_json::to_vec(meta)?)?;
        Ok(())
    }

    /// Insert or replace a video's transcript
    pub fn put_transcript(&self, video_id: &str, transcript: &str) -> Result<()> {
        let key = format!("{}{}", TRANSCRIPT_PREFIX, video_id);
        self.db.put(key.as_bytes(), transcript.as_bytes())?;
        Ok(())
    }

    /// Store both tables' rows for one record
    pub fn put_record(&self, record: &VideoRecord) -> Result<()> {
        self.put_video(&VideoMeta {
            video_id: record.video_id.clone(),
            title: record.title.clone(),
        })?;
        if record.transcript.is_empty() {
            // a re-import without captions must not keep a stale transcript
            self.db
                .delete(format!("{}{}", TRANSCRIPT_PREFIX, record.video_id).as_bytes())?;
        } else {
            self.put_transcript(&record.video_id, &record.transcript)?;
        }
        Ok(())
    }

    /// Transcript for a video, if one was stored
    pub fn transcript(&self, video_id: &str) -> Result<Option<String>> {
        let key = format!("{}{}", TRANSCRIPT_PREFIX, video_id);
        Ok(self
            .db
            .get(key.as_bytes())?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Join both tables into records, ordered by video id.
    ///
    /// Metadata rows that fail to decode are logged and skipped. A video with
    /// no transcript row gets an empty transcript.
    pub fn load_records(&self) -> Result<Vec<VideoRecord>> {
        let mut records = Vec::new();
        let mut skipped = 0;
        let iter = self.db.iterator(IteratorMode::From(
            VIDEO_PREFIX.as_bytes(),
            Direction::Forward,
        ));

        for item in iter {
            let (key, value) = item?;
            let key_str = String::from_utf8_lossy(&key);
            let Some(id) = key_str.strip_prefix(VIDEO_PREFIX) else {
                break;
            };

            match serde_json::from_slice::<VideoMeta>(&value) {
                Ok(meta) => {
                    let transcript = self.transcript(id)?.unwrap_or_default();
                    records.push(VideoRecord {
                        video_id: meta.video_id,
                        title: meta.title,
                        transcript,
                    });
                }
                Err(e) => {
                    log::warn!("Failed to decode video row {}: {}. Skipping.", id, e);
                    skipped += 1;
                }
            }
        }

        log::info!("Loaded {} records from store", records.len());
        if skipped > 0 {
            log::warn!("Skipped {} records due to decode errors", skipped);
        }

        Ok(records)
    }

    /// Flush memtables to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_records_join_transcripts() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();

        store
            .put_record(&VideoRecord::new("b", "Baking sourdough bread", "flour water salt"))
            .unwrap();
        store
            .put_record(&VideoRecord::untranscribed("a", "Neural networks basics"))
            .unwrap();

        let records = store.load_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], VideoRecord::untranscribed("a", "Neural networks basics"));
        assert_eq!(records[1].transcript, "flour water salt");
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();

        store
            .put_record(&VideoRecord::untranscribed("good", "ok"))
            .unwrap();
        store.db.put(b"video:bad", b"{not json").unwrap();

        let records = store.load_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].video_id, "good");
    }

    #[test]
    fn test_reimport_without_transcript_clears_it() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();

        store
            .put_record(&VideoRecord::new("x", "title", "words"))
            .unwrap();
        store
            .put_record(&VideoRecord::untranscribed("x", "new title"))
            .unwrap();

        let records = store.load_records().unwrap();
        assert_eq!(records, vec![VideoRecord::untranscribed("x", "new title")]);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        {
            let store = RecordStore::open(dir.path()).unwrap();
            store
                .put_record(&VideoRecord::new("x", "title", "words"))
                .unwrap();
            store.flush().unwrap();
        }
        let store = RecordStore::open(dir.path()).unwrap();
        assert_eq!(store.load_records().unwrap().len(), 1);
    }
}
