//! JSON Lines import into the record store
//!
//! Each non-blank line is one `{"video_id", "title", "transcript"?}` object.
//! Lines that fail to parse or carry no id are skipped and reported; storage
//! failures abort the import.

use std::io::BufRead;
use std::path::Path;

use vidsearch_core::{RecordStore, VideoRecord};

use crate::error::ServerResult;

/// A line that was not imported
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<SkippedLine>,
}

/// Import every record from `reader` into `store`
pub fn import_records<R: BufRead>(store: &RecordStore, reader: R) -> ServerResult<ImportReport> {
    let mut report = ImportReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let mut record: VideoRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Line {}: invalid record: {}", line_no, e);
                report.skipped.push(SkippedLine {
                    line: line_no,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if record.id().is_empty() {
            tracing::warn!("Line {}: record has no video_id", line_no);
            report.skipped.push(SkippedLine {
                line: line_no,
                reason: "missing video_id".to_string(),
            });
            continue;
        }
        record.video_id = record.id().to_string();

        store.put_record(&record)?;
        report.imported += 1;
    }

    store.flush()?;
    tracing::info!(
        "Imported {} records ({} skipped)",
        report.imported,
        report.skipped.len()
    );
    Ok(report)
}

/// Import a JSON Lines file
pub fn import_file(store: &RecordStore, path: &Path) -> ServerResult<ImportReport> {
    let file = std::fs::File::open(path)?;
    import_records(store, std::io::BufReader::new(file))
}
