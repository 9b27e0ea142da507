//! Chunk export for the vector-store ingestion job
//!
//! Record files written by the crawler are rendered as `key: value` text,
//! split into overlapping windows and written as JSON Lines. Embedding and
//! upload happen outside this crate.

mod chunker;

pub use chunker::{FixedChunker, TextChunk};

use crate::config::{Config, SiteConfig};
use crate::output::{ExtractedRecord, FieldValue, RecordSink};
use crate::ScoutError;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One line of the export file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkLine {
    pub collection: String,
    pub document: String,
    pub chunk_index: usize,
    pub text: String,
}

/// Totals of one export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub documents: usize,
    pub chunks: usize,
    pub skipped: usize,
}

/// Renders a record as `key: value` lines; null fields are left out
pub fn render_record(record: &ExtractedRecord) -> String {
    let mut text = format!("url: {}\n", record.url);
    for (key, value) in &record.fields {
        match value {
            Some(FieldValue::Text(value)) => text.push_str(&format!("{}: {}\n", key, value)),
            Some(FieldValue::List(items)) => {
                text.push_str(&format!("{}:\n", key));
                for item in items {
                    text.push_str(&format!("- {}\n", item));
                }
            }
            None => {}
        }
    }
    text
}

/// Exports every selected site into the configured JSON Lines file
pub fn export_chunks(config: &Config, sites: &[&SiteConfig]) -> Result<ExportReport, ScoutError> {
    let chunker = FixedChunker::new(config.ingest.chunk_chars, config.ingest.overlap_chars)?;
    let destination = Path::new(&config.ingest.output_path);
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(destination)?);
    let mut total = ExportReport::default();
    for site in sites {
        let sink = RecordSink::for_site(&config.output, site);
        let report = export_dir(sink.dir(), site.collection_name(), &chunker, &mut writer)?;
        tracing::info!(
            "Exported {} chunks from {} records for {}",
            report.chunks,
            report.documents,
            site.name
        );
        total.documents += report.documents;
        total.chunks += report.chunks;
        total.skipped += report.skipped;
    }
    writer.flush()?;

    tracing::info!(
        "Wrote {} chunks to {}",
        total.chunks,
        destination.display()
    );
    Ok(total)
}

/// Chunks every record file in `dir` into `writer`
///
/// Files are visited in name order. A file that is not a valid record is
/// logged and skipped.
pub fn export_dir(
    dir: &Path,
    collection: &str,
    chunker: &FixedChunker,
    writer: &mut impl Write,
) -> Result<ExportReport, ScoutError> {
    let mut report = ExportReport::default();
    if !dir.is_dir() {
        tracing::warn!("No record directory at {}", dir.display());
        return Ok(report);
    }

    for path in record_files(dir)? {
        let record = match read_record(&path) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                report.skipped += 1;
                continue;
            }
        };

        let document = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| record.url.clone());

        for chunk in chunker.chunk(&render_record(&record)) {
            let line = ChunkLine {
                collection: collection.to_string(),
                document: document.clone(),
                chunk_index: chunk.index,
                text: chunk.text,
            };
            serde_json::to_writer(&mut *writer, &line)?;
            writer.write_all(b"\n")?;
            report.chunks += 1;
        }
        report.documents += 1;
    }

    Ok(report)
}

fn record_files(dir: &Path) -> Result<Vec<PathBuf>, ScoutError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_record(path: &Path) -> Result<ExtractedRecord, ScoutError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| ScoutError::MalformedPayload {
        origin: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn record() -> ExtractedRecord {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), FieldValue::text("Tomato Soup"));
        fields.insert(
            "ingredients".to_string(),
            FieldValue::list(vec!["tomatoes".into(), "basil".into()]),
        );
        fields.insert("price".to_string(), None);
        ExtractedRecord::new("https://recipes.test/recipes/tomato-soup", fields)
    }

    #[test]
    fn test_render_record() {
        let text = render_record(&record());
        assert_eq!(
            text,
            "url: https://recipes.test/recipes/tomato-soup\n\
             ingredients:\n- tomatoes\n- basil\n\
             title: Tomato Soup\n"
        );
    }

    #[test]
    fn test_export_dir_skips_malformed() {
        let tmp = TempDir::new().unwrap();
        let sink = RecordSink::new(tmp.path());
        sink.write_record(&record()).unwrap();
        fs::write(tmp.path().join("broken.json"), "{oops").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let chunker = FixedChunker::new(1500, 125).unwrap();
        let mut out = Vec::new();
        let report = export_dir(tmp.path(), "recipes", &chunker, &mut out).unwrap();

        assert_eq!(
            report,
            ExportReport {
                documents: 1,
                chunks: 1,
                skipped: 1
            }
        );
        let line: ChunkLine = serde_json::from_slice(out.trim_ascii_end()).unwrap();
        assert_eq!(line.collection, "recipes");
        assert_eq!(line.document, "tomato-soup");
        assert_eq!(line.chunk_index, 0);
        assert!(line.text.contains("title: Tomato Soup"));
    }

    #[test]
    fn test_export_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let chunker = FixedChunker::new(10, 2).unwrap();
        let mut out = Vec::new();
        let report = export_dir(&tmp.path().join("absent"), "c", &chunker, &mut out).unwrap();
        assert_eq!(report, ExportReport::default());
        assert!(out.is_empty());
    }
}
