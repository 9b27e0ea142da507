//! Record persistence: one file per record, one aggregate per run

use crate::config::{OutputConfig, SiteConfig};
use crate::output::record::ExtractedRecord;
use crate::url::path_slug;
use crate::ScoutError;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes accepted records into a site's category directory
///
/// Each record is written as soon as it is extracted, so an interrupted
/// run still leaves everything scraped so far on disk.
#[derive(Debug, Clone)]
pub struct RecordSink {
    dir: PathBuf,
}

impl RecordSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Sink for `<records-dir>/<category>/`
    pub fn for_site(output: &OutputConfig, site: &SiteConfig) -> Self {
        Self::new(Path::new(&output.records_dir).join(site.category_dir()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a record for `url` is written to
    pub fn record_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", path_slug(url)))
    }

    /// Writes one record as a pretty-printed JSON object
    ///
    /// Records whose every field is null are refused.
    pub fn write_record(&self, record: &ExtractedRecord) -> Result<PathBuf, ScoutError> {
        if !record.is_accepted() {
            return Err(ScoutError::EmptyRecord {
                url: record.url.clone(),
            });
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.record_path(&record.url);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json)?;

        tracing::debug!("Wrote record {} to {}", record.url, path.display());
        Ok(path)
    }
}

/// Location of a site's aggregate file: `<records-dir>/<site>.json`
pub fn aggregate_path(output: &OutputConfig, site: &SiteConfig) -> PathBuf {
    Path::new(&output.records_dir).join(format!("{}.json", site.name))
}

/// Serializes records, in order, as a JSON array at `destination`
pub fn flush(records: &[ExtractedRecord], destination: &Path) -> Result<(), ScoutError> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(records)?;
    fs::write(destination, json)?;

    tracing::info!(
        "Saved {} records to {}",
        records.len(),
        destination.display()
    );
    Ok(())
}

/// Reads an aggregate file written by [`flush`]
pub fn read_aggregate(path: &Path) -> Result<Vec<ExtractedRecord>, ScoutError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| ScoutError::MalformedPayload {
        origin: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::FieldValue;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn record(url: &str, title: Option<&str>) -> ExtractedRecord {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), title.and_then(FieldValue::text));
        fields.insert(
            "images".to_string(),
            FieldValue::list(vec![format!("{}/a.jpg", url)]),
        );
        ExtractedRecord::new(url, fields)
    }

    #[test]
    fn test_write_record_uses_slug() {
        let tmp = TempDir::new().unwrap();
        let sink = RecordSink::new(tmp.path().join("ecommerce_sites"));

        let path = sink
            .write_record(&record("https://shop.test/products/stock-pot", Some("Pot")))
            .unwrap();

        assert_eq!(path, tmp.path().join("ecommerce_sites/stock-pot.json"));
        let written: ExtractedRecord =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written.text("title"), Some("Pot"));
    }

    #[test]
    fn test_write_record_refuses_all_null() {
        let tmp = TempDir::new().unwrap();
        let sink = RecordSink::new(tmp.path());
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), None);
        let empty = ExtractedRecord::new("https://shop.test/products/ghost", fields);

        assert!(matches!(
            sink.write_record(&empty),
            Err(ScoutError::EmptyRecord { .. })
        ));
        assert!(!sink.record_path(&empty.url).exists());
    }

    #[test]
    fn test_aggregate_round_trip_preserves_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/site.json");
        let records = vec![
            record("https://shop.test/products/c", Some("C")),
            record("https://shop.test/products/a", Some("A")),
            record("https://shop.test/products/b", None),
        ];

        flush(&records, &path).unwrap();
        let read_back = read_aggregate(&path).unwrap();

        assert_eq!(read_back, records);
    }

    #[test]
    fn test_empty_aggregate() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.json");
        flush(&[], &path).unwrap();
        assert!(read_aggregate(&path).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_aggregate() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            read_aggregate(&path),
            Err(ScoutError::MalformedPayload { .. })
        ));
    }
}
