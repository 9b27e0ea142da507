use crate::output::{CrawlStats, ExtractedRecord};
use crate::state::VisitedSet;
use std::sync::Mutex;

/// Mutable state of one crawl run
///
/// Shared by reference-counting into every detail worker. A wave cycle
/// starts a new session so URLs that failed earlier may be fetched again.
#[derive(Debug, Default)]
pub struct CrawlSession {
    visited: VisitedSet,
    records: Mutex<Vec<ExtractedRecord>>,
    stats: CrawlStats,
}

impl CrawlSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn push_record(&self, record: ExtractedRecord) {
        self.lock_records().push(record);
    }

    /// Copy of the records collected so far, in completion order
    pub fn records(&self) -> Vec<ExtractedRecord> {
        self.lock_records().clone()
    }

    /// Drains the collected records
    pub fn take_records(&self) -> Vec<ExtractedRecord> {
        std::mem::take(&mut *self.lock_records())
    }

    pub fn record_count(&self) -> usize {
        self.lock_records().len()
    }

    fn lock_records(&self) -> std::sync::MutexGuard<'_, Vec<ExtractedRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}
