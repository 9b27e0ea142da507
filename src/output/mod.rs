//! Output module for records and run reports
//!
//! This module handles:
//! - The record shape written for every detail page
//! - Per-record files and per-site aggregate files
//! - Crawl statistics and the markdown run summary

mod markdown;
mod record;
mod sink;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary, RunSummary, SiteSummary};
pub use record::{ExtractedRecord, FieldValue, RESERVED_RECORD_KEYS};
pub use sink::{aggregate_path, flush, read_aggregate, RecordSink};
pub use stats::{print_statistics, CrawlStats, StatsSnapshot};
