//! Crawl statistics collected while a run is in flight
//!
//! Counters are atomics because detail workers update them concurrently.

use crate::state::PageOutcome;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for one crawl session
#[derive(Debug, Default)]
pub struct CrawlStats {
    listing_pages: AtomicU64,
    listing_failures: AtomicU64,
    records_saved: AtomicU64,
    empty_records: AtomicU64,
    fetch_failures: AtomicU64,
    write_failures: AtomicU64,
    skipped: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_listing(&self, fetched: bool) {
        if fetched {
            self.listing_pages.fetch_add(1, Ordering::Relaxed);
        } else {
            self.listing_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_outcome(&self, outcome: PageOutcome) {
        let counter = match outcome {
            PageOutcome::Saved => &self.records_saved,
            PageOutcome::EmptyRecord => &self.empty_records,
            PageOutcome::FetchFailed => &self.fetch_failures,
            PageOutcome::WriteFailed => &self.write_failures,
            PageOutcome::AlreadyVisited | PageOutcome::Cancelled => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            listing_pages: self.listing_pages.load(Ordering::Relaxed),
            listing_failures: self.listing_failures.load(Ordering::Relaxed),
            records_saved: self.records_saved.load(Ordering::Relaxed),
            empty_records: self.empty_records.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CrawlStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub listing_pages: u64,
    pub listing_failures: u64,
    pub records_saved: u64,
    pub empty_records: u64,
    pub fetch_failures: u64,
    pub write_failures: u64,
    pub skipped: u64,
}

impl StatsSnapshot {
    /// Detail pages that were actually fetched or attempted
    pub fn detail_pages(&self) -> u64 {
        self.records_saved + self.empty_records + self.fetch_failures + self.write_failures
    }

    pub fn failures(&self) -> u64 {
        self.listing_failures + self.empty_records + self.fetch_failures + self.write_failures
    }

    /// Share of attempted detail pages that produced a record
    pub fn success_rate(&self) -> f64 {
        let attempted = self.detail_pages();
        if attempted == 0 {
            return 0.0;
        }
        (self.records_saved as f64 / attempted as f64) * 100.0
    }

    /// Sums two snapshots (used to total wave cycles)
    pub fn merge(&self, other: &StatsSnapshot) -> StatsSnapshot {
        StatsSnapshot {
            listing_pages: self.listing_pages + other.listing_pages,
            listing_failures: self.listing_failures + other.listing_failures,
            records_saved: self.records_saved + other.records_saved,
            empty_records: self.empty_records + other.empty_records,
            fetch_failures: self.fetch_failures + other.fetch_failures,
            write_failures: self.write_failures + other.write_failures,
            skipped: self.skipped + other.skipped,
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(site: &str, stats: &StatsSnapshot) {
    println!("=== Crawl Statistics: {} ===\n", site);

    println!("Listing pages:");
    println!("  Fetched: {}", stats.listing_pages);
    println!("  Failed: {}", stats.listing_failures);
    println!();

    println!("Detail pages:");
    println!("  Attempted: {}", stats.detail_pages());
    println!(
        "  Records saved: {} ({:.1}%)",
        stats.records_saved,
        stats.success_rate()
    );
    println!("  Empty records: {}", stats.empty_records);
    println!("  Fetch failures: {}", stats.fetch_failures);
    println!("  Write failures: {}", stats.write_failures);
    println!("  Skipped: {}", stats.skipped);
    println!();
}
