//! Seed harvesting: the crawl operation driven by the retry waves
//!
//! A seed is either a detail page, crawled on its own, or a listing page
//! whose detail links are crawled in one go. Pagination is not followed
//! here; wave seeds name the listing pages to visit.

use crate::crawler::Crawler;
use crate::output::{ExtractedRecord, StatsSnapshot};
use crate::state::PageOutcome;
use crate::storage::{LedgerStore, StorageResult};
use crate::url::is_detail_url;
use crate::waves::{RetryLedger, WaveOutcome};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

struct HarvestState {
    cycle: usize,
    crawler: Crawler,
    /// Links found through a listing seed; they are details in later cycles
    /// and, once persisted, in later invocations
    known_details: HashSet<String>,
    records: Vec<ExtractedRecord>,
    stats: StatsSnapshot,
}

/// Wave operation over one site's seeds
///
/// Cloning shares state, so each call of the wave operation can own a
/// handle. Every new cycle switches to a fresh crawl session.
#[derive(Clone)]
pub struct SeedHarvester {
    state: Arc<Mutex<HarvestState>>,
}

impl SeedHarvester {
    /// Harvester that treats `details` as detail pages from the first cycle
    pub fn with_known_details(crawler: Crawler, details: impl IntoIterator<Item = String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(HarvestState {
                cycle: 1,
                crawler,
                known_details: details.into_iter().collect(),
                records: Vec::new(),
                stats: StatsSnapshot::default(),
            })),
        }
    }

    /// Harvester seeded with the detail links persisted by earlier runs
    pub fn resume(crawler: Crawler, store: &dyn LedgerStore) -> StorageResult<Self> {
        let details = RetryLedger::load(store)?.details;
        if !details.is_empty() {
            tracing::debug!("Loaded {} known detail links", details.len());
        }
        Ok(Self::with_known_details(crawler, details))
    }

    /// Drives one seed within `cycle`
    pub async fn harvest(&self, cycle: usize, url: String) -> WaveOutcome {
        let (crawler, known_detail) = {
            let mut state = self.lock();
            let crawler = state.crawler_for(cycle);
            (crawler, state.known_details.contains(&url))
        };

        if known_detail || is_detail_url(&url, &crawler.site().detail_markers) {
            let outcome = crawler.crawl_detail_page(&url).await;
            return detail_outcome(url, outcome);
        }

        let links = match crawler.fetch_listing(&url).await {
            Ok(links) => links,
            Err(failure) => {
                tracing::warn!("Listing seed {} failed: {}", url, failure);
                return WaveOutcome::failure(url);
            }
        };
        if links.detail_links.is_empty() {
            tracing::warn!("No detail links found on {}", url);
            return WaveOutcome::failure(url);
        }

        tracing::info!("Found {} detail links on {}", links.detail_links.len(), url);
        self.lock()
            .known_details
            .extend(links.detail_links.iter().cloned());

        let mut outcome = WaveOutcome {
            discovered: links.detail_links.clone(),
            ..WaveOutcome::default()
        };
        let results = crawler.crawl_detail_pages(links.detail_links).await;
        for (link, page) in results {
            match page {
                PageOutcome::Saved => outcome.succeeded.push(link),
                // Claimed by another seed earlier in this cycle
                PageOutcome::AlreadyVisited => {}
                PageOutcome::Cancelled
                | PageOutcome::FetchFailed
                | PageOutcome::EmptyRecord
                | PageOutcome::WriteFailed => outcome.failed.push(link),
            }
        }

        if crawler.is_cancelled() {
            outcome.failed.push(url);
        } else {
            outcome.succeeded.insert(0, url);
        }
        outcome
    }

    /// Collects every record and the summed statistics of all cycles
    pub fn finish(&self) -> (Vec<ExtractedRecord>, StatsSnapshot) {
        let mut state = self.lock();
        state.collect_session();
        (std::mem::take(&mut state.records), state.stats)
    }

    fn lock(&self) -> MutexGuard<'_, HarvestState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HarvestState {
    fn crawler_for(&mut self, cycle: usize) -> Crawler {
        if cycle != self.cycle {
            self.collect_session();
            self.cycle = cycle;
            tracing::debug!("Started crawl session for cycle {}", cycle);
        }
        self.crawler.clone()
    }

    fn collect_session(&mut self) {
        self.records.extend(self.crawler.take_records());
        self.stats = self.stats.merge(&self.crawler.stats());
        // Stats of a collected session must not be counted twice
        self.crawler = self.crawler.fresh_session();
    }
}

fn detail_outcome(url: String, outcome: PageOutcome) -> WaveOutcome {
    match outcome {
        PageOutcome::Saved => WaveOutcome::success(url),
        PageOutcome::AlreadyVisited => WaveOutcome::default(),
        _ => WaveOutcome::failure(url),
    }
}
