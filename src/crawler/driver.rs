//! Crawl driver - listing pagination and detail page workers
//!
//! A [`Crawler`] owns everything one site run needs: the compiled
//! selectors, the fetcher, the record sink and the session state. It is
//! cheap to clone and every clone shares the same session.

use crate::config::{CrawlerConfig, OutputConfig, SiteConfig};
use crate::crawler::extractor::{ExtractionPlan, ListingLinks};
use crate::crawler::fetcher::{FetchFailure, Fetcher};
use crate::crawler::scheduler::ListingQueue;
use crate::crawler::session::CrawlSession;
use crate::output::{ExtractedRecord, RecordSink, StatsSnapshot};
use crate::state::{PageOutcome, VisitedSet};
use crate::ScoutError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

struct Inner {
    site: SiteConfig,
    plan: ExtractionPlan,
    fetcher: Fetcher,
    sink: RecordSink,
    workers: usize,
    session: CrawlSession,
    cancel: CancellationToken,
}

/// Site crawler bound to one crawl session
#[derive(Clone)]
pub struct Crawler {
    inner: Arc<Inner>,
}

impl Crawler {
    /// Builds a crawler from the run configuration
    pub fn new(
        site: &SiteConfig,
        crawler: &CrawlerConfig,
        output: &OutputConfig,
        cancel: CancellationToken,
    ) -> Result<Self, ScoutError> {
        let plan = ExtractionPlan::compile(site)?;
        let fetcher = Fetcher::new(crawler)?;
        let sink = RecordSink::for_site(output, site);
        Ok(Self::with_parts(
            site.clone(),
            plan,
            fetcher,
            sink,
            crawler.workers,
            cancel,
        ))
    }

    pub fn with_parts(
        site: SiteConfig,
        plan: ExtractionPlan,
        fetcher: Fetcher,
        sink: RecordSink,
        workers: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                site,
                plan,
                fetcher,
                sink,
                workers: workers.max(1),
                session: CrawlSession::new(),
                cancel,
            }),
        }
    }

    /// Same site and fetcher, empty visited set and record list
    pub fn fresh_session(&self) -> Self {
        Self::with_parts(
            self.inner.site.clone(),
            self.inner.plan.clone(),
            self.inner.fetcher.clone(),
            self.inner.sink.clone(),
            self.inner.workers,
            self.inner.cancel.clone(),
        )
    }

    pub fn site(&self) -> &SiteConfig {
        &self.inner.site
    }

    pub fn visited(&self) -> &VisitedSet {
        self.inner.session.visited()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.session.stats().snapshot()
    }

    pub fn records(&self) -> Vec<ExtractedRecord> {
        self.inner.session.records()
    }

    pub fn take_records(&self) -> Vec<ExtractedRecord> {
        self.inner.session.take_records()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Crawls a listing page and follows its pagination
    ///
    /// Listing pages are processed one at a time. The detail links of a
    /// page are crawled on the worker pool, and only once the pool has
    /// drained are that page's pagination links queued. Returns the number
    /// of listing pages fetched.
    pub async fn crawl_listing(&self, start_url: &str) -> u32 {
        let site = &self.inner.site;
        let visited = self.visited();
        let mut queue = ListingQueue::new(site.max_pages);
        queue.seed(start_url);

        let mut fetched = 0;
        while let Some(page) = queue.next() {
            if self.is_cancelled() {
                tracing::info!("Cancelled; {} listing pages left unvisited", queue.len() + 1);
                break;
            }
            if !visited.claim(&page.url) {
                tracing::debug!("Skipping visited listing page {}", page.url);
                continue;
            }

            tracing::info!("Crawling listing page {}: {}", page.depth, page.url);
            let links = match self.fetch_listing(&page.url).await {
                Ok(links) => links,
                Err(failure) if failure.cancelled => break,
                Err(_) => continue,
            };
            fetched += 1;

            tracing::debug!(
                "Found {} detail links and {} pagination links on {}",
                links.detail_links.len(),
                links.pagination_links.len(),
                page.url
            );
            self.crawl_detail_pages(links.detail_links).await;

            for next in &links.pagination_links {
                queue.enqueue_next(&page, next, visited);
            }
        }

        fetched
    }

    /// Fetches a listing page and extracts its links without crawling them
    pub async fn fetch_listing(&self, url: &str) -> Result<ListingLinks, FetchFailure> {
        let stats = self.inner.session.stats();
        match self.inner.fetcher.fetch(url, &self.inner.cancel).await {
            Ok(html) => {
                stats.record_listing(true);
                Ok(self.inner.plan.extract_listing(&html, url))
            }
            Err(failure) => {
                if !failure.cancelled {
                    stats.record_listing(false);
                }
                Err(failure)
            }
        }
    }

    /// Crawls detail pages on the bounded worker pool and waits for all
    pub async fn crawl_detail_pages(&self, urls: Vec<String>) -> Vec<(String, PageOutcome)> {
        let semaphore = Arc::new(Semaphore::new(self.inner.workers));
        let mut workers = JoinSet::new();

        for url in urls {
            if self.is_cancelled() {
                break;
            }
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let crawler = self.clone();
            workers.spawn(async move {
                let _permit = permit;
                let outcome = crawler.crawl_detail_page(&url).await;
                (url, outcome)
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(result) => outcomes.push(result),
                Err(e) => tracing::error!("Detail worker failed: {}", e),
            }
        }
        outcomes
    }

    /// Crawls one detail page
    ///
    /// A URL already claimed in this session is not fetched again. An
    /// accepted record is written to its own file and kept for the
    /// aggregate; afterwards the worker sleeps for the site's delay.
    pub async fn crawl_detail_page(&self, url: &str) -> PageOutcome {
        let inner = &self.inner;
        let stats = inner.session.stats();

        if self.is_cancelled() {
            stats.record_outcome(PageOutcome::Cancelled);
            return PageOutcome::Cancelled;
        }
        if !self.visited().claim(url) {
            tracing::debug!("Skipping visited detail page {}", url);
            stats.record_outcome(PageOutcome::AlreadyVisited);
            return PageOutcome::AlreadyVisited;
        }

        let outcome = match inner.fetcher.fetch(url, &inner.cancel).await {
            Err(failure) if failure.cancelled => PageOutcome::Cancelled,
            Err(_) => PageOutcome::FetchFailed,
            Ok(html) => self.save_record(inner.plan.extract_record(&html, url)),
        };
        stats.record_outcome(outcome);

        if outcome != PageOutcome::Cancelled {
            let delay = inner.site.delay_range.sample();
            tokio::select! {
                _ = inner.cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }

        outcome
    }

    fn save_record(&self, record: ExtractedRecord) -> PageOutcome {
        if !record.is_accepted() {
            tracing::warn!("No fields matched on {}; record discarded", record.url);
            return PageOutcome::EmptyRecord;
        }

        match self.inner.sink.write_record(&record) {
            Ok(_) => {
                tracing::info!("Scraped record: {}", record.label());
                self.inner.session.push_record(record);
                PageOutcome::Saved
            }
            Err(e) => {
                tracing::error!("Failed to write record for {}: {}", record.url, e);
                PageOutcome::WriteFailed
            }
        }
    }
}
