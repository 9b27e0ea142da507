//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Selector-driven record extraction
//! - The listing-page work queue
//! - Overall crawl coordination across detail workers

mod driver;
mod extractor;
mod fetcher;
mod parser;
mod scheduler;
mod session;

pub use driver::Crawler;
pub use extractor::{parse_price, ExtractionPlan, ListingLinks};
pub use fetcher::{build_http_client, random_user_agent, FetchFailure, Fetcher, USER_AGENTS};
pub use parser::{meta_description, resolve_link, select_links};
pub use scheduler::{ListingPage, ListingQueue};
pub use session::CrawlSession;
