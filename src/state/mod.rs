//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageOutcome`: what happened to a single detail page
//! - `VisitedSet`: per-run set of URLs that have been claimed for fetching

mod page_state;
mod visited;

// Re-export main types
pub use page_state::PageOutcome;
pub use visited::VisitedSet;
