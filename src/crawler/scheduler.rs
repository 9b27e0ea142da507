//! Listing-page work queue
//!
//! Pagination is walked breadth-first through an explicit queue rather
//! than recursion. Every entry carries its depth so the queue can refuse
//! pages beyond the site's `max-pages`.

use crate::state::VisitedSet;
use std::collections::{HashSet, VecDeque};

/// A listing page waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub url: String,
    /// 1 for the start page, +1 per pagination hop
    pub depth: u32,
}

/// FIFO of listing pages bounded by pagination depth
#[derive(Debug)]
pub struct ListingQueue {
    queue: VecDeque<ListingPage>,
    /// Keys of every URL ever enqueued
    queued: HashSet<String>,
    max_pages: u32,
}

impl ListingQueue {
    pub fn new(max_pages: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            max_pages,
        }
    }

    /// Enqueues a start page at depth 1
    pub fn seed(&mut self, url: &str) -> bool {
        if self.max_pages == 0 {
            return false;
        }
        self.push(url, 1)
    }

    /// Enqueues a pagination link found on `parent`
    ///
    /// Refused when the link was already visited or queued, or when it
    /// would exceed `max-pages`.
    pub fn enqueue_next(&mut self, parent: &ListingPage, url: &str, visited: &VisitedSet) -> bool {
        let depth = parent.depth + 1;
        if depth > self.max_pages {
            tracing::debug!("Not following {}: max pages ({}) reached", url, self.max_pages);
            return false;
        }
        if visited.contains(url) {
            return false;
        }
        self.push(url, depth)
    }

    pub fn next(&mut self) -> Option<ListingPage> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn push(&mut self, url: &str, depth: u32) -> bool {
        if !self.queued.insert(VisitedSet::key(url)) {
            return false;
        }
        self.queue.push_back(ListingPage {
            url: url.to_string(),
            depth,
        });
        true
    }
}
