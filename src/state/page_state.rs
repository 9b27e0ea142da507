//! Detail page outcomes reported by the crawl driver
//!
//! The retry waves only care whether a page succeeded or failed; the
//! finer split feeds run statistics and logging.
use std::fmt;

/// Represents what happened when a detail page was crawled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOutcome {
    // ===== Success =====
    /// Record extracted, accepted and written to disk
    Saved,

    // ===== Skips =====
    /// URL was already claimed earlier in this run; nothing was fetched
    AlreadyVisited,

    /// Run was cancelled before the page was fetched
    Cancelled,

    // ===== Failures =====
    /// Every fetch attempt failed
    FetchFailed,

    /// Page fetched but every record field was null
    EmptyRecord,

    /// Record extracted but could not be written to disk
    WriteFailed,
}

impl PageOutcome {
    /// Returns true if a record was produced
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved)
    }

    /// Returns true if nothing was attempted
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::AlreadyVisited | Self::Cancelled)
    }

    /// Returns true if the page should be retried in a later wave
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed | Self::EmptyRecord | Self::WriteFailed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::AlreadyVisited => "already_visited",
            Self::Cancelled => "cancelled",
            Self::FetchFailed => "fetch_failed",
            Self::EmptyRecord => "empty_record",
            Self::WriteFailed => "write_failed",
        }
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PageOutcome; 6] = [
        PageOutcome::Saved,
        PageOutcome::AlreadyVisited,
        PageOutcome::Cancelled,
        PageOutcome::FetchFailed,
        PageOutcome::EmptyRecord,
        PageOutcome::WriteFailed,
    ];

    #[test]
    fn test_categories_are_exclusive() {
        for outcome in ALL {
            let hits = [
                outcome.is_success(),
                outcome.is_skipped(),
                outcome.is_failure(),
            ]
            .iter()
            .filter(|hit| **hit)
            .count();
            assert_eq!(hits, 1, "{} must fall in exactly one category", outcome);
        }
    }

    #[test]
    fn test_failures() {
        assert!(PageOutcome::FetchFailed.is_failure());
        assert!(PageOutcome::EmptyRecord.is_failure());
        assert!(!PageOutcome::AlreadyVisited.is_failure());
    }

    #[test]
    fn test_display() {
        assert_eq!(PageOutcome::EmptyRecord.to_string(), "empty_record");
    }
}
