use crate::url::normalize_url;
use std::collections::HashSet;
use std::sync::Mutex;

/// URLs claimed for fetching during one run
///
/// Shared by every detail worker. `claim` checks and inserts under one
/// lock, so two workers racing on the same link cannot both fetch it.
/// Keys are normalized URLs; unparseable URLs are keyed verbatim.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a URL; returns false if it was already claimed this run
    pub fn claim(&self, url: &str) -> bool {
        let key = Self::key(url);
        self.lock().insert(key)
    }

    pub fn contains(&self, url: &str) -> bool {
        let key = Self::key(url);
        self.lock().contains(&key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The key a URL is stored under
    pub fn key(url: &str) -> String {
        normalize_url(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.trim().to_string())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // A poisoned set still holds valid URLs; keep using it.
        self.urls.lock().unwrap_or_else(|e| e.into_inner())
    }
}
