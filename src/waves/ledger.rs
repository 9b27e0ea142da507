use crate::storage::{LedgerList, LedgerStore, StorageError, StorageResult};
use std::collections::HashSet;

/// In-memory view of a site's retry ledger
///
/// `processed` only ever grows. A URL that succeeded in any cycle is never
/// pending again, so `processed` and `pending` stay disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryLedger {
    pub pending: Vec<String>,
    pub failed: Vec<String>,
    pub processed: Vec<String>,
    /// Links discovered on listing seeds, kept across invocations
    pub details: Vec<String>,
    /// URLs of the current cycle that were never driven (cancellation)
    deferred: Vec<String>,
}

impl RetryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every list from the store
    ///
    /// A malformed list is logged and treated as empty; any other storage
    /// error is returned.
    pub fn load(store: &dyn LedgerStore) -> StorageResult<Self> {
        Ok(Self {
            pending: load_list(store, LedgerList::Pending)?,
            failed: load_list(store, LedgerList::Failed)?,
            processed: load_list(store, LedgerList::Processed)?,
            details: load_list(store, LedgerList::Details)?,
            deferred: Vec::new(),
        })
    }

    pub fn is_processed(&self, url: &str) -> bool {
        self.processed.iter().any(|p| p == url)
    }

    /// Starts a cycle over `urls`
    pub fn begin_cycle(&mut self, urls: &[String]) {
        self.pending = dedup(urls.iter().cloned());
        self.failed.clear();
        self.deferred.clear();
    }

    /// Appends failures, skipping URLs already recorded this cycle
    pub fn record_failed(&mut self, urls: impl IntoIterator<Item = String>) {
        for url in urls {
            if !self.failed.contains(&url) {
                self.failed.push(url);
            }
        }
    }

    /// Remembers links discovered as detail pages
    pub fn record_details(&mut self, urls: impl IntoIterator<Item = String>) {
        for url in urls {
            if !self.details.contains(&url) {
                self.details.push(url);
            }
        }
    }

    /// Marks URLs left undriven when a cycle is interrupted
    pub fn defer(&mut self, urls: impl IntoIterator<Item = String>) {
        self.deferred.extend(urls);
    }

    /// Closes a cycle and returns the URLs for the next one
    ///
    /// `processed` gains every succeeded URL that did not also fail this
    /// cycle; `pending` becomes the cycle's failures plus deferred URLs,
    /// minus anything already processed.
    pub fn finish_cycle(&mut self, succeeded: &[String]) -> Vec<String> {
        let failed: HashSet<&str> = self.failed.iter().map(String::as_str).collect();
        let mut processed: HashSet<String> = self.processed.iter().cloned().collect();

        for url in succeeded {
            if !failed.contains(url.as_str()) && processed.insert(url.clone()) {
                self.processed.push(url.clone());
            }
        }

        self.pending = dedup(
            self.failed
                .iter()
                .chain(self.deferred.iter())
                .filter(|url| !processed.contains(*url))
                .cloned(),
        );
        self.deferred.clear();
        self.pending.clone()
    }

    /// Persists what changes while a cycle runs: failures and discovered details
    pub fn save_progress(&self, store: &mut dyn LedgerStore) -> StorageResult<()> {
        store.save(LedgerList::Failed, &self.failed)?;
        store.save(LedgerList::Details, &self.details)
    }

    /// Persists every list
    pub fn save(&self, store: &mut dyn LedgerStore) -> StorageResult<()> {
        store.save(LedgerList::Pending, &self.pending)?;
        store.save(LedgerList::Failed, &self.failed)?;
        store.save(LedgerList::Processed, &self.processed)?;
        store.save(LedgerList::Details, &self.details)
    }
}

fn load_list(store: &dyn LedgerStore, list: LedgerList) -> StorageResult<Vec<String>> {
    match store.load(list) {
        Ok(urls) => Ok(urls),
        Err(StorageError::MalformedPayload { origin, message }) => {
            tracing::error!("Ignoring malformed {} ledger {}: {}", list, origin, message);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Removes duplicates, keeping first occurrences in order
pub(crate) fn dedup(urls: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
