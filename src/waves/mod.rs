//! Hierarchical retry waves
//!
//! This module handles:
//! - The persisted retry ledger (pending, failed, processed)
//! - The generic cycle driver, [`run_waves`]
//! - The crawl operation used for site seeds, [`SeedHarvester`]

mod harvester;
mod ledger;
mod orchestrator;

pub use harvester::SeedHarvester;
pub use ledger::RetryLedger;
pub use orchestrator::{run_waves, WaveOutcome, WavePolicy, WaveReport};

use crate::storage::{LedgerList, LedgerStore, StorageResult};

/// Chooses the URLs a wave run starts from
///
/// With `fresh` the ledger is wiped and the configured seeds are used.
/// Otherwise a non-empty persisted pending list resumes the previous run.
pub fn resume_seeds(
    store: &mut dyn LedgerStore,
    configured: &[String],
    fresh: bool,
) -> StorageResult<Vec<String>> {
    if fresh {
        store.clear()?;
        return Ok(configured.to_vec());
    }

    let pending = RetryLedger::load(store)?.pending;
    if pending.is_empty() {
        Ok(configured.to_vec())
    } else {
        tracing::info!(
            "Resuming {} pending URLs from the {} ledger",
            pending.len(),
            LedgerList::Pending
        );
        Ok(pending)
    }
}
