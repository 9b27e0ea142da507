//! Generic retry-wave driver
//!
//! Drives a batch of URLs through an operation, then re-drives only the
//! failures in later cycles. The ledger is persisted as the run goes so an
//! interrupted batch can resume from its pending list.

use crate::storage::LedgerStore;
use crate::waves::ledger::{dedup, RetryLedger};
use crate::ScoutError;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// How many cycles a batch may take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavePolicy {
    /// Cycles allowed after the first one
    pub max_retries: u32,
}

impl WavePolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Total cycles, counting the first
    pub fn cycles(&self) -> usize {
        1 + self.max_retries as usize
    }
}

impl Default for WavePolicy {
    fn default() -> Self {
        Self::new(2)
    }
}

/// What one operation call achieved
///
/// A call may resolve more URLs than it was given: a listing seed reports
/// itself plus each detail link it crawled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaveOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    /// Links the call classified as detail pages; persisted with the ledger
    pub discovered: Vec<String>,
}

impl WaveOutcome {
    pub fn success(url: impl Into<String>) -> Self {
        Self {
            succeeded: vec![url.into()],
            ..Self::default()
        }
    }

    pub fn failure(url: impl Into<String>) -> Self {
        Self {
            failed: vec![url.into()],
            ..Self::default()
        }
    }
}

/// Final state of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaveReport {
    pub cycles_run: usize,
    pub processed: Vec<String>,
    /// Still pending when the cycles ran out or the run was cancelled
    pub unresolved: Vec<String>,
}

/// Runs `op` over `seeds` in retry waves
///
/// Each cycle drives the pending URLs sequentially. After every URL the
/// cycle's failed list and discovered details are persisted; at cycle end
/// the whole ledger is. The
/// batch stops when nothing is pending or after [`WavePolicy::cycles`]
/// cycles. Cancellation stops between URLs; URLs not yet driven stay
/// pending.
pub async fn run_waves<F, Fut>(
    store: &mut dyn LedgerStore,
    seeds: &[String],
    policy: &WavePolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<WaveReport, ScoutError>
where
    F: FnMut(usize, String) -> Fut,
    Fut: Future<Output = WaveOutcome>,
{
    let mut ledger = RetryLedger::load(store)?;
    let mut pending: Vec<String> = dedup(
        seeds
            .iter()
            .filter(|url| !ledger.is_processed(url))
            .cloned(),
    );
    let mut cycles_run = 0;

    for cycle in 1..=policy.cycles() {
        if pending.is_empty() || cancel.is_cancelled() {
            break;
        }

        tracing::info!(
            "Wave cycle {}/{}: {} URLs",
            cycle,
            policy.cycles(),
            pending.len()
        );
        ledger.begin_cycle(&pending);
        ledger.save(store)?;

        let mut succeeded = Vec::new();
        let mut urls = pending.iter();
        for url in urls.by_ref() {
            if cancel.is_cancelled() {
                ledger.defer(std::iter::once(url.clone()));
                break;
            }

            let outcome = op(cycle, url.clone()).await;
            if !outcome.failed.is_empty() {
                tracing::warn!("{} failed URLs from {}", outcome.failed.len(), url);
            }
            succeeded.extend(outcome.succeeded);
            ledger.record_failed(outcome.failed);
            ledger.record_details(outcome.discovered);
            ledger.save_progress(store)?;
        }
        ledger.defer(urls.cloned());

        pending = ledger.finish_cycle(&succeeded);
        ledger.save(store)?;
        cycles_run = cycle;

        tracing::info!(
            "Wave cycle {} done: {} processed in total, {} pending",
            cycle,
            ledger.processed.len(),
            pending.len()
        );
    }

    if !pending.is_empty() {
        tracing::warn!(
            "{} URLs unresolved after {} cycles",
            pending.len(),
            cycles_run
        );
    }

    Ok(WaveReport {
        cycles_run,
        processed: ledger.processed.clone(),
        unresolved: pending,
    })
}
