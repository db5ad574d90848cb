//! Batch execution engine
//!
//! Entries are independent, so a batch fans out over a bounded worker pool.
//! Results land in an append-only collection keyed by input index, which
//! keeps output order identical to input order regardless of completion
//! order. The pool bound is the rate limit on the generative backend: a
//! permit is held for the whole per-entry classification, including any
//! in-flight external call.

use std::sync::Arc;

use logsift_core::{LabeledEntry, LogEntry};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::router::Router;

impl Router {
    /// Classify a batch, preserving input order and cardinality.
    ///
    /// Cancelling `cancel` aborts in-flight work promptly; affected entries
    /// come back with the sentinel label rather than leaving the batch
    /// hung. The returned vector always has exactly one result per input.
    pub async fn classify_batch(
        self: Arc<Self>,
        entries: Vec<LogEntry>,
        cancel: CancellationToken,
    ) -> Vec<LabeledEntry> {
        let total = entries.len();
        let entries = Arc::new(entries);
        let slots: Arc<Mutex<Vec<Option<LabeledEntry>>>> = Arc::new(Mutex::new(vec![None; total]));
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency()));

        info!(
            total,
            workers = self.max_concurrency(),
            "starting batch classification"
        );

        let mut tasks = JoinSet::new();
        for idx in 0..total {
            let router = Arc::clone(&self);
            let entries = Arc::clone(&entries);
            let slots = Arc::clone(&slots);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let entry = &entries[idx];

                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        slots.lock()[idx] = Some(LabeledEntry::unclassified(entry));
                        return;
                    }
                    permit = semaphore.acquire() => match permit {
                        Ok(permit) => permit,
                        // The semaphore is never closed while tasks run.
                        Err(_) => {
                            slots.lock()[idx] = Some(LabeledEntry::unclassified(entry));
                            return;
                        }
                    },
                };

                let labeled = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => LabeledEntry::unclassified(entry),
                    labeled = router.classify_entry(entry) => labeled,
                };

                slots.lock()[idx] = Some(labeled);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "classification task failed");
            }
        }

        // Every input produces exactly one output. A slot left empty (a
        // panicked task) still resolves to the sentinel label.
        let mut slots = slots.lock();
        entries
            .iter()
            .zip(slots.iter_mut())
            .map(|(entry, slot)| {
                slot.take()
                    .unwrap_or_else(|| LabeledEntry::unclassified(entry))
            })
            .collect()
    }
}
