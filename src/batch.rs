/*!
 * Batch processing with per-item outcomes.
 *
 * Independent files are processed on a bounded pool of blocking workers.
 * A failing item never aborts the batch: every input gets an outcome, and
 * outcomes come back in input order.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt};
use log::error;

/// Result of processing one batch item
#[derive(Debug)]
pub struct ItemOutcome<T, E> {
    /// Name of the item (usually its filename)
    pub item: String,

    /// Produced artifact or the error that stopped this item
    pub result: Result<T, E>,
}

impl<T, E> ItemOutcome<T, E> {
    pub fn new(item: impl Into<String>, result: Result<T, E>) -> Self {
        Self {
            item: item.into(),
            result,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Terminal result of a batch: one outcome per input
#[derive(Debug)]
pub struct BatchReport<T, E> {
    pub outcomes: Vec<ItemOutcome<T, E>>,
}

impl<T, E> Default for BatchReport<T, E> {
    fn default() -> Self {
        Self { outcomes: Vec::new() }
    }
}

impl<T, E> BatchReport<T, E> {
    pub fn new(outcomes: Vec<ItemOutcome<T, E>>) -> Self {
        Self { outcomes }
    }

    pub fn push(&mut self, outcome: ItemOutcome<T, E>) {
        self.outcomes.push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// Successful items with their artifacts
    pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|value| (o.item.as_str(), value)))
    }

    /// Failed items with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&str, &E)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|err| (o.item.as_str(), err)))
    }
}

/// Errors that can stand in for a worker that died before returning
pub trait WorkerFailure {
    fn worker_failed(item: &str, reason: String) -> Self;
}

/// Run `work` over every item on at most `max_workers` blocking workers.
///
/// `progress` is called with (completed, total) after each item.
pub async fn run_bounded<I, T, E, W, P>(
    items: Vec<(String, I)>,
    max_workers: usize,
    work: W,
    progress: P,
) -> BatchReport<T, E>
where
    I: Send + 'static,
    T: Send + 'static,
    E: WorkerFailure + Send + 'static,
    W: Fn(I) -> Result<T, E> + Send + Sync + 'static,
    P: Fn(usize, usize) + Clone + Send + 'static,
{
    let total = items.len();
    let completed = Arc::new(AtomicUsize::new(0));
    let work = Arc::new(work);

    let outcomes = stream::iter(items)
        .map(|(name, input)| {
            let work = work.clone();
            let completed = completed.clone();
            let progress = progress.clone();

            async move {
                let joined = tokio::task::spawn_blocking(move || (*work)(input)).await;
                let result = match joined {
                    Ok(result) => result,
                    Err(e) => {
                        error!("Worker for '{}' failed: {}", name, e);
                        Err(E::worker_failed(&name, e.to_string()))
                    }
                };

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                progress(done, total);

                ItemOutcome::new(name, result)
            }
        })
        .buffered(max_workers.max(1))
        .collect::<Vec<_>>()
        .await;

    BatchReport::new(outcomes)
}
