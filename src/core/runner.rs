// src/core/runner.rs

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::core::cancel::CancelToken;

/// Runs `work` over a fixed candidate set with at most `limit` units in
/// flight and streams the results back in completion order.
///
/// # Arguments
///
/// * `candidates` - Every unit to probe, admitted in order.
/// * `limit` - Maximum number of units in flight. `0` is treated as `1`.
/// * `cancel` - Once fired, no further candidate is admitted.
/// * `work` - Builds the future for one candidate. `None` drops the candidate;
///   callers that want typed failures surfaced pick `R = Result<T, ReconError>`.
///
/// # Returns
///
/// The result stream. It closes after every admitted unit has completed.
pub fn run<C, R, F, Fut>(
    candidates: Vec<C>,
    limit: usize,
    cancel: CancelToken,
    work: F,
) -> mpsc::Receiver<R>
where
    C: Send + 'static,
    R: Send + 'static,
    F: Fn(C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<R>> + Send + 'static,
{
    let (feed, queue) = mpsc::channel(candidates.len().max(1));
    for candidate in candidates {
        // The queue is sized to hold every candidate.
        let _ = feed.try_send(candidate);
    }
    drop(feed);
    run_stream(queue, limit, cancel, work)
}

/// Same as [`run`], but candidates are pulled from a channel as they become
/// available. The result stream closes once the candidate channel is closed
/// and drained, and every admitted unit has completed.
///
/// A unit holds its admission slot until its result has been handed to the
/// returned channel, so a slow consumer also throttles admission. Admission
/// stops when `cancel` fires or when the returned receiver is dropped; units
/// already running are left to finish.
pub fn run_stream<C, R, F, Fut>(
    mut candidates: mpsc::Receiver<C>,
    limit: usize,
    cancel: CancelToken,
    work: F,
) -> mpsc::Receiver<R>
where
    C: Send + 'static,
    R: Send + 'static,
    F: Fn(C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<R>> + Send + 'static,
{
    let limit = limit.max(1);
    let (tx, rx) = mpsc::channel(limit);

    tokio::spawn(async move {
        let gate = Arc::new(Semaphore::new(limit));
        let mut tasks = JoinSet::new();
        let mut admitted = 0usize;

        loop {
            let candidate = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(admitted, "Admission halted by cancellation.");
                    break;
                }
                _ = tx.closed() => {
                    debug!(admitted, "Result consumer went away, admission halted.");
                    break;
                }
                next = candidates.recv() => match next {
                    Some(candidate) => candidate,
                    None => break,
                },
            };
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(admitted, "Admission halted by cancellation.");
                    break;
                }
                _ = tx.closed() => {
                    debug!(admitted, "Result consumer went away, admission halted.");
                    break;
                }
                permit = gate.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            admitted += 1;
            let tx = tx.clone();
            let unit = work(candidate);
            tasks.spawn(async move {
                if let Some(result) = unit.await {
                    // A closed receiver is picked up by the admission loop.
                    let _ = tx.send(result).await;
                }
                drop(permit);
            });
        }

        drop(tx);
        drop(candidates);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Probe task failed to complete.");
            }
        }
        debug!(admitted, "All admitted probes completed.");
    });

    rx
}

/// Drains a result stream into a vector. Mostly useful for batch callers and tests.
pub async fn collect<R>(mut rx: mpsc::Receiver<R>) -> Vec<R> {
    let mut results = Vec::new();
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    results
}
