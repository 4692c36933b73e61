//! Concurrent dispatch pipeline
//!
//! One producer task pulls requests from the enumeration and hands them, one
//! at a time, to a fixed pool of workers. Workers execute requests and push
//! outcomes to the aggregator, which reports each outcome and stops at the
//! first failure. Cancellation is observed by the producer alone: it stops
//! and drops its end of the hand-off queue, and workers wind down once the
//! queue is closed and drained. Requests already in flight are allowed to
//! finish.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::{CancelToken, FuzzerStats};
use crate::error::{FuzzError, HttpError};
use crate::http::{FuzzRequest, RequestExecutor, Response};

/// Default worker pool size
pub const DEFAULT_CONCURRENCY: usize = 6;

/// Fuzzer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzerState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Fuzzer configuration
#[derive(Debug, Clone)]
pub struct FuzzerConfig {
    /// Maximum concurrent requests
    pub max_concurrent: usize,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_CONCURRENCY,
        }
    }
}

/// Result of executing one dispatched request
#[derive(Debug)]
pub struct Outcome {
    pub request: FuzzRequest,
    pub result: Result<Response, HttpError>,
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        self.result.is_err()
    }

    pub fn response(&self) -> Option<&Response> {
        self.result.as_ref().ok()
    }
}

/// Counters for a run that drained cleanly
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub dispatched: usize,
    pub completed: usize,
    pub elapsed_ms: u64,
}

/// Bounded-concurrency request dispatcher
pub struct Fuzzer {
    /// Configuration
    config: FuzzerConfig,
    /// Shared by every worker
    executor: Arc<dyn RequestExecutor>,
    /// Current state
    state: Arc<RwLock<FuzzerState>>,
    /// Statistics
    stats: Arc<RwLock<FuzzerStats>>,
}

impl Fuzzer {
    pub fn new(config: FuzzerConfig, executor: Arc<dyn RequestExecutor>) -> Self {
        Self {
            config,
            executor,
            state: Arc::new(RwLock::new(FuzzerState::Idle)),
            stats: Arc::new(RwLock::new(FuzzerStats::default())),
        }
    }

    /// Dispatch every request and report each outcome, in arrival order,
    /// to `on_outcome`.
    ///
    /// Outcomes may arrive out of enumeration order; `FuzzRequest::seq`
    /// identifies their position. The run ends with the first failed
    /// outcome, the first enumeration error, or `FuzzError::Cancelled`
    /// after `cancel` fires and in-flight requests have finished.
    pub async fn run<I, F>(
        &self,
        requests: I,
        cancel: CancelToken,
        mut on_outcome: F,
    ) -> Result<RunSummary, FuzzError>
    where
        I: IntoIterator<Item = Result<FuzzRequest, FuzzError>>,
        I::IntoIter: Send + 'static,
        F: FnMut(&Outcome),
    {
        let requests = requests.into_iter();
        let workers = self.config.max_concurrent.max(1);

        {
            *self.state.write() = FuzzerState::Running;
            let (lower, upper) = requests.size_hint();
            let mut stats = self.stats.write();
            *stats = FuzzerStats::default();
            stats.requests_planned = upper.unwrap_or(lower);
            stats.start_time = Some(Instant::now());
        }
        tracing::info!(workers, "Starting fuzzing run");

        // Depth one: the producer only runs ahead of the pool by a single request
        let (request_tx, request_rx) = mpsc::channel::<FuzzRequest>(1);
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<Outcome>(workers);

        let producer = tokio::spawn(produce(requests, request_tx, cancel, self.stats.clone()));

        let request_rx = Arc::new(Mutex::new(request_rx));
        let handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|id| {
                tokio::spawn(work(
                    id,
                    request_rx.clone(),
                    outcome_tx.clone(),
                    self.executor.clone(),
                ))
            })
            .collect();
        drop(request_rx);

        let closer = tokio::spawn(close(handles, outcome_tx));

        while let Some(outcome) = outcome_rx.recv().await {
            self.stats.write().record_completion(outcome.is_error());
            on_outcome(&outcome);

            if let Err(source) = outcome.result {
                // Producer and workers unwind on their own once the
                // outcome queue is gone
                *self.state.write() = FuzzerState::Failed;
                return Err(FuzzError::Transport {
                    seq: outcome.request.seq,
                    url: outcome.request.url.to_string(),
                    source,
                });
            }
        }

        let produced = producer
            .await
            .map_err(|e| FuzzError::Worker(format!("producer: {}", e)))
            .and_then(|r| r);
        let closed = closer
            .await
            .map_err(|e| FuzzError::Worker(format!("closer: {}", e)))
            .and_then(|r| r);

        if let Err(e) = produced.and(closed) {
            *self.state.write() = if e.is_cancellation() {
                tracing::warn!("Fuzzing run cancelled");
                FuzzerState::Cancelled
            } else {
                FuzzerState::Failed
            };
            return Err(e);
        }

        *self.state.write() = FuzzerState::Completed;
        let stats = self.stats.read().clone();
        tracing::info!(
            dispatched = stats.requests_dispatched,
            completed = stats.requests_completed,
            elapsed_ms = stats.elapsed_ms,
            "Fuzzing run completed"
        );

        Ok(RunSummary {
            dispatched: stats.requests_dispatched,
            completed: stats.requests_completed,
            elapsed_ms: stats
                .start_time
                .map(|t| t.elapsed().as_millis() as u64)
                .unwrap_or_default(),
        })
    }

    /// Get current state
    pub fn state(&self) -> FuzzerState {
        *self.state.read()
    }

    /// Get current stats
    pub fn stats(&self) -> FuzzerStats {
        self.stats.read().clone()
    }
}

/// Feed the hand-off queue until the requests run out, enumeration fails,
/// or cancellation is requested.
async fn produce<I>(
    mut requests: I,
    tx: mpsc::Sender<FuzzRequest>,
    cancel: CancelToken,
    stats: Arc<RwLock<FuzzerStats>>,
) -> Result<(), FuzzError>
where
    I: Iterator<Item = Result<FuzzRequest, FuzzError>>,
{
    loop {
        if cancel.is_cancelled() {
            return Err(FuzzError::Cancelled);
        }
        let Some(request) = requests.next() else {
            return Ok(());
        };
        let request = request?;
        let seq = request.seq;

        tokio::select! {
            sent = tx.send(request) => {
                if sent.is_err() {
                    // Every worker has stopped; the aggregator already has its answer
                    return Ok(());
                }
                tracing::trace!(seq, "Request handed off");
                stats.write().requests_dispatched += 1;
            }
            _ = cancel.cancelled() => {
                tracing::info!(seq, "Cancellation requested, dispatching no further requests");
                return Err(FuzzError::Cancelled);
            }
        }
    }
}

async fn work(
    id: usize,
    requests: Arc<Mutex<mpsc::Receiver<FuzzRequest>>>,
    outcomes: mpsc::Sender<Outcome>,
    executor: Arc<dyn RequestExecutor>,
) {
    loop {
        let next = requests.lock().await.recv().await;
        let Some(request) = next else {
            // Hand-off queue closed and drained
            break;
        };

        tracing::debug!(worker = id, seq = request.seq, url = %request.url, "Sending request");
        let result = executor.execute(&request).await;
        if let Err(e) = &result {
            tracing::debug!(worker = id, seq = request.seq, error = %e, "Request failed");
        }

        if outcomes.send(Outcome { request, result }).await.is_err() {
            break;
        }
    }
}

/// Wait for every worker, then close the outcome queue
async fn close(
    workers: Vec<JoinHandle<()>>,
    outcomes: mpsc::Sender<Outcome>,
) -> Result<(), FuzzError> {
    let mut failure = None;
    for handle in workers {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Worker task failed");
            failure.get_or_insert(FuzzError::Worker(e.to_string()));
        }
    }
    drop(outcomes);
    failure.map_or(Ok(()), Err)
}
