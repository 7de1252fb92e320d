use crate::chunk::{plan_chunks, Chunk};
use crate::error::{ChunkError, PoolError};
use crate::pool::WorkerPool;
use crate::progress::ProgressTracker;
use crate::task::PoolTask;

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

/// Terminal status of one dispatched chunk.
#[derive(Debug)]
pub enum ChunkStatus {
  /// The chunk's transaction committed; carries the record count.
  Loaded(u64),
  /// The chunk ran and failed; its transaction was rolled back.
  Failed(ChunkError),
  /// The pool refused admission; the chunk body never ran.
  NotAdmitted(PoolError),
  /// The chunk body faulted at the task boundary (panic or lost result
  /// channel) without reporting a chunk-level error.
  Faulted(PoolError),
}

#[derive(Debug)]
pub struct ChunkOutcome {
  pub chunk: Chunk,
  pub status: ChunkStatus,
}

/// Observer invoked once per chunk outcome, decoupled from the
/// completion path's task count.
pub type CompletionObserver = Arc<dyn Fn(&ChunkOutcome) + Send + Sync + 'static>;

/// Aggregate result of one dispatch run. Available only after every
/// submitted chunk has been observed exactly once.
#[derive(Debug, Default)]
pub struct DispatchSummary {
  pub chunks_total: usize,
  pub chunks_failed: usize,
  pub records_loaded: u64,
}

/// Partitions a total unit count into fixed-size chunks, submits one
/// pool task per chunk and aggregates every outcome.
///
/// Failures are independent per chunk: one failed transaction is logged
/// and counted without aborting siblings. `dispatch` suspends its caller
/// until all chunk handles have resolved.
pub struct BatchDispatcher {
  pool: Arc<WorkerPool<Result<u64, ChunkError>>>,
  progress: Arc<ProgressTracker>,
  observer: Option<CompletionObserver>,
}

impl BatchDispatcher {
  pub const DEFAULT_PROGRESS_CADENCE: u64 = 1000;

  pub fn new(pool: Arc<WorkerPool<Result<u64, ChunkError>>>) -> Self {
    Self {
      pool,
      progress: Arc::new(ProgressTracker::new(Self::DEFAULT_PROGRESS_CADENCE)),
      observer: None,
    }
  }

  pub fn with_progress_cadence(mut self, cadence: u64) -> Self {
    self.progress = Arc::new(ProgressTracker::new(cadence));
    self
  }

  pub fn with_completion_observer(mut self, observer: CompletionObserver) -> Self {
    self.observer = Some(observer);
    self
  }

  pub fn records_loaded(&self) -> u64 {
    self.progress.completed()
  }

  /// Dispatches `total_units` of work in `chunk_size` pieces, building
  /// each chunk's task with `make_task`.
  ///
  /// Submission order follows chunk order, but chunks may complete in
  /// any order; there is no cross-chunk atomicity. Returns once the
  /// final chunk outcome has been observed.
  pub async fn dispatch<F>(&self, total_units: u64, chunk_size: u64, make_task: F) -> DispatchSummary
  where
    F: Fn(Chunk) -> PoolTask<Result<u64, ChunkError>>,
  {
    let chunks = plan_chunks(total_units, chunk_size);
    info!(
      pool_name = %self.pool.name(),
      total_units,
      chunk_size,
      chunk_count = chunks.len(),
      "Dispatching chunk plan."
    );

    let mut pending = Vec::with_capacity(chunks.len());
    for chunk in chunks {
      debug!(chunk_index = chunk.index, chunk_len = chunk.len, "Submitting chunk task.");
      let handle = self.pool.submit(make_task(chunk)).await;
      let progress = self.progress.clone();
      let observer = self.observer.clone();
      // Progress, failure logging and the observer fire here, on each
      // chunk's own completion path, not after the barrier.
      pending.push(async move {
        let status = match handle.outcome().await {
          Ok(Ok(loaded)) => {
            progress.record(loaded);
            ChunkStatus::Loaded(loaded)
          }
          Ok(Err(chunk_error)) => {
            warn!(
              chunk_index = chunk.index,
              chunk_start = chunk.start,
              chunk_len = chunk.len,
              "Chunk failed: {}",
              chunk_error
            );
            ChunkStatus::Failed(chunk_error)
          }
          Err(PoolError::PoolShuttingDown) => {
            warn!(
              chunk_index = chunk.index,
              chunk_start = chunk.start,
              chunk_len = chunk.len,
              "Chunk not admitted: pool shutting down."
            );
            ChunkStatus::NotAdmitted(PoolError::PoolShuttingDown)
          }
          Err(pool_error) => {
            warn!(
              chunk_index = chunk.index,
              chunk_start = chunk.start,
              chunk_len = chunk.len,
              "Chunk task faulted: {}",
              pool_error
            );
            ChunkStatus::Faulted(pool_error)
          }
        };
        let outcome = ChunkOutcome { chunk, status };
        if let Some(observer) = &observer {
          observer(&outcome);
        }
        outcome
      });
    }

    // Barrier: every chunk outcome is observed exactly once before the
    // summary is produced.
    let resolved = join_all(pending).await;

    let mut summary = DispatchSummary::default();
    for outcome in resolved {
      summary.chunks_total += 1;
      match outcome.status {
        ChunkStatus::Loaded(loaded) => summary.records_loaded += loaded,
        ChunkStatus::Failed(_) | ChunkStatus::NotAdmitted(_) | ChunkStatus::Faulted(_) => {
          summary.chunks_failed += 1;
        }
      }
    }

    info!(
      pool_name = %self.pool.name(),
      chunks_total = summary.chunks_total,
      chunks_failed = summary.chunks_failed,
      records_loaded = summary.records_loaded,
      "Dispatch complete."
    );
    summary
  }
}
