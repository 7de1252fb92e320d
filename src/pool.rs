use crate::error::PoolError;
use crate::gate::CapacityGate;
use crate::handle::TaskHandle;
use crate::task::PoolTask;

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

lazy_static::lazy_static! {
  static ref NEXT_POOL_TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);
}

/// A bounded worker pool.
///
/// Admission is the only throttle: `submit` suspends its caller until a
/// capacity token frees up (backpressure), then the task runs on its own
/// spawned Tokio task. The number of concurrently live task bodies never
/// exceeds the configured capacity. Shutdown is cooperative: it stops
/// admitting, unblocks every waiter, and lets in-flight tasks run to
/// completion.
pub struct WorkerPool<R: Send + 'static> {
  pool_name: Arc<String>,
  gate: CapacityGate,
  shutdown_token: CancellationToken,
  active_tasks: Arc<AtomicUsize>,
  _marker: std::marker::PhantomData<fn() -> R>,
}

impl<R: Send + 'static> WorkerPool<R> {
  /// Creates a pool with `capacity` pre-allocated tokens.
  ///
  /// # Errors
  /// Returns `PoolError::InvalidCapacity` when `capacity` is zero.
  pub fn new(capacity: usize, pool_name: &str) -> Result<Arc<Self>, PoolError> {
    if capacity == 0 {
      return Err(PoolError::InvalidCapacity(capacity));
    }
    let shutdown_token = CancellationToken::new();
    info!(pool_name = %pool_name, capacity, "Worker pool created.");
    Ok(Arc::new(Self {
      pool_name: Arc::new(pool_name.to_string()),
      gate: CapacityGate::new(capacity, shutdown_token.clone()),
      shutdown_token,
      active_tasks: Arc::new(AtomicUsize::new(0)),
      _marker: std::marker::PhantomData,
    }))
  }

  pub fn name(&self) -> &str {
    &self.pool_name
  }

  /// Number of task bodies currently executing.
  pub fn active_task_count(&self) -> usize {
    self.active_tasks.load(AtomicOrdering::SeqCst)
  }

  /// Number of free capacity tokens.
  pub fn available_capacity(&self) -> usize {
    self.gate.available_tokens()
  }

  pub fn is_shutting_down(&self) -> bool {
    self.shutdown_token.is_cancelled()
  }

  /// Submits a task, suspending the caller until it is admitted or the
  /// pool shuts down.
  ///
  /// The returned handle always resolves to exactly one outcome. If the
  /// pool is already shut down, or shuts down while this call is waiting
  /// for a token, the handle is pre-resolved with
  /// `PoolError::PoolShuttingDown` and the task body is never invoked.
  pub async fn submit(&self, task: PoolTask<R>) -> TaskHandle<R> {
    let task_id = NEXT_POOL_TASK_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    let (result_tx, result_rx) = oneshot::channel::<Result<R, PoolError>>();
    let handle = TaskHandle {
      task_id,
      result_receiver: result_rx,
    };

    let permit = match self.gate.acquire().await {
      Ok(permit) => permit,
      Err(admission_error) => {
        debug!(
          pool_name = %*self.pool_name,
          %task_id,
          "Submit: Admission refused, resolving handle without running the task."
        );
        let _ = result_tx.send(Err(admission_error));
        return handle;
      }
    };

    trace!(pool_name = %*self.pool_name, %task_id, "Admitted task. Spawning with permit.");

    let task_token = self.shutdown_token.clone();
    let active_tasks = self.active_tasks.clone();
    let pool_name_for_task = self.pool_name.clone();
    let pool_name_for_span = self.pool_name.clone();

    tokio::spawn(
      async move {
        // Token returns to the gate when the permit drops at scope exit.
        let _permit_guard = permit;
        active_tasks.fetch_add(1, AtomicOrdering::SeqCst);

        let task_future = task(task_token);
        let execution_outcome: Result<R, PoolError> =
          match AssertUnwindSafe(task_future).catch_unwind().await {
            Ok(actual_result) => {
              trace!(pool_name = %*pool_name_for_task, %task_id, "Task executed.");
              Ok(actual_result)
            }
            Err(_panic_payload) => {
              error!(pool_name = %*pool_name_for_task, %task_id, "Task panicked during execution.");
              Err(PoolError::TaskPanicked)
            }
          };

        active_tasks.fetch_sub(1, AtomicOrdering::SeqCst);

        if result_tx.send(execution_outcome).is_err() {
          warn!(
            pool_name = %*pool_name_for_task,
            %task_id,
            "Result receiver for task was dropped. Task outcome may have been lost."
          );
        }
      }
      .instrument(info_span!("pool_task", pool_name = %*pool_name_for_span, %task_id)),
    );

    handle
  }

  /// Shuts the pool down: cancels the shutdown token (unblocking every
  /// pending admission with `PoolShuttingDown`) and closes the capacity
  /// gate so late token returns become no-ops. In-flight tasks run to
  /// completion. Idempotent and safe to call concurrently.
  pub fn shutdown(&self) {
    if self.shutdown_token.is_cancelled() {
      trace!(pool_name = %*self.pool_name, "Shutdown already initiated.");
      return;
    }
    info!(pool_name = %*self.pool_name, "Initiating pool shutdown.");
    self.shutdown_token.cancel();
    self.gate.close();
  }
}

impl<R: Send + 'static> Drop for WorkerPool<R> {
  fn drop(&mut self) {
    if !self.shutdown_token.is_cancelled() {
      debug!(
        pool_name = %*self.pool_name,
        "WorkerPool dropped without explicit shutdown. Cancelling token and closing gate."
      );
      self.shutdown_token.cancel();
      self.gate.close();
    }
  }
}
