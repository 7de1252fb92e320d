use crate::error::PoolError;

use tokio::sync::oneshot;
use tracing::warn;

/// A single-use handle to one submitted task's terminal outcome.
///
/// Exactly one outcome is written by the worker executing the task (or by
/// `submit` itself when admission is refused). `outcome` consumes the
/// handle, so a second read is a compile error rather than a runtime
/// hazard.
#[derive(Debug)]
pub struct TaskHandle<R: Send + 'static> {
  pub(crate) task_id: u64,
  pub(crate) result_receiver: oneshot::Receiver<Result<R, PoolError>>,
}

impl<R: Send + 'static> TaskHandle<R> {
  /// Returns the unique ID of this task.
  pub fn id(&self) -> u64 {
    self.task_id
  }

  /// Awaits the task's terminal outcome.
  ///
  /// # Errors
  /// Returns `PoolError::PoolShuttingDown` if the task was refused at
  /// admission, `PoolError::TaskPanicked` if the body panicked, and
  /// `PoolError::ResultChannelError` if the worker dropped the sender
  /// without reporting an outcome.
  pub async fn outcome(self) -> Result<R, PoolError> {
    match self.result_receiver.await {
      Ok(task_outcome) => task_outcome,
      Err(recv_error) => {
        warn!(task_id = %self.task_id, "Result channel receive error: {}", recv_error);
        Err(PoolError::ResultChannelError(format!(
          "Task (id: {}) result channel unexpectedly closed: {}",
          self.task_id, recv_error
        )))
      }
    }
  }
}
