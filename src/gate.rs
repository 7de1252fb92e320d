use crate::error::PoolError;

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// A fixed-capacity token bag gated by a cancellation token.
///
/// Holding a [`Permit`] authorizes one concurrently running task; dropping
/// it returns the token for reuse. Once the gate is closed, returning
/// permits is a silent no-op, so shutdown racing with in-flight
/// completions cannot panic or over-count.
pub(crate) struct CapacityGate {
  semaphore: Arc<Semaphore>,
  shutdown_token: CancellationToken,
}

pub(crate) type Permit = OwnedSemaphorePermit;

impl CapacityGate {
  pub(crate) fn new(capacity: usize, shutdown_token: CancellationToken) -> Self {
    Self {
      semaphore: Arc::new(Semaphore::new(capacity)),
      shutdown_token,
    }
  }

  /// Suspends until a token is free or the shutdown token fires,
  /// whichever happens first. Never busy-waits.
  pub(crate) async fn acquire(&self) -> Result<Permit, PoolError> {
    tokio::select! {
      biased;

      _ = self.shutdown_token.cancelled() => {
        trace!("Capacity gate: acquisition interrupted by shutdown.");
        Err(PoolError::PoolShuttingDown)
      }

      permit_result = self.semaphore.clone().acquire_owned() => {
        match permit_result {
          Ok(permit) => {
            trace!("Capacity gate: token acquired. Available: {}", self.semaphore.available_permits());
            Ok(permit)
          }
          // The semaphore only closes on shutdown.
          Err(_) => Err(PoolError::PoolShuttingDown),
        }
      }
    }
  }

  /// Permanently closes the gate. Pending and future `acquire` calls
  /// resolve with `PoolShuttingDown`; outstanding permits become no-ops
  /// on drop.
  pub(crate) fn close(&self) {
    self.semaphore.close();
  }

  pub(crate) fn available_tokens(&self) -> usize {
    self.semaphore.available_permits()
  }
}
