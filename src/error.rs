use crate::store::StoreError;

use thiserror::Error;

/// Errors produced by the `rowflood` worker pool.
#[derive(Error, Debug, PartialEq)]
pub enum PoolError {
  #[error("Pool capacity must be a positive integer, got {0}")]
  InvalidCapacity(usize),

  #[error("Pool is shutting down or already shut down, cannot admit new tasks")]
  PoolShuttingDown,

  #[error("Submitted task panicked during execution")]
  TaskPanicked,

  #[error("Task result channel error (worker dropped the sender without reporting an outcome): {0}")]
  ResultChannelError(String),
}

/// Errors produced while executing one transactional chunk.
///
/// Chunk errors travel exclusively through the chunk's result handle; the
/// dispatcher logs and aggregates them without aborting sibling chunks.
#[derive(Error, Debug)]
pub enum ChunkError {
  #[error("Failed to begin a store transaction: {0}")]
  Begin(#[source] StoreError),

  #[error("Failed to send the statement batch: {0}")]
  BatchSend(#[source] StoreError),

  #[error("Rollback failed ({rollback}), original error: {source}")]
  Rollback {
    #[source]
    source: StoreError,
    rollback: StoreError,
  },

  #[error("Failed to commit the transaction: {0}")]
  Commit(#[source] StoreError),

  #[error("Chunk execution cancelled before reaching its point of no return")]
  Cancelled,
}
