use crate::chunk::Chunk;
use crate::error::ChunkError;
use crate::generator::RecordSource;
use crate::store::{Store, StoreTx};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Executes one chunk as a single transaction: begin, stage `chunk.len`
/// parameterized inserts, send the batch, commit.
///
/// Every exit path issues exactly one terminal action on the
/// transaction; the consuming `commit`/`rollback` signatures on
/// [`StoreTx`] make a second terminal call unrepresentable. Cancellation
/// is cooperative and checked before begin and before the batch send; a
/// chunk past its batch send is carried through to commit.
pub async fn insert_chunk<S, G>(
  store: &S,
  ctx: &CancellationToken,
  chunk: Chunk,
  source: &G,
  sql: &str,
) -> Result<u64, ChunkError>
where
  S: Store,
  G: RecordSource + ?Sized,
{
  if ctx.is_cancelled() {
    debug!(chunk_index = chunk.index, "Chunk cancelled before transaction begin.");
    return Err(ChunkError::Cancelled);
  }

  debug!(chunk_index = chunk.index, chunk_len = chunk.len, "Running chunk transaction.");
  let mut tx = store.begin().await.map_err(ChunkError::Begin)?;

  for _ in 0..chunk.len {
    tx.queue(sql, source.next_record());
  }

  if ctx.is_cancelled() {
    debug!(chunk_index = chunk.index, "Chunk cancelled before batch send, rolling back.");
    if let Err(rollback_error) = tx.rollback().await {
      warn!(
        chunk_index = chunk.index,
        "Rollback after cancellation failed: {}", rollback_error
      );
    }
    return Err(ChunkError::Cancelled);
  }

  match tx.send_batch().await {
    Ok(()) => {
      tx.commit().await.map_err(ChunkError::Commit)?;
      debug!(chunk_index = chunk.index, "Chunk transaction committed.");
      Ok(chunk.len)
    }
    Err(batch_error) => match tx.rollback().await {
      Ok(()) => Err(ChunkError::BatchSend(batch_error)),
      Err(rollback_error) => Err(ChunkError::Rollback {
        source: batch_error,
        rollback: rollback_error,
      }),
    },
  }
}
