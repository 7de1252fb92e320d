//! sqlx-backed PostgreSQL store.

use crate::store::{SqlValue, Store, StoreError, StoreTx};

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::info;

/// A PostgreSQL store backed by an `sqlx` connection pool. The pool is
/// shared across all chunk tasks; connection-level exclusion is the
/// pool's own concern.
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Connects a pool with the given connection limits. Long-lived
  /// connections are cheap to keep; the acquire timeout keeps a dead
  /// network from hanging the loader.
  pub async fn connect(url: &str, max_conns: u32, min_conns: u32) -> Result<Self, StoreError> {
    let pool = PgPoolOptions::new()
      .max_connections(max_conns)
      .min_connections(min_conns)
      .max_lifetime(Duration::from_secs(24 * 60 * 60))
      .idle_timeout(Duration::from_secs(30 * 60))
      .acquire_timeout(Duration::from_secs(5))
      .connect(url)
      .await?;
    info!(max_conns, min_conns, "Connected PostgreSQL pool.");
    Ok(Self { pool })
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

#[async_trait]
impl Store for PgStore {
  type Tx = PgTx;

  async fn begin(&self) -> Result<PgTx, StoreError> {
    let tx = self.pool.begin().await?;
    Ok(PgTx {
      tx,
      queued: Vec::new(),
    })
  }
}

/// One open PostgreSQL transaction with a staged statement batch.
pub struct PgTx {
  tx: Transaction<'static, Postgres>,
  queued: Vec<(String, Vec<SqlValue>)>,
}

#[async_trait]
impl StoreTx for PgTx {
  fn queue(&mut self, sql: &str, args: Vec<SqlValue>) {
    self.queued.push((sql.to_string(), args));
  }

  async fn send_batch(&mut self) -> Result<(), StoreError> {
    // sqlx has no pipelined batch API: the staged statements run
    // sequentially inside the one transaction, one round trip each.
    // TODO: collapse same-SQL runs into a multi-row INSERT to get back
    // to one round trip per chunk.
    for (sql, args) in self.queued.drain(..) {
      let mut query = sqlx::query(&sql);
      for arg in args {
        query = match arg {
          SqlValue::Text(text) => query.bind(text),
          SqlValue::Int(int) => query.bind(int),
        };
      }
      query.execute(&mut *self.tx).await?;
    }
    Ok(())
  }

  async fn commit(self) -> Result<(), StoreError> {
    self.tx.commit().await.map_err(Into::into)
  }

  async fn rollback(self) -> Result<(), StoreError> {
    self.tx.rollback().await.map_err(Into::into)
  }
}
