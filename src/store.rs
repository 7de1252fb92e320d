//! The store connection boundary.
//!
//! The pool core never interprets SQL; it only sequences `begin`,
//! `queue`, `send_batch` and exactly one of `commit`/`rollback` against
//! these traits. `commit` and `rollback` consume the transaction handle,
//! so issuing both terminal actions on one transaction does not compile.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Opaque driver-level failure surfaced at the trait boundary.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct StoreError {
  message: String,
}

impl StoreError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

impl From<sqlx::Error> for StoreError {
  fn from(err: sqlx::Error) -> Self {
    Self {
      message: err.to_string(),
    }
  }
}

/// A parameter value for a queued statement. The core stages values
/// without knowing how the driver encodes them.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
  Text(String),
  Int(i64),
}

impl fmt::Display for SqlValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SqlValue::Text(s) => write!(f, "{}", s),
      SqlValue::Int(i) => write!(f, "{}", i),
    }
  }
}

/// A connection source that can open transactions.
#[async_trait]
pub trait Store: Send + Sync {
  type Tx: StoreTx;

  async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// One open transaction. Statements are staged with `queue` and applied
/// as a single batch by `send_batch`; the transaction then receives
/// exactly one terminal action.
#[async_trait]
pub trait StoreTx: Send {
  fn queue(&mut self, sql: &str, args: Vec<SqlValue>);

  async fn send_batch(&mut self) -> Result<(), StoreError>;

  async fn commit(self) -> Result<(), StoreError>;

  async fn rollback(self) -> Result<(), StoreError>;
}
