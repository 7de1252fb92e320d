//! Bulk-loads synthetic records into a relational store through a
//! bounded Tokio worker pool with batched transactions and cooperative
//! cancellation.

mod chunk;
mod config;
mod dispatcher;
mod error;
mod executor;
mod gate;
mod generator;
mod handle;
mod pool;
mod postgres;
mod progress;
mod store;
mod task;

pub use chunk::{plan_chunks, Chunk};
pub use config::{Config, ConfigError};
pub use dispatcher::{
  BatchDispatcher, ChunkOutcome, ChunkStatus, CompletionObserver, DispatchSummary,
};
pub use error::{ChunkError, PoolError};
pub use executor::insert_chunk;
pub use generator::{EmployeeData, EmployeeGenerator, GeneratorError, RecordSource};
pub use handle::TaskHandle;
pub use pool::WorkerPool;
pub use postgres::{PgStore, PgTx};
pub use progress::ProgressTracker;
pub use store::{SqlValue, Store, StoreError, StoreTx};
pub use task::{PoolTask, TaskFuture};
