use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use rowflood::{
  insert_chunk, BatchDispatcher, ChunkError, Config, EmployeeGenerator, PgStore, TaskFuture,
  WorkerPool,
};

const INSERT_EMPLOYEE_SQL: &str = "INSERT INTO employees(first_name, last_name, phone, email, salary, manager_id, department, position) \
   VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  fmt::Subscriber::builder().with_env_filter(filter).init();

  let config = Config::parse();
  config.validate().context("Invalid configuration")?;

  let generator = Arc::new(
    EmployeeGenerator::from_json_file(&config.data_file)
      .with_context(|| format!("Failed to load employee data from {}", config.data_file.display()))?,
  );

  let store = Arc::new(
    PgStore::connect(&config.connection_string(), config.max_conns, config.min_conns)
      .await
      .context("Failed to connect the PostgreSQL pool")?,
  );

  let pool = WorkerPool::new(config.pool_capacity, "rowflood").context("Failed to create the worker pool")?;
  let dispatcher = BatchDispatcher::new(pool.clone());

  let summary = dispatcher
    .dispatch(config.total_units, config.chunk_size, |chunk| {
      let store = store.clone();
      let generator = generator.clone();
      Box::new(move |ctx| -> TaskFuture<Result<u64, ChunkError>> {
        Box::pin(async move {
          insert_chunk(store.as_ref(), &ctx, chunk, generator.as_ref(), INSERT_EMPLOYEE_SQL).await
        })
      })
    })
    .await;

  pool.shutdown();

  info!(
    records_loaded = summary.records_loaded,
    chunks_total = summary.chunks_total,
    chunks_failed = summary.chunks_failed,
    "Load finished."
  );

  if summary.chunks_failed > 0 {
    anyhow::bail!(
      "{} of {} chunks failed; see the log for per-chunk errors",
      summary.chunks_failed,
      summary.chunks_total
    );
  }
  Ok(())
}
