use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
  #[error("Pool capacity must be a positive integer")]
  NonPositiveCapacity,

  #[error("Chunk size must be a positive integer")]
  NonPositiveChunkSize,

  #[error("max-conns must be positive and not less than min-conns")]
  InvalidConnectionLimits,
}

/// Loader configuration. Invalid values fail fast in `validate` before
/// any task is submitted.
#[derive(Parser, Debug, Clone)]
#[command(
  name = "rowflood",
  version,
  about = "Bulk-loads synthetic employee records into PostgreSQL under a bounded worker pool."
)]
pub struct Config {
  /// DB host.
  #[arg(long, default_value = "127.0.0.1")]
  pub host: String,

  /// DB port.
  #[arg(long, default_value_t = 5432)]
  pub port: u16,

  /// DB name.
  #[arg(long = "db", default_value = "gopher_corp")]
  pub db_name: String,

  /// DB user.
  #[arg(long, default_value = "gopher")]
  pub user: String,

  /// DB password.
  #[arg(long, default_value = "P@ssw0rd")]
  pub password: String,

  /// Connection pool MaxConnections limit.
  #[arg(long = "max-conns", default_value_t = 8)]
  pub max_conns: u32,

  /// Connection pool MinConnections limit.
  #[arg(long = "min-conns", default_value_t = 8)]
  pub min_conns: u32,

  /// Number of simultaneously in-flight chunk transactions.
  #[arg(long = "pool-capacity", default_value_t = 50)]
  pub pool_capacity: usize,

  /// Records staged per transaction.
  #[arg(long = "chunk-size", default_value_t = 100)]
  pub chunk_size: u64,

  /// Total number of records to load.
  #[arg(long = "total-units", default_value_t = 100_000)]
  pub total_units: u64,

  /// Path to the employee data JSON file.
  #[arg(long = "data-file", default_value = "data/employees.json")]
  pub data_file: PathBuf,
}

impl Config {
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.pool_capacity == 0 {
      return Err(ConfigError::NonPositiveCapacity);
    }
    if self.chunk_size == 0 {
      return Err(ConfigError::NonPositiveChunkSize);
    }
    if self.max_conns == 0 || self.max_conns < self.min_conns {
      return Err(ConfigError::InvalidConnectionLimits);
    }
    Ok(())
  }

  pub fn connection_string(&self) -> String {
    format!(
      "postgresql://{}:{}@{}:{}/{}",
      self.user, self.password, self.host, self.port, self.db_name
    )
  }
}
