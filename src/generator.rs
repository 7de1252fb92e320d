use crate::store::SqlValue;

use std::path::Path;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;

/// A pure producer of per-record field values. The executor calls it
/// once per record staged in a chunk.
pub trait RecordSource: Send + Sync {
  fn next_record(&self) -> Vec<SqlValue>;
}

#[derive(Error, Debug)]
pub enum GeneratorError {
  #[error("Failed to read the employee data file: {0}")]
  Io(#[from] std::io::Error),

  #[error("Failed to parse the employee data: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("Employee data field '{0}' must not be empty")]
  EmptyField(&'static str),
}

/// Source lists the generator samples from, loaded from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeData {
  pub names: Vec<String>,
  pub surnames: Vec<String>,
  pub phone_codes: Vec<String>,
  pub positions: Vec<i64>,
  pub departments: Vec<i64>,
  pub managers: Vec<i64>,
}

const MIN_SALARY: i64 = 1_000;
const MAX_SALARY: i64 = 100_000;
const PHONE_NUM_LEN: usize = 7;

/// Generates synthetic employee records by sampling the loaded source
/// lists.
///
/// The RNG is an owned instance behind a mutex rather than process-wide
/// state, so generators can be seeded deterministically in tests and
/// shared across chunk tasks.
pub struct EmployeeGenerator {
  data: EmployeeData,
  rng: Mutex<StdRng>,
}

impl EmployeeGenerator {
  pub fn new(data: EmployeeData) -> Result<Self, GeneratorError> {
    Self::with_rng(data, StdRng::from_os_rng())
  }

  /// Deterministic variant for tests.
  pub fn with_seed(data: EmployeeData, seed: u64) -> Result<Self, GeneratorError> {
    Self::with_rng(data, StdRng::seed_from_u64(seed))
  }

  pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GeneratorError> {
    let contents = std::fs::read_to_string(path)?;
    let data: EmployeeData = serde_json::from_str(&contents)?;
    Self::new(data)
  }

  fn with_rng(data: EmployeeData, rng: StdRng) -> Result<Self, GeneratorError> {
    if data.names.is_empty() {
      return Err(GeneratorError::EmptyField("names"));
    }
    if data.surnames.is_empty() {
      return Err(GeneratorError::EmptyField("surnames"));
    }
    if data.phone_codes.is_empty() {
      return Err(GeneratorError::EmptyField("phoneCodes"));
    }
    if data.positions.is_empty() {
      return Err(GeneratorError::EmptyField("positions"));
    }
    if data.departments.is_empty() {
      return Err(GeneratorError::EmptyField("departments"));
    }
    if data.managers.is_empty() {
      return Err(GeneratorError::EmptyField("managers"));
    }
    Ok(Self {
      data,
      rng: Mutex::new(rng),
    })
  }

  fn phone(&self, rng: &mut StdRng) -> String {
    let code = &self.data.phone_codes[rng.random_range(0..self.data.phone_codes.len())];
    let mut digits = String::with_capacity(PHONE_NUM_LEN);
    for _ in 0..PHONE_NUM_LEN {
      digits.push(char::from(b'0' + rng.random_range(0..10u8)));
    }
    format!("+7({}){}", code, digits)
  }

  fn email(first_name: &str, last_name: &str) -> String {
    let initial = first_name.chars().next().unwrap_or('x');
    format!("{}{}@gopher_corp.com", initial, last_name)
  }
}

impl RecordSource for EmployeeGenerator {
  /// Produces one record's field values, ordered to match the insert
  /// statement: first name, last name, phone, email, salary, manager,
  /// department, position.
  fn next_record(&self) -> Vec<SqlValue> {
    let mut rng = self.rng.lock();
    let first_name = self.data.names[rng.random_range(0..self.data.names.len())].clone();
    let last_name = self.data.surnames[rng.random_range(0..self.data.surnames.len())].clone();
    let phone = self.phone(&mut rng);
    let email = Self::email(&first_name, &last_name);
    let salary = rng.random_range(MIN_SALARY..MAX_SALARY);
    let manager = self.data.managers[rng.random_range(0..self.data.managers.len())];
    let department = self.data.departments[rng.random_range(0..self.data.departments.len())];
    let position = self.data.positions[rng.random_range(0..self.data.positions.len())];

    vec![
      SqlValue::Text(first_name),
      SqlValue::Text(last_name),
      SqlValue::Text(phone),
      SqlValue::Text(email),
      SqlValue::Int(salary),
      SqlValue::Int(manager),
      SqlValue::Int(department),
      SqlValue::Int(position),
    ]
  }
}
