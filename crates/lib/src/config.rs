//! Scheduler configuration.
//!
//! Defaults come from the host (available CPUs) and can be overridden through
//! environment variables.

use std::env::{self, VarError};

use thiserror::Error;

/// Overrides [`ExecuteConfig::parallelism`].
pub const JOBS_ENV: &str = "KILN_JOBS";

/// Overrides [`ExecuteConfig::worker_threads`].
pub const WORKER_THREADS_ENV: &str = "KILN_WORKER_THREADS";

/// Errors reading configuration from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  /// The variable is set but is not a positive integer.
  #[error("{var} must be a positive integer, got {value:?}")]
  InvalidNumber { var: &'static str, value: String },

  /// The variable is set to zero.
  #[error("{var} must be at least 1")]
  Zero { var: &'static str },
}

/// Configuration for the build scheduler.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Maximum number of units of work running at once.
  pub parallelism: usize,

  /// Number of async worker threads driving continuations.
  pub worker_threads: usize,

  /// Name given to worker threads.
  pub thread_name: String,
}

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      worker_threads: num_cpus(),
      thread_name: "kiln-worker".to_string(),
    }
  }
}

impl ExecuteConfig {
  /// Defaults with `KILN_JOBS` and `KILN_WORKER_THREADS` applied.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();
    if let Some(jobs) = read_count(JOBS_ENV)? {
      config.parallelism = jobs;
    }
    if let Some(threads) = read_count(WORKER_THREADS_ENV)? {
      config.worker_threads = threads;
    }
    Ok(config)
  }
}

fn read_count(var: &'static str) -> Result<Option<usize>, ConfigError> {
  let raw = match env::var(var) {
    Ok(raw) => raw,
    Err(VarError::NotPresent) => return Ok(None),
    Err(VarError::NotUnicode(value)) => {
      return Err(ConfigError::InvalidNumber {
        var,
        value: value.to_string_lossy().into_owned(),
      });
    }
  };

  match raw.trim().parse::<usize>() {
    Ok(0) => Err(ConfigError::Zero { var }),
    Ok(count) => Ok(Some(count)),
    Err(_) => Err(ConfigError::InvalidNumber { var, value: raw }),
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
