//! Paired digest and timestamp traces.

use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Hash, MTime, MTimeError, ParseHashError};

/// Error parsing a [`BuildTrace`] from text.
#[derive(Debug, PartialEq, Error)]
pub enum ParseBuildTraceError {
  #[error("build trace {0:?} is missing the '@' separator")]
  MissingSeparator(String),

  #[error(transparent)]
  Hash(#[from] ParseHashError),

  #[error(transparent)]
  MTime(#[from] MTimeError),
}

/// Trace used when both content identity and freshness matter.
///
/// Displayed as `<hash>@<mtime>`, e.g. `"00000000000006bb@1.000000000"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildTrace {
  pub hash: Hash,
  pub mtime: MTime,
}

impl BuildTrace {
  /// Identity of the paired merge.
  pub const NIL: BuildTrace = BuildTrace {
    hash: Hash::NIL,
    mtime: MTime::EPOCH,
  };

  pub const fn new(hash: Hash, mtime: MTime) -> Self {
    BuildTrace { hash, mtime }
  }

  /// Read both components from the file at `path`.
  pub fn compute(path: &Path) -> io::Result<Self> {
    Ok(BuildTrace {
      hash: Hash::of_file(path)?,
      mtime: MTime::of_path(path)?,
    })
  }

  /// Mix hashes in order and keep the later timestamp.
  pub fn mix(self, other: &BuildTrace) -> BuildTrace {
    BuildTrace {
      hash: self.hash.mix(other.hash),
      mtime: self.mtime.max(other.mtime),
    }
  }

  /// Whether `self` records the same content as `other`.
  pub fn check_against_hash(&self, other: &BuildTrace) -> bool {
    self.hash == other.hash
  }

  /// Whether `self` is no older than `other`.
  pub fn check_against_time(&self, other: &BuildTrace) -> bool {
    self.mtime.is_up_to_date(&other.mtime)
  }
}

impl fmt::Display for BuildTrace {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.hash, self.mtime)
  }
}

impl FromStr for BuildTrace {
  type Err = ParseBuildTraceError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let text = s.trim();
    let (hash, mtime) = text
      .split_once('@')
      .ok_or_else(|| ParseBuildTraceError::MissingSeparator(text.to_string()))?;
    Ok(BuildTrace {
      hash: hash.parse()?,
      mtime: mtime.parse()?,
    })
  }
}
