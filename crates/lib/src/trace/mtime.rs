//! Modification-time traces.

use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// A last-modification instant, measured from the Unix epoch.
///
/// Instants before the epoch are clamped to it.
///
/// # Format
///
/// Displayed as seconds, a dot, and nine digits of nanoseconds, e.g.
/// `"12.000000005"`. Serialized as `{"secs": .., "nanos": ..}`; nanoseconds
/// above one second are carried into `secs` on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "MTimeWire")]
pub struct MTime {
  pub secs: u64,
  pub nanos: u32,
}

#[derive(Deserialize)]
struct MTimeWire {
  secs: u64,
  nanos: u32,
}

impl From<MTimeWire> for MTime {
  fn from(wire: MTimeWire) -> Self {
    MTime::new(wire.secs, wire.nanos)
  }
}

/// Errors converting or parsing an [`MTime`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MTimeError {
  #[error("invalid timestamp {0:?}, expected <secs>.<nanos>")]
  Malformed(String),

  #[error("timestamp {0} is outside the range of system time")]
  OutOfRange(MTime),
}

impl MTime {
  /// The zero instant, identity of the timestamp merge.
  pub const EPOCH: MTime = MTime { secs: 0, nanos: 0 };

  /// Create an instant, normalizing nanoseconds above one second.
  ///
  /// Saturates at the largest representable second.
  pub const fn new(secs: u64, nanos: u32) -> Self {
    MTime {
      secs: secs.saturating_add((nanos / NANOS_PER_SEC) as u64),
      nanos: nanos % NANOS_PER_SEC,
    }
  }

  /// The current wall-clock time.
  pub fn now() -> Self {
    SystemTime::now().into()
  }

  /// Read the modification time of the file at `path`.
  pub fn of_path(path: &Path) -> io::Result<Self> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(modified.into())
  }

  pub fn is_epoch(&self) -> bool {
    *self == Self::EPOCH
  }

  pub fn is_newer_than(&self, other: &MTime) -> bool {
    self > other
  }

  /// Whether an artifact stamped `self` is fresh with respect to inputs
  /// whose merged timestamp is `inputs`.
  ///
  /// An artifact is up to date when it is no older than its newest input.
  pub fn is_up_to_date(&self, inputs: &MTime) -> bool {
    self >= inputs
  }
}

impl From<SystemTime> for MTime {
  fn from(time: SystemTime) -> Self {
    let since = time.duration_since(UNIX_EPOCH).unwrap_or_default();
    MTime {
      secs: since.as_secs(),
      nanos: since.subsec_nanos(),
    }
  }
}

impl TryFrom<MTime> for SystemTime {
  type Error = MTimeError;

  fn try_from(time: MTime) -> Result<Self, Self::Error> {
    Duration::from_secs(time.secs)
      .checked_add(Duration::from_nanos(u64::from(time.nanos)))
      .and_then(|since| UNIX_EPOCH.checked_add(since))
      .ok_or(MTimeError::OutOfRange(time))
  }
}

impl fmt::Display for MTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{:09}", self.secs, self.nanos)
  }
}

impl FromStr for MTime {
  type Err = MTimeError;

  /// Parse `<secs>` or `<secs>.<fraction>`, with up to nine fraction digits.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let text = s.trim();
    let malformed = || MTimeError::Malformed(text.to_string());
    let is_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    let (secs, fraction) = match text.split_once('.') {
      Some((secs, fraction)) => (secs, Some(fraction)),
      None => (text, None),
    };
    if !is_digits(secs) {
      return Err(malformed());
    }
    let secs: u64 = secs.parse().map_err(|_| malformed())?;

    let nanos = match fraction {
      None => 0,
      Some(fraction) if is_digits(fraction) && fraction.len() <= 9 => {
        format!("{fraction:0<9}").parse().map_err(|_| malformed())?
      }
      Some(_) => return Err(malformed()),
    };

    Ok(MTime { secs, nanos })
  }
}
