//! Build traces: evidence of when and how an artifact was produced.
//!
//! Every trace kind implements [`Trace`], which provides an identity value and
//! a merge over a list of traces. Aggregation operators only rely on this
//! trait, so any trace kind can be joined the same way.
//!
//! Merge rules per kind:
//! - `MTime`: maximum, order-independent
//! - `Hash`: left-to-right mixing fold, order-sensitive
//! - `BuildTrace`: each component with its own rule

pub mod build;
pub mod hash;
pub mod mtime;

pub use build::{BuildTrace, ParseBuildTraceError};
pub use hash::{Hash, ParseHashError};
pub use mtime::{MTime, MTimeError};

/// A mergeable trace.
pub trait Trace: Clone + Send + Sync + 'static {
  /// The trace of a join over no targets.
  fn identity() -> Self;

  /// Combine the traces of several targets into the trace of their join.
  fn merge<'a, I>(traces: I) -> Self
  where
    I: IntoIterator<Item = &'a Self>;
}

/// The trivial trace, used when evidence is discarded.
impl Trace for () {
  fn identity() -> Self {}

  fn merge<'a, I>(_traces: I) -> Self
  where
    I: IntoIterator<Item = &'a Self>,
  {
  }
}

impl Trace for MTime {
  fn identity() -> Self {
    MTime::EPOCH
  }

  fn merge<'a, I>(traces: I) -> Self
  where
    I: IntoIterator<Item = &'a Self>,
  {
    merge_timestamps(traces)
  }
}

impl Trace for Hash {
  fn identity() -> Self {
    Hash::NIL
  }

  fn merge<'a, I>(traces: I) -> Self
  where
    I: IntoIterator<Item = &'a Self>,
  {
    fold_digests(Hash::NIL, traces)
  }
}

impl Trace for BuildTrace {
  fn identity() -> Self {
    BuildTrace::NIL
  }

  fn merge<'a, I>(traces: I) -> Self
  where
    I: IntoIterator<Item = &'a Self>,
  {
    merge_paired(traces)
  }
}

/// Latest of the given timestamps, or the epoch if there are none.
pub fn merge_timestamps<'a, I>(times: I) -> MTime
where
  I: IntoIterator<Item = &'a MTime>,
{
  times.into_iter().copied().max().unwrap_or(MTime::EPOCH)
}

/// Fold digests left to right into `zero`.
///
/// The result depends on the order of `hashes`.
pub fn fold_digests<'a, I>(zero: Hash, hashes: I) -> Hash
where
  I: IntoIterator<Item = &'a Hash>,
{
  hashes.into_iter().fold(zero, |acc, hash| acc.mix(*hash))
}

/// Merge paired traces componentwise.
pub fn merge_paired<'a, I>(traces: I) -> BuildTrace
where
  I: IntoIterator<Item = &'a BuildTrace>,
{
  traces.into_iter().fold(BuildTrace::NIL, |acc, trace| acc.mix(trace))
}
