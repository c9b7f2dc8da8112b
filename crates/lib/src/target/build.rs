//! Hash and time targets.

use std::io;
use std::path::PathBuf;

use crate::task::Task;
use crate::trace::{BuildTrace, Hash, MTime};

use super::Target;

/// An arbitrary artifact traced by both a digest and a timestamp.
pub type BuildTarget<A> = Target<BuildTrace, A>;

impl<A> Target<BuildTrace, A> {
  pub fn from_trace_parts(artifact: A, hash: Hash, mtime: MTime, task: Task) -> Self {
    Target::new(artifact, BuildTrace::new(hash, mtime), task)
  }

  pub fn hash(&self) -> Hash {
    self.trace().hash
  }

  pub fn mtime(&self) -> MTime {
    self.trace().mtime
  }

  /// Keep only the timestamp half of the trace.
  pub fn into_mtime_target(self) -> Target<MTime, A> {
    let mtime = self.mtime();
    self.with_trace(mtime)
  }
}

impl Target<BuildTrace, PathBuf> {
  /// Complete target for an existing file, traced by its contents and mtime.
  pub fn computed_file(path: impl Into<PathBuf>) -> io::Result<Self> {
    let path = path.into();
    let trace = BuildTrace::compute(&path)?;
    Ok(Target::pure(path, trace))
  }
}
