//! Time-only file targets.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::task::{Outcome, Scheduler, Task};
use crate::trace::MTime;

use super::Target;

/// A file location traced by its modification time.
pub type FileTarget = Target<MTime, PathBuf>;

impl Target<MTime, PathBuf> {
  /// Complete target for a file that already exists.
  pub fn computed(path: impl Into<PathBuf>) -> io::Result<Self> {
    let path = path.into();
    let mtime = MTime::of_path(&path)?;
    Ok(Target::pure(path, mtime))
  }

  /// Target for the file at `path`, written by `task`.
  pub fn at(path: impl Into<PathBuf>, mtime: MTime, task: Task) -> Self {
    Target::new(path.into(), mtime, task)
  }

  pub fn path(&self) -> &Path {
    self.artifact()
  }

  /// Produce `path` with `action` unless it is already fresh.
  ///
  /// The file is fresh when it exists and is no older than the merged
  /// timestamp of `deps`. A fresh file is not rebuilt; its target completes
  /// with `deps`. Otherwise `action` runs after `deps` and the target is
  /// stamped with the time the rebuild was scheduled.
  pub fn build_unless_up_to_date<D, F>(
    scheduler: &Scheduler,
    path: impl Into<PathBuf>,
    deps: &Target<MTime, D>,
    action: F,
  ) -> Self
  where
    F: FnOnce() -> Outcome + Send + 'static,
  {
    let path = path.into();

    match MTime::of_path(&path) {
      Ok(mtime) if mtime.is_up_to_date(deps.trace()) => {
        debug!(path = %path.display(), mtime = %mtime, "file is up to date");
        Target::new(path, mtime, deps.task().clone())
      }
      _ => {
        debug!(path = %path.display(), deps = %deps.trace(), "rebuilding file");
        let task = deps.and_then(scheduler, action);
        Target::new(path, MTime::now(), task)
      }
    }
  }
}
