//! Build targets: an artifact, its trace, and the task producing it.
//!
//! A [`Target`] is immutable once built. The artifact and trace never change;
//! only the completion state of the task moves from pending to done or failed.
//! A target built with [`Target::pure`] is complete from the start. For any
//! other target, the artifact and trace are meaningful once the task has been
//! observed to finish, either through [`Target::wait`] or by composing the
//! target with other work.

pub mod aggregate;
pub mod build;
pub mod file;

pub use aggregate::{collect_all, join_all};
pub use build::BuildTarget;
pub use file::FileTarget;

use crate::task::{Outcome, Scheduler, Task, TaskError};

/// An artifact, the evidence of how it was produced, and the work producing it.
#[derive(Debug, Clone)]
pub struct Target<T, A = ()> {
  artifact: A,
  trace: T,
  task: Task,
}

impl<T, A> Target<T, A> {
  pub fn new(artifact: A, trace: T, task: Task) -> Self {
    Self { artifact, trace, task }
  }

  /// An already-complete target.
  pub fn pure(artifact: A, trace: T) -> Self {
    Self::new(artifact, trace, Task::noop())
  }

  pub fn artifact(&self) -> &A {
    &self.artifact
  }

  pub fn trace(&self) -> &T {
    &self.trace
  }

  pub fn task(&self) -> &Task {
    &self.task
  }

  pub fn into_parts(self) -> (A, T, Task) {
    (self.artifact, self.trace, self.task)
  }

  /// Same artifact and task, different trace.
  pub fn with_trace<U>(self, trace: U) -> Target<U, A> {
    Target::new(self.artifact, trace, self.task)
  }

  /// Same trace and task, different artifact.
  pub fn with_artifact<B>(self, artifact: B) -> Target<T, B> {
    Target::new(artifact, self.trace, self.task)
  }

  pub fn discard_trace(self) -> Target<(), A> {
    self.with_trace(())
  }

  pub fn discard_artifact(self) -> Target<T, ()> {
    self.with_artifact(())
  }

  /// Block until the target's task finishes and return its artifact.
  pub fn wait(&self) -> Result<&A, TaskError> {
    self.task.wait()?;
    Ok(&self.artifact)
  }

  /// Run `action` once this target's task has succeeded.
  pub fn and_then<F>(&self, scheduler: &Scheduler, action: F) -> Task
  where
    F: FnOnce() -> Outcome + Send + 'static,
  {
    scheduler.after(&self.task, action)
  }
}

impl<T> Target<T, ()> {
  /// A target that only carries completion and evidence.
  pub fn opaque(trace: T, task: Task) -> Self {
    Self::new((), trace, task)
  }
}
