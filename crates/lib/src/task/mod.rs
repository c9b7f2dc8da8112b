//! Asynchronous handles to units of build work.
//!
//! A [`Task`] is a cheap, cloneable handle to work that is either still in
//! flight or has finished. The outcome is recorded exactly once; every clone of
//! the handle observes that same outcome, whether it blocks on [`Task::wait`]
//! from a plain thread or awaits [`Task::completed`] from inside the scheduler.
//!
//! Tasks are created by the [`Scheduler`], which also provides the
//! composition operators (`after`, `after_all`, `join_all`).

pub mod scheduler;

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::Notify;

pub use scheduler::Scheduler;

/// A failure recorded by a task.
///
/// Errors are cloneable so that every waiter on a shared task receives the
/// same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
  /// The unit of work reported a failure.
  #[error("{0}")]
  Failed(String),

  /// The unit of work panicked.
  #[error("task panicked: {0}")]
  Panicked(String),

  /// The worker pool shut down before the work finished.
  #[error("task aborted before completion")]
  Aborted,
}

impl TaskError {
  /// Build a [`TaskError::Failed`] from any displayable message.
  pub fn msg(message: impl fmt::Display) -> Self {
    TaskError::Failed(message.to_string())
  }
}

impl From<std::io::Error> for TaskError {
  fn from(err: std::io::Error) -> Self {
    TaskError::Failed(err.to_string())
  }
}

/// The final state of a task.
pub type Outcome = Result<(), TaskError>;

struct TaskState {
  outcome: Mutex<Option<Outcome>>,
  /// Wakes threads blocked in `wait`.
  finished: Condvar,
  /// Wakes continuations awaiting `completed`.
  notify: Notify,
}

/// Handle to in-flight or finished work.
#[derive(Clone)]
pub struct Task {
  state: Arc<TaskState>,
}

impl Task {
  /// An already-completed task with no effect.
  pub fn noop() -> Self {
    Self::with_outcome(Some(Ok(())))
  }

  /// An already-failed task carrying `err`.
  pub fn failed(err: TaskError) -> Self {
    Self::with_outcome(Some(Err(err)))
  }

  fn with_outcome(outcome: Option<Outcome>) -> Self {
    Self {
      state: Arc::new(TaskState {
        outcome: Mutex::new(outcome),
        finished: Condvar::new(),
        notify: Notify::new(),
      }),
    }
  }

  fn slot(&self) -> MutexGuard<'_, Option<Outcome>> {
    self.state.outcome.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Record the outcome. Only the first call has any effect.
  fn complete(&self, outcome: Outcome) {
    {
      let mut slot = self.slot();
      if slot.is_some() {
        return;
      }
      *slot = Some(outcome);
    }
    self.state.finished.notify_all();
    self.state.notify.notify_waiters();
  }

  /// The outcome, if the task has finished.
  pub fn outcome(&self) -> Option<Outcome> {
    self.slot().clone()
  }

  /// Returns true once the task has either succeeded or failed.
  pub fn is_finished(&self) -> bool {
    self.slot().is_some()
  }

  /// Block the calling thread until the task finishes.
  ///
  /// Returns the failure recorded by the task, if any. Must not be called
  /// from inside an async context driven by the scheduler's own workers;
  /// continuations should use [`Task::completed`] instead.
  pub fn wait(&self) -> Outcome {
    let mut slot = self.slot();
    loop {
      if let Some(outcome) = slot.as_ref() {
        return outcome.clone();
      }
      slot = self.state.finished.wait(slot).unwrap_or_else(PoisonError::into_inner);
    }
  }

  /// Wait for the task to finish without blocking a thread.
  pub async fn completed(&self) -> Outcome {
    loop {
      let notified = self.state.notify.notified();
      tokio::pin!(notified);
      // Register before checking so a completion in between is not missed.
      notified.as_mut().enable();

      if let Some(outcome) = self.outcome() {
        return outcome;
      }
      notified.await;
    }
  }

  /// Returns true if both handles refer to the same unit of work.
  pub fn ptr_eq(&self, other: &Task) -> bool {
    Arc::ptr_eq(&self.state, &other.state)
  }
}

impl fmt::Debug for Task {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.outcome() {
      None => f.write_str("Task(pending)"),
      Some(Ok(())) => f.write_str("Task(done)"),
      Some(Err(err)) => write!(f, "Task(failed: {})", err),
    }
  }
}

/// Write side of a pending task.
///
/// Dropping a completer without finishing it records [`TaskError::Aborted`],
/// so waiters never hang on work that the runtime discarded.
pub(crate) struct Completer {
  task: Task,
}

impl Completer {
  pub(crate) fn new() -> (Task, Completer) {
    let task = Task::with_outcome(None);
    (task.clone(), Completer { task })
  }

  pub(crate) fn finish(self, outcome: Outcome) {
    self.task.complete(outcome);
  }
}

impl Drop for Completer {
  fn drop(&mut self) {
    self.task.complete(Err(TaskError::Aborted));
  }
}
