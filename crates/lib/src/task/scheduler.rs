//! Worker pool that runs and composes tasks.
//!
//! The scheduler owns (or borrows) a multi-threaded tokio runtime. Units of
//! work run on its blocking pool, bounded by a semaphore sized from
//! [`ExecuteConfig::parallelism`]. Continuations registered with
//! [`Scheduler::after`] and [`Scheduler::after_all`] are plain async tasks that
//! wait for their prerequisites, so registering one never blocks the caller.

use std::any::Any;
use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::ExecuteConfig;

use super::{Completer, Outcome, Task, TaskError};

type Action = Box<dyn FnOnce() -> Outcome + Send + 'static>;

/// Shared pool of worker threads for build tasks.
pub struct Scheduler {
  handle: Handle,
  permits: Arc<Semaphore>,
  /// Present when the scheduler created its own runtime.
  _runtime: Option<Runtime>,
}

impl Scheduler {
  /// Create a scheduler with its own runtime.
  ///
  /// The scheduler must be dropped from a thread that is not driving an
  /// async runtime.
  pub fn new(config: &ExecuteConfig) -> io::Result<Self> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
      .worker_threads(config.worker_threads.max(1))
      .thread_name(config.thread_name.clone())
      .enable_all()
      .build()?;

    info!(
      worker_threads = config.worker_threads,
      parallelism = config.parallelism,
      "started build scheduler"
    );

    Ok(Self {
      handle: runtime.handle().clone(),
      permits: Arc::new(Semaphore::new(config.parallelism.max(1))),
      _runtime: Some(runtime),
    })
  }

  /// Create a scheduler on top of an existing runtime.
  pub fn from_handle(handle: Handle, config: &ExecuteConfig) -> Self {
    Self {
      handle,
      permits: Arc::new(Semaphore::new(config.parallelism.max(1))),
      _runtime: None,
    }
  }

  /// The runtime handle tasks are spawned on.
  pub fn handle(&self) -> &Handle {
    &self.handle
  }

  /// Run a blocking unit of work on the pool.
  pub fn spawn<F>(&self, action: F) -> Task
  where
    F: FnOnce() -> Outcome + Send + 'static,
  {
    self.schedule(Vec::new(), Some(Box::new(action)))
  }

  /// Run an async unit of work on the pool.
  ///
  /// Async work does not hold a worker permit while it runs, so it may await
  /// other tasks with [`Task::completed`] without starving them. Blocking
  /// parts should be submitted with [`Scheduler::spawn`] and awaited.
  pub fn spawn_async<Fut>(&self, work: Fut) -> Task
  where
    Fut: Future<Output = Outcome> + Send + 'static,
  {
    let (task, completer) = Completer::new();
    let handle = self.handle.clone();

    debug!("spawning async work");
    self.handle.spawn(async move {
      completer.finish(settle(handle.spawn(work).await));
    });

    task
  }

  /// Run `action` once `task` completes.
  ///
  /// The returned task fails if either `task` or `action` fails. If `task`
  /// has already failed, `action` never runs and the failure is carried
  /// over immediately.
  pub fn after<F>(&self, task: &Task, action: F) -> Task
  where
    F: FnOnce() -> Outcome + Send + 'static,
  {
    self.after_all(std::slice::from_ref(task), action)
  }

  /// Run `action` once every task in `tasks` has completed.
  ///
  /// If any prerequisite fails, `action` never runs. When several fail, the
  /// failure of the earliest task in `tasks` is the one reported, whatever
  /// order they finished in.
  pub fn after_all<F>(&self, tasks: &[Task], action: F) -> Task
  where
    F: FnOnce() -> Outcome + Send + 'static,
  {
    if let Some(err) = settled_failure(tasks) {
      warn!(error = %err, "prerequisite already failed, skipping action");
      return Task::failed(err);
    }
    self.schedule(tasks.to_vec(), Some(Box::new(action)))
  }

  /// A task that completes once every task in `tasks` has completed.
  ///
  /// Same failure rules as [`Scheduler::after_all`].
  pub fn join_all(&self, tasks: &[Task]) -> Task {
    if tasks.iter().all(|t| matches!(t.outcome(), Some(Ok(())))) {
      return Task::noop();
    }
    if let Some(err) = settled_failure(tasks) {
      return Task::failed(err);
    }
    self.schedule(tasks.to_vec(), None)
  }

  fn schedule(&self, prerequisites: Vec<Task>, action: Option<Action>) -> Task {
    let (task, completer) = Completer::new();
    let permits = self.permits.clone();

    debug!(
      prerequisites = prerequisites.len(),
      has_action = action.is_some(),
      "scheduling task"
    );

    self.handle.spawn(async move {
      let outcome = match await_in_order(&prerequisites).await {
        Err(err) => {
          if action.is_some() {
            warn!(error = %err, "prerequisite failed, skipping action");
          }
          Err(err)
        }
        Ok(()) => match action {
          Some(action) => run_blocking(permits, action).await,
          None => Ok(()),
        },
      };
      completer.finish(outcome);
    });

    task
  }
}

impl std::fmt::Debug for Scheduler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Scheduler")
      .field("available_permits", &self.permits.available_permits())
      .field("owns_runtime", &self._runtime.is_some())
      .finish()
  }
}

/// Look for a failure that is already decided by sequence order.
///
/// Walks `tasks` front to back and stops at the first one still running,
/// since that task could yet fail and would then take precedence.
fn settled_failure(tasks: &[Task]) -> Option<TaskError> {
  for task in tasks {
    match task.outcome() {
      Some(Ok(())) => continue,
      Some(Err(err)) => return Some(err),
      None => return None,
    }
  }
  None
}

async fn await_in_order(tasks: &[Task]) -> Outcome {
  for task in tasks {
    task.completed().await?;
  }
  Ok(())
}

async fn run_blocking(permits: Arc<Semaphore>, action: Action) -> Outcome {
  let Ok(_permit) = permits.acquire_owned().await else {
    return Err(TaskError::Aborted);
  };
  settle(tokio::task::spawn_blocking(action).await)
}

/// Turn the result of a joined tokio task into an outcome.
fn settle(joined: Result<Outcome, tokio::task::JoinError>) -> Outcome {
  match joined {
    Ok(Ok(())) => Ok(()),
    Ok(Err(err)) => {
      error!(error = %err, "task failed");
      Err(err)
    }
    Err(join_err) if join_err.is_panic() => {
      let message = panic_message(join_err.into_panic());
      error!(panic = %message, "task panicked");
      Err(TaskError::Panicked(message))
    }
    Err(_) => Err(TaskError::Aborted),
  }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}
