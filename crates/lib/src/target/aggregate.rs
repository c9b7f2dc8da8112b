//! Joining many targets into one.

use tracing::debug;

use crate::task::{Scheduler, Task};
use crate::trace::Trace;

use super::Target;

/// Join `targets` into one target whose trace is the merge of their traces.
///
/// The result's task completes once every input task has completed and
/// carries the failure of the earliest failing input in sequence order.
pub fn join_all<T, A, I>(scheduler: &Scheduler, targets: I) -> Target<T, ()>
where
  T: Trace,
  I: IntoIterator<Item = Target<T, A>>,
{
  let (_, traces, tasks) = split(targets);
  debug!(targets = tasks.len(), "joining targets");
  Target::opaque(T::merge(&traces), scheduler.join_all(&tasks))
}

/// Like [`join_all`], but keeps every artifact, in input order.
pub fn collect_all<T, A, I>(scheduler: &Scheduler, targets: I) -> Target<T, Vec<A>>
where
  T: Trace,
  I: IntoIterator<Item = Target<T, A>>,
{
  let (artifacts, traces, tasks) = split(targets);
  debug!(targets = tasks.len(), "collecting targets");
  Target::new(artifacts, T::merge(&traces), scheduler.join_all(&tasks))
}

fn split<T, A, I>(targets: I) -> (Vec<A>, Vec<T>, Vec<Task>)
where
  I: IntoIterator<Item = Target<T, A>>,
{
  let targets = targets.into_iter();
  let (lower, _) = targets.size_hint();
  let mut artifacts = Vec::with_capacity(lower);
  let mut traces = Vec::with_capacity(lower);
  let mut tasks = Vec::with_capacity(lower);

  for target in targets {
    let (artifact, trace, task) = target.into_parts();
    artifacts.push(artifact);
    traces.push(trace);
    tasks.push(task);
  }

  (artifacts, traces, tasks)
}
