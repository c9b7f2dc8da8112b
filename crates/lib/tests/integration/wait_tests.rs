//! Blocking waits and failure propagation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use kiln_lib::{MTime, Target, Task, TaskError};

use super::common::{counting_action, gated, scheduler};

#[test]
fn wait_on_pure_target_returns_artifact() {
  let target = Target::pure("x", MTime::new(1, 0));
  assert_eq!(target.wait(), Ok(&"x"));
}

#[test]
fn after_all_with_failed_first_never_runs_action() {
  let sched = scheduler();
  let a = sched.spawn(|| Err(TaskError::msg("boom")));
  let b = sched.spawn(|| Ok(()));
  let (runs, action) = counting_action();

  let joined = sched.after_all(&[a, b], action);

  let err = joined.wait().unwrap_err();
  assert_eq!(err.to_string(), "boom");
  assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn after_all_with_failed_second_reports_it() {
  let sched = scheduler();
  let a = sched.spawn(|| Ok(()));
  let b = sched.spawn(|| Err(TaskError::msg("bad")));
  let (runs, action) = counting_action();

  let joined = sched.after_all(&[a, b], action);

  assert_eq!(joined.wait(), Err(TaskError::msg("bad")));
  assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn failure_order_follows_sequence_not_time() {
  let sched = scheduler();
  let (a, release_a) = gated(&sched, Err(TaskError::msg("a failed")));
  let (b, release_b) = gated(&sched, Err(TaskError::msg("b failed")));

  let joined = sched.join_all(&[a, b.clone()]);

  // b fails first in time.
  release_b.send(()).unwrap();
  assert!(b.wait().is_err());
  thread::sleep(Duration::from_millis(10));
  release_a.send(()).unwrap();

  assert_eq!(joined.wait(), Err(TaskError::msg("a failed")));
}

#[test]
fn concurrent_waits_on_one_target_run_work_once() {
  let sched = scheduler();
  let runs = Arc::new(AtomicUsize::new(0));
  let counter = runs.clone();
  let target = Arc::new(Target::new(
    vec![1, 2, 3],
    MTime::new(5, 0),
    sched.spawn(move || {
      thread::sleep(Duration::from_millis(20));
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }),
  ));

  let first = {
    let target = target.clone();
    thread::spawn(move || target.wait().cloned())
  };
  let second = {
    let target = target.clone();
    thread::spawn(move || target.wait().cloned())
  };

  assert_eq!(first.join().unwrap(), Ok(vec![1, 2, 3]));
  assert_eq!(second.join().unwrap(), Ok(vec![1, 2, 3]));
  assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn sibling_failure_does_not_cancel_running_work() {
  let sched = scheduler();
  let (slow, release) = gated(&sched, Ok(()));
  let failing = sched.spawn(|| Err(TaskError::msg("sibling")));

  let joined = sched.join_all(&[failing, slow.clone()]);
  assert_eq!(joined.wait(), Err(TaskError::msg("sibling")));

  release.send(()).unwrap();
  assert_eq!(slow.wait(), Ok(()));
}

#[test]
fn failure_propagates_through_chain() {
  let sched = scheduler();
  let root = Task::failed(TaskError::msg("root"));
  let (runs, action) = counting_action();

  let middle = sched.after(&root, || Ok(()));
  let leaf = sched.after(&middle, action);

  assert_eq!(leaf.wait(), Err(TaskError::msg("root")));
  assert_eq!(runs.load(Ordering::SeqCst), 0);
}
