//! Aggregation of targets.

use std::sync::atomic::Ordering;

use kiln_lib::trace::fold_digests;
use kiln_lib::{BuildTarget, BuildTrace, Hash, MTime, Target, TaskError, collect_all, join_all};

use super::common::{counting_action, gated, scheduler};

fn ts(secs: u64) -> MTime {
  MTime::new(secs, 0)
}

#[test]
fn join_all_takes_latest_timestamp() {
  let sched = scheduler();
  let joined = join_all(&sched, vec![Target::pure((), ts(5)), Target::pure((), ts(10))]);
  assert_eq!(*joined.trace(), ts(10));
}

#[test]
fn collect_all_keeps_artifacts_in_order() {
  let sched = scheduler();
  let collected = collect_all(&sched, vec![Target::pure(1, ts(1)), Target::pure(2, ts(3))]);
  assert_eq!(collected.wait(), Ok(&vec![1, 2]));
  assert_eq!(*collected.trace(), ts(3));
}

#[test]
fn collect_all_order_holds_when_work_finishes_out_of_order() {
  let sched = scheduler();
  let (first, release_first) = gated(&sched, Ok(()));
  let second = sched.spawn(|| Ok(()));

  let collected = collect_all(
    &sched,
    vec![Target::new("first", ts(1), first), Target::new("second", ts(2), second)],
  );

  release_first.send(()).unwrap();
  assert_eq!(collected.wait(), Ok(&vec!["first", "second"]));
}

#[test]
fn joined_hash_trace_depends_on_order() {
  let sched = scheduler();
  let a = BuildTarget::from_trace_parts("a", Hash::of_str("a"), ts(1), sched.spawn(|| Ok(())));
  let b = BuildTarget::from_trace_parts("b", Hash::of_str("b"), ts(2), sched.spawn(|| Ok(())));

  let ab = join_all(&sched, vec![a.clone(), b.clone()]);
  let ba = join_all(&sched, vec![b, a]);

  assert_eq!(ab.trace().hash, fold_digests(Hash::NIL, &[Hash::of_str("a"), Hash::of_str("b")]));
  assert_ne!(ab.trace().hash, ba.trace().hash);
  assert_eq!(ab.trace().mtime, ba.trace().mtime);
  assert!(ab.wait().is_ok());
  assert!(ba.wait().is_ok());
}

#[test]
fn joined_target_gates_dependent_step() {
  let sched = scheduler();
  let (gate, release) = gated(&sched, Ok(()));
  let deps = join_all(
    &sched,
    vec![Target::opaque(BuildTrace::NIL, gate), Target::pure((), BuildTrace::NIL)],
  );
  let (runs, action) = counting_action();

  let link = deps.and_then(&sched, action);
  assert!(!link.is_finished());
  assert_eq!(runs.load(Ordering::SeqCst), 0);

  release.send(()).unwrap();
  assert_eq!(link.wait(), Ok(()));
  assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn collect_all_reports_failure_of_earliest_input() {
  let sched = scheduler();
  let collected = collect_all(
    &sched,
    vec![
      Target::new(1, ts(1), sched.spawn(|| Ok(()))),
      Target::new(2, ts(2), sched.spawn(|| Err(TaskError::msg("second")))),
      Target::new(3, ts(3), sched.spawn(|| Err(TaskError::msg("third")))),
    ],
  );
  assert_eq!(collected.wait(), Err(TaskError::msg("second")));
}
