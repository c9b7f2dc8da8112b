//! A small build graph driven end to end.
//!
//! ```text
//!     header
//!     /    \
//!  a.o     b.o
//!     \    /
//!      app
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kiln_lib::{BuildCache, FileTarget, Hash, MTime, Scheduler, Target, collect_all, join_all};
use tempfile::TempDir;

use super::common::scheduler;

struct Graph<'a> {
  sched: &'a Scheduler,
  cache: BuildCache<&'static str, MTime, PathBuf>,
  dir: PathBuf,
  runs: Arc<AtomicUsize>,
}

impl Graph<'_> {
  fn header(&self) -> FileTarget {
    self.cache.get_or_build("header", Hash(1), || {
      let path = self.dir.join("common.h");
      FileTarget::build_unless_up_to_date(self.sched, &path, &Target::pure((), MTime::EPOCH), {
        let path = path.clone();
        let runs = self.runs.clone();
        move || {
          runs.fetch_add(1, Ordering::SeqCst);
          fs::write(&path, "#define N 1")?;
          Ok(())
        }
      })
    })
  }

  fn object(&self, name: &'static str) -> FileTarget {
    self.cache.get_or_build(name, Hash(1), || {
      let header = self.header();
      let path = self.dir.join(name);
      let input = header.path().to_path_buf();
      let runs = self.runs.clone();
      let output = path.clone();
      FileTarget::build_unless_up_to_date(self.sched, &path, &header, move || {
        runs.fetch_add(1, Ordering::SeqCst);
        let contents = fs::read_to_string(&input)?;
        fs::write(&output, contents)?;
        Ok(())
      })
    })
  }

  fn app(&self) -> Target<MTime, Vec<PathBuf>> {
    collect_all(self.sched, vec![self.object("a.o"), self.object("b.o")])
  }
}

#[test]
fn shared_dependency_builds_once() {
  let sched = scheduler();
  let temp = TempDir::new().unwrap();
  let graph = Graph {
    sched: &sched,
    cache: BuildCache::new(),
    dir: temp.path().to_path_buf(),
    runs: Arc::new(AtomicUsize::new(0)),
  };

  let app = graph.app();
  let objects = app.wait().unwrap().clone();

  assert_eq!(objects, vec![temp.path().join("a.o"), temp.path().join("b.o")]);
  assert_eq!(fs::read_to_string(temp.path().join("b.o")).unwrap(), "#define N 1");
  // header + a.o + b.o
  assert_eq!(graph.runs.load(Ordering::SeqCst), 3);
}

#[test]
fn second_run_is_up_to_date() {
  let sched = scheduler();
  let temp = TempDir::new().unwrap();

  let first = Graph {
    sched: &sched,
    cache: BuildCache::new(),
    dir: temp.path().to_path_buf(),
    runs: Arc::new(AtomicUsize::new(0)),
  };
  assert!(first.app().wait().is_ok());

  let second = Graph {
    sched: &sched,
    cache: BuildCache::new(),
    dir: temp.path().to_path_buf(),
    runs: Arc::new(AtomicUsize::new(0)),
  };
  let app = second.app();
  assert!(app.wait().is_ok());
  assert_eq!(second.runs.load(Ordering::SeqCst), 0);

  let joined = join_all(&sched, vec![second.object("a.o"), second.object("b.o")]);
  assert_eq!(*joined.trace(), *app.trace());
}
