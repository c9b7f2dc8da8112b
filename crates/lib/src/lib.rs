//! kiln-lib: incremental, parallel build-orchestration core
//!
//! This crate provides the building blocks a build engine composes:
//! - `Task`: handle to asynchronous build work, waitable and composable
//! - `Scheduler`: shared worker pool running and sequencing tasks
//! - `Trace`: mergeable build evidence (`MTime`, `Hash`, `BuildTrace`)
//! - `Target`: an artifact, its trace, and the task producing it
//! - `join_all` / `collect_all`: combine many targets into one
//! - `BuildCache`: memo table so shared dependencies build once

pub mod cache;
pub mod config;
pub mod target;
pub mod task;
pub mod trace;

pub use cache::BuildCache;
pub use config::{ConfigError, ExecuteConfig};
pub use target::{BuildTarget, FileTarget, Target, collect_all, join_all};
pub use task::{Outcome, Scheduler, Task, TaskError};
pub use trace::{BuildTrace, Hash, MTime, MTimeError, ParseBuildTraceError, ParseHashError, Trace};
