//! pkgrun: run package-management commands one at a time and report
//! heuristic progress to a single-threaded UI.
//!
//! A welcome or installer application hands [`CommandRunner::submit`] a
//! complete shell command (including any `pkexec` prefix) and an optional
//! completion callback. The runner spawns the command on a worker thread,
//! turns its `apt`, `dpkg`, `wget`, `unzip` and `flatpak` output into
//! status text and progress fractions, and posts every notification to a
//! [`UiContext`] that the UI thread drains.
//!
//! # Example
//!
//! ```no_run
//! use pkgrun::{CommandRunner, RecordingSink, RunnerConfig, UiContext};
//! use std::time::Duration;
//!
//! let ui = UiContext::new();
//! let runner = CommandRunner::new(RunnerConfig::default(), ui.handle());
//! runner.submit("pkexec apt-get install -y vlc", None);
//!
//! let mut sink = RecordingSink::new();
//! while !sink.is_finished() {
//!     ui.pump_timeout(&mut sink, Duration::from_millis(100));
//! }
//! ```

#![forbid(unsafe_code)]
// Field-level docs are still sparse; the types and operations are documented.
#![allow(missing_docs)]

pub mod classify;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod runner;
pub mod session;
pub mod text;

pub use crate::config::{load_config_file, RunnerConfig, RunnerConfigBuilder};
pub use crate::dispatch::{CompletionCallback, NotificationSink, RecordingSink, UiContext, UiHandle};
pub use crate::error::{RunnerError, RunnerResult};
pub use crate::runner::{CommandRunner, ExecutionRequest};
