//! Marshaling session notifications onto a single-threaded UI context.
//!
//! Workers never touch the UI. They post [`RunnerEvent`]s and completion
//! callbacks through a [`UiHandle`]; the thread that owns the [`UiContext`]
//! (the UI event loop) drains them with [`UiContext::pump`] or
//! [`UiContext::pump_timeout`] and delivers them to its
//! [`NotificationSink`], in the exact order they were posted.
//!
//! # Example
//!
//! ```no_run
//! use pkgrun::dispatch::{RecordingSink, UiContext};
//! use pkgrun::runner::CommandRunner;
//! use pkgrun::config::RunnerConfig;
//! use std::time::Duration;
//!
//! let ui = UiContext::new();
//! let runner = CommandRunner::new(RunnerConfig::default(), ui.handle());
//! runner.submit("echo done", Some(Box::new(|| println!("finished"))));
//!
//! let mut sink = RecordingSink::new();
//! while !sink.is_finished() {
//!     ui.pump_timeout(&mut sink, Duration::from_millis(50));
//! }
//! ```

mod recording;

pub use recording::RecordingSink;

use crate::model::{ExitReport, RunnerEvent, SessionId};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Nullary callback run on the UI context when a session completes.
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Receiver of session notifications; lives on the UI thread.
///
/// Only [`on_progress`](Self::on_progress) and [`on_settle`](Self::on_settle)
/// are required. The other hooks default to doing nothing.
pub trait NotificationSink {
    /// Status text and/or progress fraction changed.
    fn on_progress(&mut self, message: Option<&str>, fraction: Option<f64>);

    /// The settle delay elapsed; return the progress display to idle.
    fn on_settle(&mut self);

    /// The session finished on the normal-exit path, after its callback ran.
    fn on_complete(&mut self) {}

    /// Every event, before the specific hook for it.
    fn on_event(&mut self, _event: &RunnerEvent) {}

    fn on_started(&mut self, _session_id: SessionId, _command: &str) {}

    /// A raw output line.
    fn on_output(&mut self, _line: &str) {}

    /// The process exited; the exit code is informational only.
    fn on_exit(&mut self, _exit: &ExitReport) {}

    /// The process could not be spawned. No settle or completion follows.
    fn on_failed(&mut self, _message: &str) {}
}

pub(crate) enum Envelope {
    Event(RunnerEvent),
    Complete {
        session_id: SessionId,
        callback: Option<CompletionCallback>,
    },
}

/// Sending side of the UI context, handed to runners.
#[derive(Clone)]
pub struct UiHandle {
    tx: Sender<Envelope>,
}

impl UiHandle {
    /// Post an event. Returns `false` if the UI context is gone.
    pub(crate) fn post(&self, event: RunnerEvent) -> bool {
        self.tx.send(Envelope::Event(event)).is_ok()
    }

    pub(crate) fn post_complete(
        &self,
        session_id: SessionId,
        callback: Option<CompletionCallback>,
    ) -> bool {
        self.tx
            .send(Envelope::Complete {
                session_id,
                callback,
            })
            .is_ok()
    }
}

impl std::fmt::Debug for UiHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiHandle").finish_non_exhaustive()
    }
}

/// The UI-affine end of the notification channel.
pub struct UiContext {
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
}

impl Default for UiContext {
    fn default() -> Self {
        Self::new()
    }
}

impl UiContext {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    #[must_use]
    pub fn handle(&self) -> UiHandle {
        UiHandle {
            tx: self.tx.clone(),
        }
    }

    /// Deliver everything already queued without blocking.
    ///
    /// Returns the number of notifications delivered. Meant to be called
    /// from an existing event loop tick.
    pub fn pump(&self, sink: &mut dyn NotificationSink) -> usize {
        let mut delivered = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            deliver(envelope, sink);
            delivered += 1;
        }
        delivered
    }

    /// Wait up to `timeout` for the next notification, then drain the queue.
    pub fn pump_timeout(&self, sink: &mut dyn NotificationSink, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(envelope) => {
                deliver(envelope, sink);
                1 + self.pump(sink)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        }
    }
}

fn deliver(envelope: Envelope, sink: &mut dyn NotificationSink) {
    match envelope {
        Envelope::Event(event) => {
            sink.on_event(&event);
            match &event {
                RunnerEvent::Started {
                    session_id,
                    command,
                    ..
                } => sink.on_started(*session_id, command),
                RunnerEvent::Output { line, .. } => sink.on_output(line),
                RunnerEvent::Progress {
                    message, fraction, ..
                } => sink.on_progress(message.as_deref(), *fraction),
                RunnerEvent::Exited { exit, .. } => sink.on_exit(exit),
                RunnerEvent::Failed { message, .. } => sink.on_failed(message),
                RunnerEvent::Settled { .. } => sink.on_settle(),
                RunnerEvent::Completed { .. } => sink.on_complete(),
            }
        }
        Envelope::Complete {
            session_id,
            callback,
        } => {
            if let Some(callback) = callback {
                callback();
            }
            deliver(Envelope::Event(RunnerEvent::Completed { session_id }), sink);
        }
    }
}
