//! Single-flight command execution engine.
//!
//! A [`CommandRunner`] runs at most one command at a time. [`submit`] returns
//! immediately; the command runs on a fresh worker thread that reads its
//! output line by line, classifies each line into a progress update, and
//! posts everything to the UI context through a [`UiHandle`].
//!
//! Session lifecycle, as seen by a [`NotificationSink`]:
//!
//! 1. `started`
//! 2. per non-empty output line: `output`, then `progress`
//! 3. `exited` (any exit code), then `progress(<complete message>, 1.0)`
//! 4. the settle delay passes, then `settled`
//! 5. the completion callback runs on the UI context, then `completed`
//!
//! If the command cannot be spawned, step 1 is followed by
//! `progress("Error: ...", 0.0)` and `failed`, and the completion callback
//! is dropped without being called.
//!
//! Submitting while a session is active does nothing and returns `None`.
//! There is no queue and no cancellation.
//!
//! [`submit`]: CommandRunner::submit
//! [`NotificationSink`]: crate::dispatch::NotificationSink

use crate::classify::OutputClassifier;
use crate::config::{Messages, RunnerConfig};
use crate::dispatch::{CompletionCallback, UiHandle};
use crate::error::RunnerError;
use crate::model::{CommandFamilies, ProgressUpdate, RunnerEvent, SessionId};
use crate::session::ProcessSession;
use crate::text::clean_line;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// A command to run, with its optional family tag and completion callback.
pub struct ExecutionRequest {
    command: String,
    families: Option<CommandFamilies>,
    on_complete: Option<CompletionCallback>,
}

impl ExecutionRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            families: None,
            on_complete: None,
        }
    }

    /// Tag the command explicitly instead of inferring families from its text.
    #[must_use]
    pub fn with_families(mut self, families: CommandFamilies) -> Self {
        self.families = Some(families);
        self
    }

    #[must_use]
    pub fn on_complete(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Explicit families, or the ones detected from the command string.
    #[must_use]
    pub fn families(&self) -> CommandFamilies {
        self.families
            .unwrap_or_else(|| CommandFamilies::detect(&self.command))
    }
}

impl std::fmt::Debug for ExecutionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionRequest")
            .field("command", &self.command)
            .field("families", &self.families)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Runs one external command at a time on behalf of a UI.
#[derive(Debug)]
pub struct CommandRunner {
    config: Arc<RunnerConfig>,
    ui: UiHandle,
    running: Arc<AtomicBool>,
}

impl CommandRunner {
    #[must_use]
    pub fn new(config: RunnerConfig, ui: UiHandle) -> Self {
        Self {
            config: Arc::new(config),
            ui,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Whether a session is active (including its settle delay).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run `command` through the shell, inferring its families from the text.
    ///
    /// Returns the new session's id, or `None` if a session is already
    /// running, in which case nothing else happens.
    pub fn submit(
        &self,
        command: impl Into<String>,
        on_complete: Option<CompletionCallback>,
    ) -> Option<SessionId> {
        let mut request = ExecutionRequest::new(command);
        request.on_complete = on_complete;
        self.submit_request(request)
    }

    /// Run a request; same contract as [`submit`](Self::submit).
    pub fn submit_request(&self, request: ExecutionRequest) -> Option<SessionId> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(command = %request.command, "a command is already running; submission dropped");
            return None;
        }

        let session_id = SessionId::new();
        let families = request.families();
        let messages = self.config.messages();
        let worker = Worker {
            session_id,
            families,
            command: request.command,
            on_complete: request.on_complete,
            messages: messages.clone(),
            config: Arc::clone(&self.config),
            ui: self.ui.clone(),
            guard: RunningGuard::new(Arc::clone(&self.running)),
        };

        let spawned = thread::Builder::new()
            .name(format!("pkgrun-{session_id}"))
            .spawn(move || worker.run());
        if let Err(err) = spawned {
            // The closure, and the running guard inside it, is already dropped.
            tracing::warn!(%session_id, error = %err, "failed to start worker thread");
            let message = messages.error(&err.to_string());
            self.ui.post(RunnerEvent::progress(
                session_id,
                ProgressUpdate::new(Some(message.clone()), Some(0.0)),
            ));
            self.ui.post(RunnerEvent::Failed {
                session_id,
                message,
            });
        }
        Some(session_id)
    }
}

/// Clears the engine's running flag exactly once, even if the worker unwinds.
struct RunningGuard {
    flag: Arc<AtomicBool>,
    released: bool,
}

impl RunningGuard {
    fn new(flag: Arc<AtomicBool>) -> Self {
        Self {
            flag,
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.flag.store(false, Ordering::Release);
            self.released = true;
        }
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.release();
    }
}

struct Worker {
    session_id: SessionId,
    families: CommandFamilies,
    command: String,
    on_complete: Option<CompletionCallback>,
    messages: Messages,
    config: Arc<RunnerConfig>,
    ui: UiHandle,
    guard: RunningGuard,
}

impl Worker {
    fn run(mut self) {
        let span = tracing::info_span!("session", session_id = %self.session_id);
        let _entered = span.enter();
        tracing::info!(command = %self.command, families = %self.families, "session started");

        self.post(RunnerEvent::Started {
            session_id: self.session_id,
            command: self.command.clone(),
            families: self.families,
        });

        let mut process = match ProcessSession::spawn(&self.command, &self.config) {
            Ok(process) => process,
            Err(err) => {
                self.fail(&err);
                return;
            }
        };
        tracing::debug!(pid = ?process.process_id(), "command spawned");

        let mut classifier = OutputClassifier::new(self.families, self.messages.clone());
        let read = process.read_lines(|raw| {
            let line = clean_line(&raw);
            if line.is_empty() {
                return;
            }
            tracing::trace!(%line, "output");
            let update = classifier.update_for(&line);
            self.post(RunnerEvent::Output {
                session_id: self.session_id,
                line,
            });
            self.post(RunnerEvent::progress(self.session_id, update));
        });
        if let Err(err) = read {
            tracing::warn!(error = %err, "output stream ended with an error");
        }

        match process.wait() {
            Ok(exit) => {
                tracing::info!(exit_code = exit.exit_code, success = exit.success, "command exited");
                self.post(RunnerEvent::Exited {
                    session_id: self.session_id,
                    exit,
                });
            }
            Err(err) => tracing::warn!(error = %err, "failed to reap command"),
        }
        drop(process);

        let complete = ProgressUpdate::new(Some(self.messages.complete().to_string()), Some(1.0));
        self.post(RunnerEvent::progress(self.session_id, complete));

        thread::sleep(self.config.settle_delay());

        self.post(RunnerEvent::Settled {
            session_id: self.session_id,
        });
        self.guard.release();
        if !self.ui.post_complete(self.session_id, self.on_complete.take()) {
            tracing::debug!("ui context is gone; completion not delivered");
        }
        tracing::info!("session finished");
    }

    /// Spawn-failure path: error status, no settle, no completion callback.
    fn fail(&mut self, err: &RunnerError) {
        tracing::warn!(error = %err, "failed to start command");
        let message = self.messages.error(&err.to_string());
        self.post(RunnerEvent::progress(
            self.session_id,
            ProgressUpdate::new(Some(message.clone()), Some(0.0)),
        ));
        self.guard.release();
        self.post(RunnerEvent::Failed {
            session_id: self.session_id,
            message,
        });
        self.on_complete = None;
    }

    fn post(&self, event: RunnerEvent) {
        if !self.ui.post(event) {
            tracing::debug!("ui context is gone; notification discarded");
        }
    }
}
