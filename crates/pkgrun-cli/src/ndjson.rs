//! Machine-readable output: one JSON event per line.

use crate::{OutcomeSink, SessionOutcome};
use pkgrun::model::RunnerEvent;
use pkgrun::NotificationSink;
use std::io::Write;

/// Writes every [`RunnerEvent`] as a JSON line and flushes after each one,
/// so a consumer sees progress as it happens.
pub struct NdjsonSink<W: Write> {
    out: W,
    outcome: SessionOutcome,
}

impl<W: Write> NdjsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            outcome: SessionOutcome::default(),
        }
    }
}

impl<W: Write> NotificationSink for NdjsonSink<W> {
    fn on_event(&mut self, event: &RunnerEvent) {
        self.outcome.record(event);
        let written = serde_json::to_writer(&mut self.out, event)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush());
        if let Err(err) = written {
            tracing::warn!(error = %err, "failed to write event");
        }
    }

    fn on_progress(&mut self, _message: Option<&str>, _fraction: Option<f64>) {}

    fn on_settle(&mut self) {}
}

impl<W: Write> OutcomeSink for NdjsonSink<W> {
    fn outcome(&self) -> &SessionOutcome {
        &self.outcome
    }
}
