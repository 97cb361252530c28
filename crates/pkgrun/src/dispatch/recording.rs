use super::NotificationSink;
use crate::classify::{find_regressions, Regression};
use crate::model::{ExitReport, RunnerEvent};
use std::time::{Duration, Instant};

/// Sink that records everything it is told, for tests and diagnostics.
///
/// Fraction regressions are recorded, not rejected: the progress heuristic
/// is allowed to move backwards.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<(Instant, RunnerEvent)>,
    settle_count: usize,
    complete_count: usize,
    failures: Vec<String>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> impl Iterator<Item = &RunnerEvent> {
        self.events.iter().map(|(_, event)| event)
    }

    /// Raw output lines in order.
    #[must_use]
    pub fn lines(&self) -> Vec<&str> {
        self.events()
            .filter_map(|event| match event {
                RunnerEvent::Output { line, .. } => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every progress fraction reported, in order.
    #[must_use]
    pub fn fractions(&self) -> Vec<f64> {
        self.progress().filter_map(|(_, fraction)| fraction).collect()
    }

    /// Every status message reported, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.progress().filter_map(|(message, _)| message).collect()
    }

    #[must_use]
    pub fn exits(&self) -> Vec<&ExitReport> {
        self.events()
            .filter_map(|event| match event {
                RunnerEvent::Exited { exit, .. } => Some(exit),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn settle_count(&self) -> usize {
        self.settle_count
    }

    #[must_use]
    pub fn complete_count(&self) -> usize {
        self.complete_count
    }

    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Sessions that reached a terminal notification (completion or failure).
    #[must_use]
    pub fn finished_sessions(&self) -> usize {
        self.complete_count + self.failures.len()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_sessions() > 0
    }

    #[must_use]
    pub fn regressions(&self) -> Vec<Regression> {
        find_regressions(self.fractions().into_iter().map(Some))
    }

    /// Time between the last full-progress update and the settle signal.
    #[must_use]
    pub fn settle_gap(&self) -> Option<Duration> {
        let settled_at = self
            .events
            .iter()
            .rev()
            .find(|(_, event)| matches!(event, RunnerEvent::Settled { .. }))
            .map(|(at, _)| *at)?;
        let full_at = self
            .events
            .iter()
            .rev()
            .filter(|(at, _)| *at <= settled_at)
            .find(|(_, event)| {
                matches!(event, RunnerEvent::Progress { fraction: Some(f), .. } if *f >= 1.0)
            })
            .map(|(at, _)| *at)?;
        Some(settled_at.duration_since(full_at))
    }

    fn progress(&self) -> impl Iterator<Item = (Option<&str>, Option<f64>)> {
        self.events().filter_map(|event| match event {
            RunnerEvent::Progress {
                message, fraction, ..
            } => Some((message.as_deref(), *fraction)),
            _ => None,
        })
    }
}

impl NotificationSink for RecordingSink {
    fn on_event(&mut self, event: &RunnerEvent) {
        self.events.push((Instant::now(), event.clone()));
    }

    fn on_progress(&mut self, _message: Option<&str>, _fraction: Option<f64>) {}

    fn on_settle(&mut self) {
        self.settle_count += 1;
    }

    fn on_complete(&mut self) {
        self.complete_count += 1;
    }

    fn on_failed(&mut self, message: &str) {
        self.failures.push(message.to_string());
    }
}
