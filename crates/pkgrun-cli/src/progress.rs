//! Human-readable output using indicatif.

use crate::{OutcomeSink, SessionOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use pkgrun::model::{ExitReport, RunnerEvent, SessionId};
use pkgrun::NotificationSink;
use std::io::Write;
use std::time::Duration;

/// Bar resolution; fractions are mapped onto `0..=BAR_LENGTH`.
const BAR_LENGTH: u64 = 1000;

/// Progress bar on stderr whose message is the current status line.
///
/// Raw output lines are printed above the bar. When stderr is not a
/// terminal the bar is hidden and lines go straight to stderr.
pub struct BarProgress {
    bar: ProgressBar,
    use_color: bool,
    outcome: SessionOutcome,
}

impl BarProgress {
    pub fn new(use_color: bool) -> Self {
        let bar = ProgressBar::new(BAR_LENGTH);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{elapsed_precise}] [{bar:30.cyan/blue}] {percent:>3}% {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            bar,
            use_color,
            outcome: SessionOutcome::default(),
        }
    }

    fn println(&self, line: &str) {
        if self.bar.is_hidden() {
            let _ = writeln!(std::io::stderr(), "{line}");
        } else {
            self.bar.println(line);
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)] // fraction is clamped to [0, 1]
fn position(fraction: f64) -> u64 {
    (fraction * BAR_LENGTH as f64).round() as u64
}

impl NotificationSink for BarProgress {
    fn on_event(&mut self, event: &RunnerEvent) {
        self.outcome.record(event);
    }

    fn on_started(&mut self, session_id: SessionId, command: &str) {
        tracing::debug!(%session_id, "session started");
        self.println(&format!("$ {command}"));
    }

    fn on_output(&mut self, line: &str) {
        self.println(line);
    }

    fn on_progress(&mut self, message: Option<&str>, fraction: Option<f64>) {
        if let Some(message) = message {
            self.bar.set_message(message.to_string());
        }
        if let Some(fraction) = fraction {
            self.bar.set_position(position(fraction));
        }
    }

    fn on_exit(&mut self, exit: &ExitReport) {
        if !exit.success {
            let text = format!("command exited with status {}", exit.exit_code);
            self.println(&self.paint("33", &text));
        }
    }

    fn on_settle(&mut self) {
        self.bar.finish_and_clear();
    }

    fn on_complete(&mut self) {
        let success = self.outcome.exit().map_or(true, |exit| exit.success);
        let (icon, code) = if success { ("✓", "32") } else { ("✗", "31") };
        let _ = writeln!(
            std::io::stderr(),
            "{} done (exit {})",
            self.paint(code, icon),
            self.outcome.exit_code()
        );
    }

    fn on_failed(&mut self, message: &str) {
        self.bar.finish_and_clear();
        let _ = writeln!(std::io::stderr(), "{}", self.paint("31", message));
    }
}

impl OutcomeSink for BarProgress {
    fn outcome(&self) -> &SessionOutcome {
        &self.outcome
    }
}
