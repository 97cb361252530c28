// Test module - relaxed lint rules
#![allow(clippy::indexing_slicing)]
#![allow(clippy::panic)]
#![allow(clippy::manual_assert)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::float_cmp)]
#![allow(missing_docs)]

//! End-to-end session tests: real shell commands through the engine.

use pkgrun::config::{RunnerConfig, RunnerConfigBuilder, Transport};
use pkgrun::model::{CommandFamilies, CommandFamily, ExitReport, RunnerEvent};
use pkgrun::{CommandRunner, ExecutionRequest, RecordingSink, UiContext};
use pkgrun_fixtures::{shell_printf_command, shell_printf_command_tagged, transcripts};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const SETTLE: Duration = Duration::from_millis(50);

fn pipe_config() -> RunnerConfig {
    RunnerConfigBuilder::new()
        .transport(Transport::Pipe)
        .settle_delay(SETTLE)
        .build()
}

/// Pump until `sessions` sessions have finished (completed or failed).
fn pump_until_finished(ui: &UiContext, sink: &mut RecordingSink, sessions: usize) {
    let deadline = Instant::now() + Duration::from_secs(15);
    while sink.finished_sessions() < sessions {
        assert!(Instant::now() < deadline, "session did not finish in time");
        ui.pump_timeout(sink, Duration::from_millis(50));
    }
}

fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    (count, move || {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

fn kinds(sink: &RecordingSink) -> Vec<&'static str> {
    sink.events()
        .map(|event| match event {
            RunnerEvent::Started { .. } => "started",
            RunnerEvent::Output { .. } => "output",
            RunnerEvent::Progress { .. } => "progress",
            RunnerEvent::Exited { .. } => "exited",
            RunnerEvent::Failed { .. } => "failed",
            RunnerEvent::Settled { .. } => "settled",
            RunnerEvent::Completed { .. } => "completed",
        })
        .collect()
}

#[test]
fn apt_session_reports_lines_progress_and_completion_in_order() {
    let ui = UiContext::new();
    let runner = CommandRunner::new(pipe_config(), ui.handle());
    let (calls, callback) = counter();

    let request = ExecutionRequest::new(shell_printf_command(transcripts::APT_INSTALL_EN))
        .with_families(CommandFamilies::only(CommandFamily::Apt))
        .on_complete(callback);
    assert!(runner.submit_request(request).is_some());

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    let expected_lines: Vec<&str> = transcripts::APT_INSTALL_EN.iter().map(|l| l.trim()).collect();
    assert_eq!(sink.lines(), expected_lines);
    assert_eq!(sink.fractions(), vec![0.5, 0.5, 0.75, 0.75, 1.0, 1.0, 1.0]);

    let messages = sink.messages();
    assert!(messages.contains(&"Unpacking hello..."));
    assert!(messages.contains(&"Configuring cowsay..."));
    assert!(messages.contains(&"Reading package lists..."));
    assert_eq!(messages.last(), Some(&"Installation complete"));

    assert_eq!(
        sink.exits(),
        vec![&ExitReport {
            success: true,
            exit_code: 0
        }]
    );
    assert_eq!(sink.settle_count(), 1);
    assert_eq!(sink.complete_count(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!runner.is_running());

    let kinds = kinds(&sink);
    assert_eq!(kinds.first(), Some(&"started"));
    assert_eq!(
        &kinds[kinds.len() - 4..],
        &["exited", "progress", "settled", "completed"]
    );
}

#[test]
fn each_output_line_is_followed_by_its_progress_update() {
    let ui = UiContext::new();
    let runner = CommandRunner::new(pipe_config(), ui.handle());
    runner.submit(
        shell_printf_command_tagged("dpkg", transcripts::DPKG_INSTALL),
        None,
    );

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    let events: Vec<&RunnerEvent> = sink.events().collect();
    for (idx, event) in events.iter().enumerate() {
        if let RunnerEvent::Output { line, .. } = event {
            match events.get(idx + 1) {
                Some(RunnerEvent::Progress { message, .. }) => {
                    assert_eq!(message.as_deref(), Some(line.as_str()));
                }
                other => panic!("expected progress after {line:?}, got {other:?}"),
            }
        }
    }
    assert_eq!(sink.fractions(), vec![0.2, 0.5, 0.8, 1.0]);
}

#[test]
fn families_are_inferred_from_the_command_text() {
    let ui = UiContext::new();
    let runner = CommandRunner::new(pipe_config(), ui.handle());
    // The printf arguments do not mention wget, so tag the command text.
    runner.submit(
        shell_printf_command_tagged("wget", transcripts::WGET_DOWNLOAD),
        None,
    );

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    let started = sink
        .events()
        .find_map(|event| match event {
            RunnerEvent::Started { families, .. } => Some(*families),
            _ => None,
        })
        .unwrap();
    assert!(started.wget);
    assert_eq!(sink.fractions(), vec![0.25, 0.5, 0.75, 1.0, 1.0]);
}

#[test]
fn nonzero_exit_still_completes_and_calls_back_once() {
    let ui = UiContext::new();
    let runner = CommandRunner::new(pipe_config(), ui.handle());
    let (calls, callback) = counter();

    runner.submit("echo 'E: Unable to locate package nope'; exit 100", Some(Box::new(callback)));

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    assert_eq!(
        sink.exits(),
        vec![&ExitReport {
            success: false,
            exit_code: 100
        }]
    );
    assert_eq!(sink.messages().last(), Some(&"Installation complete"));
    assert_eq!(sink.fractions().last(), Some(&1.0));
    assert_eq!(sink.settle_count(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn spawn_failure_reports_error_and_never_calls_back() {
    let ui = UiContext::new();
    let config = RunnerConfigBuilder::new()
        .shell("/nonexistent/pkgrun-test-shell")
        .transport(Transport::Pipe)
        .settle_delay(SETTLE)
        .build();
    let runner = CommandRunner::new(config, ui.handle());
    let (calls, callback) = counter();

    runner.submit("apt-get install -y vlc", Some(Box::new(callback)));

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);
    // Nothing else may follow the failure.
    ui.pump_timeout(&mut sink, SETTLE * 4);

    assert_eq!(sink.failures().len(), 1);
    assert!(sink.failures()[0].starts_with("Error: "), "{:?}", sink.failures());
    assert!(sink.failures()[0].contains("/nonexistent/pkgrun-test-shell"));
    assert_eq!(sink.fractions(), vec![0.0]);
    assert!(sink.messages()[0].starts_with("Error: "));
    assert!(sink.exits().is_empty());
    assert_eq!(sink.settle_count(), 0);
    assert_eq!(sink.complete_count(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!runner.is_running());
}

#[test]
fn empty_command_fails_like_a_spawn_error() {
    let ui = UiContext::new();
    let runner = CommandRunner::new(pipe_config(), ui.handle());
    runner.submit("   ", None);

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    assert_eq!(sink.failures(), &["Error: command is empty".to_string()]);
    assert_eq!(sink.complete_count(), 0);
}

#[test]
fn submit_while_running_is_dropped() {
    let ui = UiContext::new();
    let runner = CommandRunner::new(pipe_config(), ui.handle());
    let (first_calls, first) = counter();
    let (second_calls, second) = counter();

    let first_id = runner.submit("sleep 0.3; echo first", Some(Box::new(first)));
    assert!(first_id.is_some());
    assert!(runner.is_running());
    assert!(runner
        .submit("echo second", Some(Box::new(second)))
        .is_none());

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);
    ui.pump_timeout(&mut sink, SETTLE * 4);

    assert_eq!(sink.lines(), vec!["first"]);
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    assert!(sink.events().all(|event| Some(event.session_id()) == first_id));
}

#[test]
fn runner_accepts_a_new_command_after_completion() {
    let ui = UiContext::new();
    let runner = CommandRunner::new(pipe_config(), ui.handle());
    let (calls, first) = counter();
    let second_calls = Arc::clone(&calls);

    runner.submit("echo one", Some(Box::new(first)));
    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);
    assert!(!runner.is_running());

    let second_id = runner.submit(
        "echo two",
        Some(Box::new(move || {
            second_calls.fetch_add(1, Ordering::SeqCst);
        })),
    );
    assert!(second_id.is_some());
    pump_until_finished(&ui, &mut sink, 2);

    assert_eq!(sink.lines(), vec!["one", "two"]);
    assert_eq!(sink.settle_count(), 2);
    assert_eq!(sink.complete_count(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn repeated_sessions_classify_identically() {
    let ui = UiContext::new();
    let runner = CommandRunner::new(pipe_config(), ui.handle());
    let mut sink = RecordingSink::new();

    for finished in 1..=2 {
        let request = ExecutionRequest::new(shell_printf_command(transcripts::APT_INSTALL_EN))
            .with_families(CommandFamilies::only(CommandFamily::Apt));
        assert!(runner.submit_request(request).is_some());
        pump_until_finished(&ui, &mut sink, finished);
    }

    let expected = [0.5, 0.5, 0.75, 0.75, 1.0, 1.0, 1.0];
    let fractions = sink.fractions();
    assert_eq!(fractions.len(), expected.len() * 2);
    assert_eq!(&fractions[..expected.len()], &expected);
    assert_eq!(&fractions[expected.len()..], &expected);
}

#[test]
fn prompting_command_finishes_under_default_config() {
    let ui = UiContext::new();
    let config = RunnerConfigBuilder::new().settle_delay(SETTLE).build();
    assert_eq!(config.transport, Transport::Pipe);
    let runner = CommandRunner::new(config, ui.handle());
    let (calls, callback) = counter();

    runner.submit(
        "printf 'Do you want to continue? [Y/n] '; read answer; echo \"answer=$answer\"",
        Some(Box::new(callback)),
    );
    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    assert_eq!(sink.lines(), vec!["Do you want to continue? [Y/n] answer="]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!runner.is_running());
}

#[test]
fn prompting_command_finishes_over_pty() {
    let ui = UiContext::new();
    let config = RunnerConfigBuilder::new()
        .transport(Transport::Pty)
        .settle_delay(SETTLE)
        .build();
    let runner = CommandRunner::new(config, ui.handle());
    let (calls, callback) = counter();

    runner.submit(
        "printf 'Do you want to continue? [Y/n] '; read answer; echo \"answer=$answer\"",
        Some(Box::new(callback)),
    );
    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    let lines = sink.lines();
    assert!(lines.last().unwrap().ends_with("answer="), "{lines:?}");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!runner.is_running());
}

#[test]
fn callback_runs_on_the_pumping_thread() {
    let ui = UiContext::new();
    let runner = CommandRunner::new(pipe_config(), ui.handle());
    let seen = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&seen);

    runner.submit(
        "true",
        Some(Box::new(move || {
            *slot.lock().unwrap() = Some(thread::current().id());
        })),
    );

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    assert_eq!(*seen.lock().unwrap(), Some(thread::current().id()));
}

#[test]
fn settle_signal_waits_for_the_settle_delay() {
    let settle = Duration::from_millis(300);
    let ui = UiContext::new();
    let config = RunnerConfigBuilder::new()
        .transport(Transport::Pipe)
        .settle_delay(settle)
        .build();
    let runner = CommandRunner::new(config, ui.handle());
    runner.submit("echo done", None);

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    let gap = sink.settle_gap().unwrap();
    assert!(gap >= Duration::from_millis(200), "settle gap too short: {gap:?}");
}

#[test]
fn stderr_is_merged_into_the_output_stream() {
    let ui = UiContext::new();
    let runner = CommandRunner::new(pipe_config(), ui.handle());
    runner.submit("echo out; echo err >&2", None);

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    assert_eq!(sink.lines(), vec!["out", "err"]);
}

#[test]
fn carriage_return_redraws_become_separate_lines() {
    let ui = UiContext::new();
    let runner = CommandRunner::new(pipe_config(), ui.handle());
    let request = ExecutionRequest::new(r"printf ' 10%%\r 40%%\r\033[1m 90%%\033[0m\n'")
        .with_families(CommandFamilies::only(CommandFamily::Wget));
    runner.submit_request(request);

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    assert_eq!(sink.lines(), vec!["10%", "40%", "90%"]);
    assert_eq!(sink.fractions(), vec![0.1, 0.4, 0.9, 1.0]);
}

#[test]
fn env_and_cwd_are_applied() {
    let dir = tempfile::tempdir().unwrap();
    let cwd = dir.path().canonicalize().unwrap();
    let ui = UiContext::new();
    let config = RunnerConfigBuilder::new()
        .transport(Transport::Pipe)
        .settle_delay(SETTLE)
        .cwd(&cwd)
        .env("PKGRUN_TEST_VALUE", "from-config")
        .build();
    let runner = CommandRunner::new(config, ui.handle());
    runner.submit("echo \"$PKGRUN_TEST_VALUE\"; pwd -P", None);

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    assert_eq!(
        sink.lines(),
        vec!["from-config".to_string(), cwd.display().to_string()]
    );
}

#[test]
fn pty_transport_runs_commands() {
    let ui = UiContext::new();
    let config = RunnerConfigBuilder::new()
        .transport(Transport::Pty)
        .settle_delay(SETTLE)
        .build();
    let runner = CommandRunner::new(config, ui.handle());
    let (calls, callback) = counter();

    let request = ExecutionRequest::new(shell_printf_command(transcripts::DPKG_INSTALL))
        .with_families(CommandFamilies::only(CommandFamily::Dpkg))
        .on_complete(callback);
    runner.submit_request(request);

    let mut sink = RecordingSink::new();
    pump_until_finished(&ui, &mut sink, 1);

    assert!(sink.lines().contains(&"Unpacking distro-theme (1.4) ..."));
    assert_eq!(sink.fractions(), vec![0.2, 0.5, 0.8, 1.0]);
    assert!(sink.exits()[0].success);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn dropped_ui_context_does_not_wedge_the_runner() {
    let ui = UiContext::new();
    let runner = CommandRunner::new(pipe_config(), ui.handle());
    drop(ui);

    runner.submit("echo orphan", None);
    let deadline = Instant::now() + Duration::from_secs(10);
    while runner.is_running() {
        assert!(Instant::now() < deadline, "runner stayed busy");
        thread::sleep(Duration::from_millis(20));
    }
}
