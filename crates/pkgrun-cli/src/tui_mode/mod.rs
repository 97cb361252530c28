//! Interactive TUI mode for running a command.
//!
//! Provides a live terminal UI showing:
//! - The status line and a progress gauge
//! - The command's output log
//! - Exit status and controls

// TUI-specific lint allowances - ratatui layouts have fixed indices
#![allow(clippy::indexing_slicing)]

use crate::SessionOutcome;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use miette::{IntoDiagnostic, Result};
use pkgrun::model::RunnerEvent;
use pkgrun::{NotificationSink, UiContext};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame, Terminal,
};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

/// Output lines kept for the log pane.
const LOG_CAPACITY: usize = 2000;

/// Run the TUI until the session has finished and the user quits.
///
/// Returns the exit code the CLI should use.
pub fn run_tui(ui: &UiContext, command: &str) -> Result<i32> {
    // Set up terminal
    enable_raw_mode().into_diagnostic()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).into_diagnostic()?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).into_diagnostic()?;

    let mut app = App::new(command);
    let result = run_app(&mut terminal, &mut app, ui);

    // Restore terminal
    disable_raw_mode().into_diagnostic()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).into_diagnostic()?;
    terminal.show_cursor().into_diagnostic()?;

    result?;
    if let Some(message) = app.outcome.failure() {
        eprintln!("{message}");
    }
    Ok(app.outcome.exit_code())
}

/// Application state for the TUI; fed by the UI context on this thread.
struct App {
    command: String,
    status: String,
    fraction: f64,
    settled: bool,
    log: VecDeque<String>,
    scroll_offset: u16,
    outcome: SessionOutcome,
}

impl App {
    fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            status: String::new(),
            fraction: 0.0,
            settled: false,
            log: VecDeque::with_capacity(LOG_CAPACITY),
            scroll_offset: 0,
            outcome: SessionOutcome::default(),
        }
    }
}

impl NotificationSink for App {
    fn on_event(&mut self, event: &RunnerEvent) {
        self.outcome.record(event);
    }

    fn on_output(&mut self, line: &str) {
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(line.to_string());
    }

    fn on_progress(&mut self, message: Option<&str>, fraction: Option<f64>) {
        if let Some(message) = message {
            self.status = message.to_string();
        }
        if let Some(fraction) = fraction {
            self.fraction = fraction;
        }
    }

    fn on_settle(&mut self) {
        self.settled = true;
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    ui: &UiContext,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, app)).into_diagnostic()?;

        // Handle notifications from the runner
        ui.pump(app);

        // Handle keyboard input
        if event::poll(Duration::from_millis(50)).into_diagnostic()? {
            if let Event::Key(key) = event::read().into_diagnostic()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        // No cancellation: quitting waits for the session.
                        KeyCode::Char('q') | KeyCode::Esc if app.outcome.is_finished() => {
                            return Ok(());
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            app.scroll_offset = app.scroll_offset.saturating_add(1);
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            app.scroll_offset = app.scroll_offset.saturating_sub(1);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_status(f, chunks[0], app);
    render_gauge(f, chunks[1], app);
    render_log(f, chunks[2], app);
    render_footer(f, chunks[3], app);
}

fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(format!(" {} ", app.command))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let style = if app.outcome.failure().is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let paragraph = Paragraph::new(Span::styled(app.status.as_str(), style)).block(block);
    f.render_widget(paragraph, area);
}

fn render_gauge(f: &mut Frame, area: Rect, app: &App) {
    // The settle signal returns the display to idle.
    let ratio = if app.settled { 0.0 } else { app.fraction };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio.clamp(0.0, 1.0));
    f.render_widget(gauge, area);
}

fn render_log(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Output ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.log.is_empty() {
        let placeholder = Paragraph::new("Waiting for output...")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(placeholder, inner);
        return;
    }

    // Follow the tail; scrolling moves the window up from the bottom.
    let height = usize::from(inner.height);
    let end = app.log.len().saturating_sub(usize::from(app.scroll_offset));
    let start = end.saturating_sub(height);
    let lines: Vec<Line> = app
        .log
        .iter()
        .skip(start)
        .take(end - start)
        .map(|line| Line::from(line.as_str()))
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let status = if let Some(message) = app.outcome.failure() {
        Span::styled(
            format!("Failed: {}", message.chars().take(50).collect::<String>()),
            Style::default().fg(Color::Red),
        )
    } else if app.outcome.is_finished() {
        match app.outcome.exit() {
            Some(exit) if !exit.success => Span::styled(
                format!("Exited with status {}", exit.exit_code),
                Style::default().fg(Color::Red),
            ),
            _ => Span::styled("Done", Style::default().fg(Color::Green)),
        }
    } else {
        Span::styled("Running", Style::default().fg(Color::Yellow))
    };

    let quit_hint = if app.outcome.is_finished() {
        "[q]uit"
    } else {
        "[q]uit after completion"
    };

    let content = Line::from(vec![
        Span::raw(" "),
        status,
        Span::raw(" │ "),
        Span::raw(format!("{} lines", app.log.len())),
        Span::raw(" │ "),
        Span::styled(quit_hint, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled("[↑↓]scroll", Style::default().fg(Color::DarkGray)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(content).block(block);
    f.render_widget(paragraph, area);
}
