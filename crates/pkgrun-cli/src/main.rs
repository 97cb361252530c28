//! pkgrun CLI: run a package-management command with live progress.
//!
//! `pkgrun run -- <command>` drives the same engine a welcome app embeds,
//! rendering its notifications as a progress bar, an NDJSON stream, or an
//! interactive terminal UI.

// CLI-specific lint allowances (CLI binary, not library)
#![allow(missing_docs)]
#![allow(clippy::print_stdout)] // CLI must print to stdout
#![allow(clippy::print_stderr)] // CLI must print to stderr
#![allow(clippy::exit)] // CLI uses exit codes

use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use miette::{miette, IntoDiagnostic, Result};
use pkgrun::classify::{classify_transcript, find_regressions, ClassifiedLine, Regression};
use pkgrun::config::{load_config_file, Locale, RunnerConfig, Transport};
use pkgrun::model::{CommandFamilies, CommandFamily, ExitReport, RunnerEvent};
use pkgrun::{CommandRunner, ExecutionRequest, NotificationSink, UiContext};
use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod ndjson;
mod progress;
mod tui_mode;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "PKGRUN_LOG";
const PUMP_INTERVAL: Duration = Duration::from_millis(100);

/// Color output mode
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and `NO_COLOR` env
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FamilyArg {
    Wget,
    Unzip,
    Dpkg,
    Apt,
    Flatpak,
}

impl From<FamilyArg> for CommandFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Wget => Self::Wget,
            FamilyArg::Unzip => Self::Unzip,
            FamilyArg::Dpkg => Self::Dpkg,
            FamilyArg::Apt => Self::Apt,
            FamilyArg::Flatpak => Self::Flatpak,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TransportArg {
    Pty,
    Pipe,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LocaleArg {
    En,
    Es,
}

#[derive(Debug, Parser)]
#[command(
    name = "pkgrun",
    version,
    about = "Run package-management commands with live progress"
)]
struct Cli {
    /// Control color output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    color: ColorMode,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a shell command and report its progress
    Run {
        #[arg(long, help = "Emit one JSON event per line on stdout")]
        json: bool,
        #[arg(long, help = "Show an interactive progress view")]
        tui: bool,
        #[arg(long, help = "Runner config file (YAML or JSON)")]
        config: Option<PathBuf>,
        #[arg(
            long = "family",
            value_enum,
            help = "Tag the command's tool family instead of inferring it (repeatable)"
        )]
        families: Vec<FamilyArg>,
        #[arg(long, value_enum, help = "Override the output transport")]
        transport: Option<TransportArg>,
        #[arg(long, help = "Override the post-completion settle delay")]
        settle_ms: Option<u64>,
        #[arg(long, value_enum, help = "Override the status message language")]
        locale: Option<LocaleArg>,
        #[arg(long, help = "Override the shell used to run the command")]
        shell: Option<String>,
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
    /// Classify a recorded transcript offline
    Classify {
        #[arg(long)]
        json: bool,
        #[arg(
            long = "family",
            value_enum,
            help = "Families whose rules apply (default: all)"
        )]
        families: Vec<FamilyArg>,
        #[arg(help = "Transcript file (default: stdin)")]
        file: Option<PathBuf>,
    },
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        #[arg(value_enum, help = "Shell to generate completions for")]
        shell: Shell,
    },
}

/// Configure color output based on CLI flag and environment
fn configure_colors(mode: ColorMode) -> bool {
    let use_color = match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable
            if std::env::var("NO_COLOR").is_ok() {
                false
            } else {
                // Check if stderr supports color (where we output diagnostics)
                supports_color::on(supports_color::Stream::Stderr).is_some()
            }
        }
    };

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .color(use_color)
                .unicode(use_color)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set

    use_color
}

/// Install the stderr log subscriber. `PKGRUN_LOG` wins over `-v`.
fn init_logging(verbose: u8, use_color: bool) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(use_color)
        .try_init()
        .ok();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let use_color = configure_colors(cli.color);
    init_logging(cli.verbose, use_color);
    match cli.command {
        Commands::Run {
            json,
            tui,
            config,
            families,
            transport,
            settle_ms,
            locale,
            shell,
            command,
        } => {
            let overrides = ConfigOverrides {
                transport,
                settle_ms,
                locale,
                shell,
            };
            cmd_run(
                json, tui, config, &families, overrides, &command, use_color,
            )
        }
        Commands::Classify {
            json,
            families,
            file,
        } => cmd_classify(json, &families, file),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

// =============================================================================
// Session outcome
// =============================================================================

/// Terminal state of the one session a CLI invocation runs.
#[derive(Debug, Default)]
pub(crate) struct SessionOutcome {
    exit: Option<ExitReport>,
    failure: Option<String>,
    completed: bool,
}

impl SessionOutcome {
    pub(crate) fn record(&mut self, event: &RunnerEvent) {
        match event {
            RunnerEvent::Exited { exit, .. } => self.exit = Some(exit.clone()),
            RunnerEvent::Failed { message, .. } => self.failure = Some(message.clone()),
            RunnerEvent::Completed { .. } => self.completed = true,
            _ => {}
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.completed || self.failure.is_some()
    }

    pub(crate) fn exit(&self) -> Option<&ExitReport> {
        self.exit.as_ref()
    }

    pub(crate) fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Process exit code: the child's, or 1 if it never started.
    pub(crate) fn exit_code(&self) -> i32 {
        if self.failure.is_some() {
            return 1;
        }
        self.exit
            .as_ref()
            .map_or(0, |exit| i32::try_from(exit.exit_code).unwrap_or(1))
    }
}

/// A sink that knows when its session is over.
pub(crate) trait OutcomeSink: NotificationSink {
    fn outcome(&self) -> &SessionOutcome;
}

/// Pump the UI context on this thread until the session finishes.
fn pump_until_finished<S: OutcomeSink>(ui: &UiContext, sink: &mut S) {
    while !sink.outcome().is_finished() {
        ui.pump_timeout(sink, PUMP_INTERVAL);
    }
}

// =============================================================================
// Command Handlers
// =============================================================================

/// Command-line overrides layered over the config file.
struct ConfigOverrides {
    transport: Option<TransportArg>,
    settle_ms: Option<u64>,
    locale: Option<LocaleArg>,
    shell: Option<String>,
}

fn build_config(path: Option<PathBuf>, overrides: ConfigOverrides) -> Result<RunnerConfig> {
    let mut config = match path {
        Some(path) => load_config_file(&path)?,
        None => RunnerConfig::default(),
    };
    if let Some(transport) = overrides.transport {
        config.transport = match transport {
            TransportArg::Pty => Transport::Pty,
            TransportArg::Pipe => Transport::Pipe,
        };
    }
    if let Some(ms) = overrides.settle_ms {
        config.settle_delay_ms = ms;
    }
    if let Some(locale) = overrides.locale {
        config.locale = match locale {
            LocaleArg::En => Locale::En,
            LocaleArg::Es => Locale::Es,
        };
    }
    if let Some(shell) = overrides.shell {
        config.shell = shell;
    }
    config.validate()?;
    Ok(config)
}

fn to_families(args: &[FamilyArg]) -> CommandFamilies {
    args.iter().copied().map(CommandFamily::from).collect()
}

/// Handle the run command.
#[allow(clippy::fn_params_excessive_bools)]
fn cmd_run(
    json: bool,
    tui: bool,
    config_path: Option<PathBuf>,
    families: &[FamilyArg],
    overrides: ConfigOverrides,
    command: &[String],
    use_color: bool,
) -> Result<()> {
    if json && tui {
        return Err(miette!("--tui cannot be combined with --json"));
    }
    let config = build_config(config_path, overrides)?;
    let command = command.join(" ");

    let mut request = ExecutionRequest::new(command.clone())
        .on_complete(|| tracing::debug!("completion callback ran on the ui thread"));
    if !families.is_empty() {
        request = request.with_families(to_families(families));
    }

    let ui = UiContext::new();
    let runner = CommandRunner::new(config, ui.handle());
    if runner.submit_request(request).is_none() {
        return Err(miette!("a command is already running"));
    }

    let code = if tui {
        tui_mode::run_tui(&ui, &command)?
    } else if json {
        let mut sink = ndjson::NdjsonSink::new(io::stdout());
        pump_until_finished(&ui, &mut sink);
        sink.outcome().exit_code()
    } else {
        let mut sink = progress::BarProgress::new(use_color);
        pump_until_finished(&ui, &mut sink);
        sink.outcome().exit_code()
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Handle the classify command.
fn cmd_classify(json: bool, families: &[FamilyArg], file: Option<PathBuf>) -> Result<()> {
    let lines: Vec<String> = match file {
        Some(path) => fs::read_to_string(&path)
            .into_diagnostic()?
            .lines()
            .map(str::to_string)
            .collect(),
        None => io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<_>>()
            .into_diagnostic()?,
    };
    let families = if families.is_empty() {
        CommandFamily::ALL.into_iter().collect()
    } else {
        to_families(families)
    };

    let config = RunnerConfig::default();
    let classified = classify_transcript(families, config.messages(), &lines);
    let regressions = find_regressions(classified.iter().map(|line| line.fraction));

    if json {
        let payload = serde_json::json!({
            "families": families,
            "lines": classified,
            "regressions": regressions,
        });
        println!("{}", serde_json::to_string(&payload).into_diagnostic()?);
    } else {
        print_classification(&classified, &regressions);
    }
    Ok(())
}

fn print_classification(classified: &[ClassifiedLine], regressions: &[Regression]) {
    for line in classified {
        let fraction = line
            .fraction
            .map_or_else(|| "   -".to_string(), |f| format!("{f:.2}"));
        let text = line.message.as_deref().unwrap_or(&line.line);
        println!("{:>5}  {fraction}  {text}", line.line_number);
    }
    if regressions.is_empty() {
        println!("no progress regressions");
        return;
    }
    println!("{} progress regression(s):", regressions.len());
    for regression in regressions {
        let line_number = classified
            .get(regression.index)
            .map_or(0, |line| line.line_number);
        println!(
            "  line {line_number}: {:.2} -> {:.2}",
            regression.previous, regression.current
        );
    }
}

/// Handle the completions command.
fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
