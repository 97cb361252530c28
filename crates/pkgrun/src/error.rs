//! Error type shared by the engine, the spawner and the config loader.
//!
//! None of these errors ever reach the caller of
//! [`CommandRunner::submit`](crate::runner::CommandRunner::submit): spawn
//! errors are rendered into an `Error: ...` status line on the UI-affine
//! context. They surface directly only from configuration loading and from
//! the lower-level [`session`](crate::session) API.

use miette::Diagnostic;
use std::path::PathBuf;

pub type RunnerResult<T> = Result<T, RunnerError>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum RunnerError {
    #[error("command is empty")]
    #[diagnostic(code(pkgrun::spawn::empty_command))]
    EmptyCommand,

    #[error("failed to open pty: {details}")]
    #[diagnostic(
        code(pkgrun::spawn::pty),
        help("set `transport: pipe` when no pseudo-terminal is available")
    )]
    Pty { details: String },

    #[error("failed to spawn `{shell}`: {details}")]
    #[diagnostic(
        code(pkgrun::spawn::process),
        help("check that the configured shell exists and is executable")
    )]
    Spawn { shell: String, details: String },

    #[error("failed to read config file {}: {source}", path.display())]
    #[diagnostic(code(pkgrun::config::io))]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {details}", path.display())]
    #[diagnostic(code(pkgrun::config::parse))]
    ConfigParse { path: PathBuf, details: String },

    #[error("invalid config: {0}")]
    #[diagnostic(code(pkgrun::config::invalid))]
    InvalidConfig(String),

    #[error("{context}: {source}")]
    #[diagnostic(code(pkgrun::io))]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn spawn(shell: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Spawn {
            shell: shell.into(),
            details: err.to_string(),
        }
    }

    pub(crate) fn pty(err: impl std::fmt::Display) -> Self {
        Self::Pty {
            details: err.to_string(),
        }
    }
}
