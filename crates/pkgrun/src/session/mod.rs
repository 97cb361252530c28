//! Spawning one shell command and reading its combined output.
//!
//! [`ProcessSession`] runs `<shell> -c <command>` and exposes a single
//! ordered byte stream carrying both stdout and stderr:
//!
//! - [`Transport::Pipe`] (the default) uses an ordinary pipe and has the
//!   shell redirect stderr onto stdout before running the command.
//! - [`Transport::Pty`] attaches the command to a pseudo-terminal, so the
//!   tools behave as they would in a terminal (in-place progress redraws
//!   included) and both streams are merged by the kernel.
//!
//! Neither transport feeds input: stdin is at end-of-file, so a command
//! that prompts gets EOF instead of waiting forever.
//!
//! Reads block; the session is meant to be driven from a worker thread.
//! No privilege escalation is added here: commands that need root embed
//! `pkexec` themselves.
//!
//! # Example
//!
//! ```no_run
//! use pkgrun::config::{RunnerConfigBuilder, Transport};
//! use pkgrun::session::ProcessSession;
//!
//! # fn example() -> Result<(), pkgrun::RunnerError> {
//! let config = RunnerConfigBuilder::new().transport(Transport::Pipe).build();
//! let mut session = ProcessSession::spawn("echo hello; echo oops >&2", &config)?;
//! let mut lines = Vec::new();
//! session.read_lines(|line| lines.push(line))?;
//! let exit = session.wait()?;
//! assert!(exit.success);
//! # Ok(())
//! # }
//! ```

use crate::config::{RunnerConfig, Transport};
use crate::error::{RunnerError, RunnerResult};
use crate::model::ExitReport;
use crate::text::LineSplitter;
use nix::errno::Errno;
use portable_pty::{native_pty_system, CommandBuilder, MasterPty, PtySize};
use std::io::{ErrorKind, Read, Write};
use std::process::{Command, Stdio};

const READ_CHUNK: usize = 4096;
/// `VEOF` in canonical mode: a read on the slave returns 0.
const EOF_CHAR: u8 = 0x04;

enum ChildHandle {
    Pty(Box<dyn portable_pty::Child + Send + Sync>),
    Pipe(std::process::Child),
}

/// A running command and its merged output stream.
pub struct ProcessSession {
    output: Box<dyn Read + Send>,
    child: ChildHandle,
    // Held so the master side stays open until the child has been reaped.
    _master: Option<Box<dyn MasterPty + Send>>,
}

impl ProcessSession {
    /// Spawn `command` through the configured shell and transport.
    ///
    /// # Errors
    /// - `EmptyCommand` if `command` is blank
    /// - `Pty` if no pseudo-terminal could be opened
    /// - `Spawn` if the shell could not be started
    pub fn spawn(command: &str, config: &RunnerConfig) -> RunnerResult<Self> {
        if command.trim().is_empty() {
            return Err(RunnerError::EmptyCommand);
        }
        match config.transport {
            Transport::Pty => spawn_pty(command, config),
            Transport::Pipe => spawn_pipe(command, config),
        }
    }

    /// OS process id of the shell, when known.
    #[must_use]
    pub fn process_id(&self) -> Option<u32> {
        match &self.child {
            ChildHandle::Pty(child) => child.process_id(),
            ChildHandle::Pipe(child) => Some(child.id()),
        }
    }

    /// Read the output stream to its end, handing each raw line to `on_line`.
    ///
    /// Lines are split on `\n` and `\r` and are not cleaned or filtered.
    pub fn read_lines<F>(&mut self, mut on_line: F) -> RunnerResult<()>
    where
        F: FnMut(String),
    {
        let mut splitter = LineSplitter::new();
        let mut buf = [0_u8; READ_CHUNK];
        loop {
            match self.output.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    for line in splitter.push(buf.get(..n).unwrap_or(&[])) {
                        on_line(line);
                    }
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // The pty master reports EIO once the child side is closed.
                Err(err) if err.raw_os_error().map(Errno::from_raw) == Some(Errno::EIO) => break,
                Err(err) => return Err(RunnerError::io("failed to read command output", err)),
            }
        }
        if let Some(line) = splitter.finish() {
            on_line(line);
        }
        Ok(())
    }

    /// Block until the process exits.
    pub fn wait(&mut self) -> RunnerResult<ExitReport> {
        match &mut self.child {
            ChildHandle::Pty(child) => {
                let status = child
                    .wait()
                    .map_err(|err| RunnerError::io("failed to wait for command", err))?;
                Ok(ExitReport {
                    success: status.success(),
                    exit_code: status.exit_code(),
                })
            }
            ChildHandle::Pipe(child) => {
                let status = child
                    .wait()
                    .map_err(|err| RunnerError::io("failed to wait for command", err))?;
                let exit_code = status
                    .code()
                    .and_then(|code| u32::try_from(code).ok())
                    .unwrap_or(1);
                Ok(ExitReport {
                    success: status.success(),
                    exit_code,
                })
            }
        }
    }
}

fn spawn_pty(command: &str, config: &RunnerConfig) -> RunnerResult<ProcessSession> {
    let system = native_pty_system();
    let pair = system
        .openpty(PtySize {
            rows: config.pty_size.rows,
            cols: config.pty_size.cols,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(RunnerError::pty)?;

    let mut cmd = CommandBuilder::new(&config.shell);
    cmd.arg("-c");
    cmd.arg(command);
    if let Some(cwd) = &config.cwd {
        cmd.cwd(cwd);
    }
    for (key, value) in &config.env {
        cmd.env(key, value);
    }

    let child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|err| RunnerError::spawn(&config.shell, err))?;
    // The reader only sees end-of-stream once every slave handle is closed.
    drop(pair.slave);

    let output = pair.master.try_clone_reader().map_err(RunnerError::pty)?;

    // Close stdin: prompts see end-of-file. Dropping the writer sends a
    // newline and another EOF as well.
    let mut input = pair.master.take_writer().map_err(RunnerError::pty)?;
    if let Err(err) = input.write_all(&[EOF_CHAR]).and_then(|()| input.flush()) {
        tracing::debug!(error = %err, "failed to close pty input");
    }
    drop(input);

    Ok(ProcessSession {
        output,
        child: ChildHandle::Pty(child),
        _master: Some(pair.master),
    })
}

fn spawn_pipe(command: &str, config: &RunnerConfig) -> RunnerResult<ProcessSession> {
    let mut cmd = Command::new(&config.shell);
    cmd.arg("-c")
        .arg(format!("exec 2>&1\n{command}"))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .envs(&config.env);
    if let Some(cwd) = &config.cwd {
        cmd.current_dir(cwd);
    }

    let mut child = cmd
        .spawn()
        .map_err(|err| RunnerError::spawn(&config.shell, err))?;
    let Some(stdout) = child.stdout.take() else {
        let _ = child.kill();
        return Err(RunnerError::spawn(&config.shell, "stdout was not captured"));
    };

    Ok(ProcessSession {
        output: Box::new(stdout),
        child: ChildHandle::Pipe(child),
        _master: None,
    })
}
