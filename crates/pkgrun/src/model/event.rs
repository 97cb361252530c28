use crate::model::{CommandFamilies, SessionId};
use serde::{Deserialize, Serialize};

/// A status/progress pair forwarded to the UI-affine context.
///
/// Either half may be absent: a line that matches no progress marker only
/// changes the status text, and the progress bar keeps its last value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub message: Option<String>,
    pub fraction: Option<f64>,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(message: Option<String>, fraction: Option<f64>) -> Self {
        Self {
            message,
            fraction: fraction.map(clamp_fraction),
        }
    }
}

/// Exit status of the invoked command.
///
/// The engine treats every exit as completion; this report exists so
/// callers that care about the exit code can look at it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitReport {
    pub success: bool,
    pub exit_code: u32,
}

/// Everything a session reports, in emission order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunnerEvent {
    /// The session was accepted and its worker is starting.
    Started {
        session_id: SessionId,
        command: String,
        families: CommandFamilies,
    },
    /// One raw output line, after ANSI stripping and trimming.
    Output { session_id: SessionId, line: String },
    /// A status and/or progress change.
    Progress {
        session_id: SessionId,
        message: Option<String>,
        fraction: Option<f64>,
    },
    /// The process exited (any exit code).
    Exited {
        session_id: SessionId,
        exit: ExitReport,
    },
    /// The process could not be started; no settle or completion follows.
    Failed {
        session_id: SessionId,
        message: String,
    },
    /// The settle delay elapsed; the progress display should be cleared.
    Settled { session_id: SessionId },
    /// The session finished on the normal-exit path.
    Completed { session_id: SessionId },
}

impl RunnerEvent {
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::Started { session_id, .. }
            | Self::Output { session_id, .. }
            | Self::Progress { session_id, .. }
            | Self::Exited { session_id, .. }
            | Self::Failed { session_id, .. }
            | Self::Settled { session_id }
            | Self::Completed { session_id } => *session_id,
        }
    }

    pub(crate) fn progress(session_id: SessionId, update: ProgressUpdate) -> Self {
        Self::Progress {
            session_id,
            message: update.message,
            fraction: update.fraction,
        }
    }
}

/// Clamp a heuristic fraction into `[0.0, 1.0]`, mapping NaN to 0.
#[must_use]
pub fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
