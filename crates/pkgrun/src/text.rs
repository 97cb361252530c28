//! Turning a raw output byte stream into classifiable lines.
//!
//! Package tools redraw progress in place with `\r` and decorate output with
//! colour and cursor escapes, especially when attached to a pseudo-terminal.
//! [`LineSplitter`] treats both `\r` and `\n` as terminators so every redraw
//! becomes its own line, and [`clean_line`] removes escape sequences and
//! stray control characters before keyword matching.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// CSI sequences, OSC sequences (BEL or ST terminated), and two-byte escapes.
const ANSI_PATTERN: &str =
    r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]";

/// Incremental splitter for a byte stream arriving in arbitrary chunks.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the lines it completes.
    ///
    /// `\r\n` yields an empty line between the two terminators; callers skip
    /// empty lines anyway.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                self.pending.clear();
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Flush the unterminated tail at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}

/// Compile `pattern` once into `cell`; `None` if the pattern is invalid.
pub(crate) fn cached_regex(
    cell: &'static OnceLock<Option<Regex>>,
    pattern: &str,
) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn ansi_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&PATTERN, ANSI_PATTERN)
}

/// Remove ANSI escape sequences.
#[must_use]
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    if !line.contains('\x1b') {
        return Cow::Borrowed(line);
    }
    match ansi_regex() {
        Some(re) => re.replace_all(line, ""),
        None => Cow::Borrowed(line),
    }
}

/// Strip escapes and control characters, then trim surrounding whitespace.
#[must_use]
pub fn clean_line(raw: &str) -> String {
    strip_ansi(raw)
        .chars()
        .filter(|c| *c == '\t' || !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}
