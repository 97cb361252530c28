//! Heuristic mapping from tool output lines to progress.
//!
//! Each session owns one [`OutputClassifier`]. For every line the rules of
//! the session's [`CommandFamilies`] are tried in priority order
//! (wget, unzip, dpkg, apt, flatpak); the first rule that recognises the
//! line decides its fraction and, for apt unpack/configure lines, a
//! localized status message. Lines no rule recognises carry no fraction, so
//! the progress bar holds its last value while the status text changes.
//!
//! The fractions are estimates built from fixed checkpoints and package
//! counts. They usually grow, but nothing guarantees it: see
//! [`find_regressions`].
//!
//! # Example
//!
//! ```
//! use pkgrun::classify::OutputClassifier;
//! use pkgrun::config::Messages;
//! use pkgrun::model::{CommandFamilies, CommandFamily};
//!
//! let mut classifier =
//!     OutputClassifier::new(CommandFamilies::only(CommandFamily::Dpkg), Messages::default());
//! assert_eq!(classifier.classify("Unpacking foo (1.0) ...").fraction, Some(0.5));
//! assert_eq!(classifier.classify("hello").fraction, None);
//! ```

mod apt;
mod checkpoints;

use crate::config::Messages;
use crate::model::{CommandFamilies, CommandFamily, ProgressUpdate};
use crate::text::clean_line;
use apt::AptProgress;
use serde::{Deserialize, Serialize};

/// What a single line says about progress.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineClass {
    /// Family whose rule recognised the line.
    pub family: Option<CommandFamily>,
    /// Status text to show instead of the raw line.
    pub message: Option<String>,
    pub fraction: Option<f64>,
}

impl LineClass {
    fn new(message: Option<String>, fraction: f64) -> Self {
        Self {
            family: None,
            message,
            fraction: Some(fraction),
        }
    }

    fn with_fraction(fraction: f64) -> Self {
        Self::new(None, fraction)
    }
}

/// Per-session line classifier.
#[derive(Debug)]
pub struct OutputClassifier {
    families: CommandFamilies,
    messages: Messages,
    apt: AptProgress,
}

impl OutputClassifier {
    #[must_use]
    pub fn new(families: CommandFamilies, messages: Messages) -> Self {
        Self {
            families,
            messages,
            apt: AptProgress::default(),
        }
    }

    #[must_use]
    pub fn families(&self) -> CommandFamilies {
        self.families
    }

    /// Classify one cleaned, non-empty line.
    pub fn classify(&mut self, line: &str) -> LineClass {
        let families = self.families;
        for family in families.iter() {
            let matched = match family {
                CommandFamily::Wget => checkpoints::wget(line).map(LineClass::with_fraction),
                CommandFamily::Unzip => checkpoints::unzip(line).map(LineClass::with_fraction),
                CommandFamily::Dpkg => checkpoints::dpkg(line).map(LineClass::with_fraction),
                CommandFamily::Apt => self.apt.observe(line, &self.messages),
                CommandFamily::Flatpak => checkpoints::flatpak(line).map(LineClass::with_fraction),
            };
            if let Some(mut class) = matched {
                class.family = Some(family);
                return class;
            }
        }
        LineClass::default()
    }

    /// Classify a line into the update forwarded to the UI: the derived
    /// message when there is one, the raw line otherwise.
    pub fn update_for(&mut self, line: &str) -> ProgressUpdate {
        let class = self.classify(line);
        let message = class.message.unwrap_or_else(|| line.to_string());
        ProgressUpdate::new(Some(message), class.fraction)
    }

    /// Number of apt fetch lines seen so far.
    #[must_use]
    pub fn current_package_index(&self) -> usize {
        self.apt.current_package_index()
    }

    /// apt package total estimated at the first fetch line (0 before it).
    #[must_use]
    pub fn estimated_total_packages(&self) -> usize {
        self.apt.estimated_total_packages()
    }
}

/// One transcript line with its classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLine {
    /// 1-based position in the input, counting skipped lines.
    pub line_number: usize,
    pub line: String,
    pub family: Option<CommandFamily>,
    pub message: Option<String>,
    pub fraction: Option<f64>,
}

/// A point where the heuristic fraction went backwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    /// Index into the sequence passed to [`find_regressions`].
    pub index: usize,
    pub previous: f64,
    pub current: f64,
}

/// Run a whole transcript through a fresh classifier, the way a session
/// would: lines are cleaned and empty lines skipped.
pub fn classify_transcript<I, S>(
    families: CommandFamilies,
    messages: Messages,
    lines: I,
) -> Vec<ClassifiedLine>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut classifier = OutputClassifier::new(families, messages);
    lines
        .into_iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = clean_line(raw.as_ref());
            if line.is_empty() {
                return None;
            }
            let class = classifier.classify(&line);
            Some(ClassifiedLine {
                line_number: idx + 1,
                family: class.family,
                message: class.message,
                fraction: class.fraction,
                line,
            })
        })
        .collect()
}

/// Positions where a fraction is lower than the last fraction before it.
///
/// `None` entries (lines without a fraction) are skipped over.
pub fn find_regressions<I>(fractions: I) -> Vec<Regression>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut last: Option<f64> = None;
    let mut regressions = Vec::new();
    for (index, fraction) in fractions.into_iter().enumerate() {
        let Some(current) = fraction else { continue };
        if let Some(previous) = last {
            if current < previous {
                regressions.push(Regression {
                    index,
                    previous,
                    current,
                });
            }
        }
        last = Some(current);
    }
    regressions
}
