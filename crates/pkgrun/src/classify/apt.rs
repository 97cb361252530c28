//! Package-count estimation for apt output in several locales.
//!
//! apt prints a summary (`2 upgraded, 3 newly installed, ...`), then one
//! fetch line per archive (`Get:1 http://...`), then dpkg's unpack and
//! configure lines. The fetch phase fills the first half of the bar, unpack
//! the third quarter, configure the last quarter.

use super::LineClass;
use crate::config::Messages;
use crate::text::cached_regex;
use regex::Regex;
use std::sync::OnceLock;

const FETCH_KEYWORDS: [&str; 4] = ["Get:", "Des:", "Obt:", "Holen:"];
const UNPACK_KEYWORDS: [&str; 4] = ["Unpacking", "Desempaquetando", "Dépaquetage", "Entpacken"];
const CONFIGURE_KEYWORDS: [&str; 4] = ["Setting up", "Configurando", "Paramétrage", "Richte"];
/// Words some locales put between the keyword and the package name.
const CONNECTORS: [&str; 2] = ["de", "von"];

const SUMMARY_PATTERN: &str = r"(\d+)\s+(?:upgraded|actualizados?),\s+(\d+)\s+(?:newly installed|nuevos?\s+se\s+instalar[áa]n?)";

const FETCH_CAP: f64 = 0.5;
const UNPACK_BASE: f64 = 0.5;
const CONFIGURE_BASE: f64 = 0.75;
const PHASE_SPAN: f64 = 0.25;

#[derive(Debug, Default)]
pub(crate) struct AptProgress {
    current_package_index: usize,
    estimated_total_packages: usize,
    summary_total: Option<usize>,
}

impl AptProgress {
    pub(crate) fn current_package_index(&self) -> usize {
        self.current_package_index
    }

    pub(crate) fn estimated_total_packages(&self) -> usize {
        self.estimated_total_packages
    }

    pub(crate) fn observe(&mut self, line: &str, messages: &Messages) -> Option<LineClass> {
        if let Some(total) = parse_summary(line) {
            self.summary_total = Some(total);
            return None;
        }

        let fetches = count_fetch_keywords(line);
        if fetches > 0 {
            self.current_package_index += 1;
            if self.estimated_total_packages == 0 {
                self.estimated_total_packages = self
                    .summary_total
                    .filter(|total| *total > 0)
                    .unwrap_or(fetches);
            }
            let fraction = self.raw_ratio().min(FETCH_CAP);
            return Some(LineClass::with_fraction(fraction));
        }

        if let Some(rest) = after_keyword(line, &UNPACK_KEYWORDS) {
            let fraction = UNPACK_BASE + self.ratio() * PHASE_SPAN;
            let message = package_name(rest).map(|pkg| messages.unpacking(pkg));
            return Some(LineClass::new(message, fraction));
        }

        if let Some(rest) = after_keyword(line, &CONFIGURE_KEYWORDS) {
            let fraction = CONFIGURE_BASE + self.ratio() * PHASE_SPAN;
            let message = package_name(rest).map(|pkg| messages.configuring(pkg));
            return Some(LineClass::new(message, fraction));
        }

        None
    }

    #[allow(clippy::cast_precision_loss)] // package counts are tiny
    fn raw_ratio(&self) -> f64 {
        if self.estimated_total_packages == 0 {
            return 0.0;
        }
        self.current_package_index as f64 / self.estimated_total_packages as f64
    }

    fn ratio(&self) -> f64 {
        self.raw_ratio().min(1.0)
    }
}

fn summary_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&PATTERN, SUMMARY_PATTERN)
}

/// Upgraded plus newly-installed count from an apt summary line.
fn parse_summary(line: &str) -> Option<usize> {
    let caps = summary_regex()?.captures(line)?;
    let upgraded: usize = caps.get(1)?.as_str().parse().ok()?;
    let installed: usize = caps.get(2)?.as_str().parse().ok()?;
    Some(upgraded.saturating_add(installed))
}

fn count_fetch_keywords(line: &str) -> usize {
    FETCH_KEYWORDS
        .iter()
        .map(|keyword| line.matches(keyword).count())
        .sum()
}

fn after_keyword<'a>(line: &'a str, keywords: &[&str]) -> Option<&'a str> {
    keywords.iter().find_map(|keyword| {
        let start = line.find(keyword)?;
        line.get(start + keyword.len()..)
    })
}

fn package_name(rest: &str) -> Option<&str> {
    rest.split_whitespace()
        .find(|token| !CONNECTORS.contains(token))
        .map(|token| token.trim_matches(|c: char| matches!(c, '"' | '\'' | '…' | ',')))
        .filter(|token| !token.is_empty() && !token.starts_with('('))
}
