//! Stateless rules: percent parsing and fixed checkpoint fractions.

/// Integer immediately preceding the first `%` that has one, as a fraction.
pub(crate) fn embedded_percent(line: &str) -> Option<f64> {
    line.match_indices('%')
        .find_map(|(idx, _)| digits_before(line, idx))
        .map(|percent| f64::from(percent.min(100)) / 100.0)
}

fn digits_before(line: &str, idx: usize) -> Option<u32> {
    let head = line.get(..idx)?;
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(pos, _)| pos)?;
    head.get(start..)?.parse().ok()
}

pub(crate) fn wget(line: &str) -> Option<f64> {
    embedded_percent(line)
}

pub(crate) fn unzip(line: &str) -> Option<f64> {
    let lower = line.to_lowercase();
    if lower.contains("extracting:") {
        Some(0.5)
    } else if lower.contains("inflating:") {
        Some(0.75)
    } else {
        None
    }
}

pub(crate) fn dpkg(line: &str) -> Option<f64> {
    if line.contains("Preparing") {
        Some(0.2)
    } else if line.contains("Unpacking") {
        Some(0.5)
    } else if line.contains("Setting up") {
        Some(0.8)
    } else {
        None
    }
}

pub(crate) fn flatpak(line: &str) -> Option<f64> {
    if line.contains("Descargando") || line.contains("Downloading") {
        embedded_percent(line)
    } else {
        None
    }
}
