//! Common test helper functions.

use crate::transcripts;
use std::fs;
use std::path::Path;

/// Quote `text` for a POSIX shell.
#[must_use]
pub fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// A shell command that prints `lines`, one per line, and exits 0.
#[must_use]
pub fn shell_printf_command(lines: &[&str]) -> String {
    let args: Vec<String> = lines.iter().map(|line| shell_quote(line)).collect();
    format!("printf '%s\\n' {}", args.join(" "))
}

/// Like [`shell_printf_command`], prefixed with a no-op `: <marker>;` so the
/// command text contains a family keyword such as `apt`.
#[must_use]
pub fn shell_printf_command_tagged(marker: &str, lines: &[&str]) -> String {
    format!(": {marker}; {}", shell_printf_command(lines))
}

/// Transcript by fake-tool name: `apt`, `apt-es`, `dpkg`, `wget`, `unzip`,
/// `flatpak`.
#[must_use]
pub fn transcript_for(name: &str) -> Option<&'static [&'static str]> {
    match name {
        "apt" => Some(transcripts::APT_INSTALL_EN),
        "apt-es" => Some(transcripts::APT_INSTALL_ES),
        "dpkg" => Some(transcripts::DPKG_INSTALL),
        "wget" => Some(transcripts::WGET_DOWNLOAD),
        "unzip" => Some(transcripts::UNZIP_ARCHIVE),
        "flatpak" => Some(transcripts::FLATPAK_INSTALL_ES),
        _ => None,
    }
}

/// Write a JSON config document to `path`.
///
/// # Panics
///
/// Panics if serialization or file writing fails.
pub fn write_config(path: &Path, config: &serde_json::Value) {
    let data = serde_json::to_vec_pretty(config).expect("failed to serialize config");
    fs::write(path, data).expect("failed to write config file");
}
