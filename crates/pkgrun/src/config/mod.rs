//! Runner configuration and its file loader.
//!
//! Every field has a default, so an empty YAML or JSON document is a valid
//! configuration. [`RunnerConfigBuilder`] is the programmatic counterpart.
//!
//! # Example
//!
//! ```
//! use pkgrun::config::{RunnerConfigBuilder, Transport};
//! use std::time::Duration;
//!
//! let config = RunnerConfigBuilder::new()
//!     .transport(Transport::Pipe)
//!     .settle_delay(Duration::from_millis(50))
//!     .env("LC_ALL", "C")
//!     .build();
//! assert_eq!(config.settle_delay_ms, 50);
//! ```

mod messages;

pub use messages::{Locale, MessageOverrides, Messages};

use crate::error::{RunnerError, RunnerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default post-completion pause before the UI is told to clear progress.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;
/// Default shell used to interpret command strings.
pub const DEFAULT_SHELL: &str = "/bin/sh";

const MIN_PTY_DIMENSION: u16 = 1;
const MAX_PTY_DIMENSION: u16 = 500;

/// How the combined stdout/stderr stream of a command is captured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Plain pipe, with the shell redirecting stderr onto stdout. Stdin is
    /// null, so prompts read end-of-file.
    #[default]
    Pipe,
    /// Pseudo-terminal; both streams share one ordered byte sequence.
    /// Stdin reads end-of-file right after spawn.
    Pty,
}

/// Size of the pseudo-terminal presented to the command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PtySizeConfig {
    pub rows: u16,
    pub cols: u16,
}

impl Default for PtySizeConfig {
    fn default() -> Self {
        Self { rows: 24, cols: 120 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Shell invoked as `<shell> -c <command>`.
    pub shell: String,
    pub transport: Transport,
    pub settle_delay_ms: u64,
    /// Working directory for the command (absolute).
    pub cwd: Option<PathBuf>,
    /// Extra environment variables, layered over the inherited environment.
    pub env: BTreeMap<String, String>,
    pub pty_size: PtySizeConfig,
    pub locale: Locale,
    pub messages: MessageOverrides,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            transport: Transport::default(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            cwd: None,
            env: BTreeMap::new(),
            pty_size: PtySizeConfig::default(),
            locale: Locale::default(),
            messages: MessageOverrides::default(),
        }
    }
}

impl RunnerConfig {
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Status-message formatter for this config's locale and overrides.
    #[must_use]
    pub fn messages(&self) -> Messages {
        Messages::for_locale(self.locale).with_overrides(&self.messages)
    }

    /// Reject configurations the spawner cannot honour.
    pub fn validate(&self) -> RunnerResult<()> {
        if self.shell.trim().is_empty() {
            return Err(RunnerError::InvalidConfig("shell must not be empty".into()));
        }
        if let Some(cwd) = &self.cwd {
            if !cwd.is_absolute() {
                return Err(RunnerError::InvalidConfig(format!(
                    "cwd must be an absolute path, got {}",
                    cwd.display()
                )));
            }
        }
        let size = self.pty_size;
        for (name, value) in [("rows", size.rows), ("cols", size.cols)] {
            if !(MIN_PTY_DIMENSION..=MAX_PTY_DIMENSION).contains(&value) {
                return Err(RunnerError::InvalidConfig(format!(
                    "pty_size.{name} must be between {MIN_PTY_DIMENSION} and {MAX_PTY_DIMENSION}, got {value}"
                )));
            }
        }
        if self.env.keys().any(|key| key.is_empty() || key.contains('=')) {
            return Err(RunnerError::InvalidConfig(
                "env keys must be non-empty and must not contain '='".into(),
            ));
        }
        Ok(())
    }
}

/// Load and validate a config file; `.yaml`/`.yml` are YAML, anything else JSON.
pub fn load_config_file(path: &Path) -> RunnerResult<RunnerConfig> {
    let data = fs::read_to_string(path).map_err(|source| RunnerError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    let config: RunnerConfig = if is_yaml {
        serde_yml::from_str(&data).map_err(|err| RunnerError::ConfigParse {
            path: path.to_path_buf(),
            details: err.to_string(),
        })?
    } else {
        serde_json::from_str(&data).map_err(|err| RunnerError::ConfigParse {
            path: path.to_path_buf(),
            details: err.to_string(),
        })?
    };
    config.validate()?;
    tracing::debug!(path = %path.display(), "loaded runner config");
    Ok(config)
}

// =============================================================================
// RunnerConfigBuilder
// =============================================================================

/// Fluent builder for [`RunnerConfig`].
#[derive(Clone, Debug, Default)]
pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.config.shell = shell.into();
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Transport) -> Self {
        self.config.transport = transport;
        self
    }

    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.config.cwd = Some(cwd.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn pty_size(mut self, rows: u16, cols: u16) -> Self {
        self.config.pty_size = PtySizeConfig { rows, cols };
        self
    }

    #[must_use]
    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    #[must_use]
    pub fn messages(mut self, overrides: MessageOverrides) -> Self {
        self.config.messages = overrides;
        self
    }

    #[must_use]
    pub fn build(self) -> RunnerConfig {
        self.config
    }
}
