use serde::{Deserialize, Serialize};

/// Language used for the status messages the engine itself produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    Es,
}

/// Optional per-message replacements, as found in a config file.
///
/// `{package}` is substituted in `unpacking`/`configuring`, `{details}` in
/// `error`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessageOverrides {
    pub unpacking: Option<String>,
    pub configuring: Option<String>,
    pub complete: Option<String>,
    pub error: Option<String>,
}

/// Formatter for engine-generated status text.
///
/// Passed explicitly to the classifier and the worker instead of relying on
/// a process-wide translation catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Messages {
    unpacking: String,
    configuring: String,
    complete: String,
    error: String,
}

impl Messages {
    #[must_use]
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Self {
                unpacking: "Unpacking {package}...".to_string(),
                configuring: "Configuring {package}...".to_string(),
                complete: "Installation complete".to_string(),
                error: "Error: {details}".to_string(),
            },
            Locale::Es => Self {
                unpacking: "Desempaquetando {package}...".to_string(),
                configuring: "Configurando {package}...".to_string(),
                complete: "Instalación completada".to_string(),
                error: "Error: {details}".to_string(),
            },
        }
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: &MessageOverrides) -> Self {
        if let Some(text) = &overrides.unpacking {
            self.unpacking.clone_from(text);
        }
        if let Some(text) = &overrides.configuring {
            self.configuring.clone_from(text);
        }
        if let Some(text) = &overrides.complete {
            self.complete.clone_from(text);
        }
        if let Some(text) = &overrides.error {
            self.error.clone_from(text);
        }
        self
    }

    #[must_use]
    pub fn unpacking(&self, package: &str) -> String {
        self.unpacking.replace("{package}", package)
    }

    #[must_use]
    pub fn configuring(&self, package: &str) -> String {
        self.configuring.replace("{package}", package)
    }

    #[must_use]
    pub fn complete(&self) -> &str {
        &self.complete
    }

    #[must_use]
    pub fn error(&self, details: &str) -> String {
        self.error.replace("{details}", details)
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::for_locale(Locale::default())
    }
}
