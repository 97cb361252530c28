use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tool family whose output the classifier knows how to read.
///
/// The declaration order is the per-line rule priority: a `wget` match wins
/// over an `unzip` match, which wins over `dpkg`, and so on.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandFamily {
    Wget,
    Unzip,
    Dpkg,
    Apt,
    Flatpak,
}

impl CommandFamily {
    /// All families in rule priority order.
    pub const ALL: [Self; 5] = [
        Self::Wget,
        Self::Unzip,
        Self::Dpkg,
        Self::Apt,
        Self::Flatpak,
    ];

    /// Keyword searched for in a command string when families are inferred.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Wget => "wget",
            Self::Unzip => "unzip",
            Self::Dpkg => "dpkg",
            Self::Apt => "apt",
            Self::Flatpak => "flatpak",
        }
    }
}

impl fmt::Display for CommandFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Error returned when a family name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown command family '{0}' (expected wget, unzip, dpkg, apt or flatpak)")]
pub struct UnknownFamily(pub String);

impl FromStr for CommandFamily {
    type Err = UnknownFamily;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|family| family.keyword().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownFamily(s.to_string()))
    }
}

/// Set of families a command belongs to.
///
/// Families are independent: `dpkg -i x.deb && apt-get -f install` is both
/// `dpkg` and `apt`, and the classifier resolves overlaps line by line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CommandFamilies {
    #[serde(default)]
    pub wget: bool,
    #[serde(default)]
    pub unzip: bool,
    #[serde(default)]
    pub dpkg: bool,
    #[serde(default)]
    pub apt: bool,
    #[serde(default)]
    pub flatpak: bool,
}

impl CommandFamilies {
    /// No family; every line is forwarded as plain status text.
    pub const NONE: Self = Self {
        wget: false,
        unzip: false,
        dpkg: false,
        apt: false,
        flatpak: false,
    };

    /// Infer families by substring search on the command string.
    ///
    /// This is a heuristic: a path or argument that happens to contain
    /// `apt` marks the command as apt. Callers that know better should tag
    /// the request explicitly.
    #[must_use]
    pub fn detect(command: &str) -> Self {
        let mut families = Self::NONE;
        for family in CommandFamily::ALL {
            if command.contains(family.keyword()) {
                families.insert(family);
            }
        }
        families
    }

    /// Set containing a single family.
    #[must_use]
    pub fn only(family: CommandFamily) -> Self {
        let mut families = Self::NONE;
        families.insert(family);
        families
    }

    pub fn insert(&mut self, family: CommandFamily) {
        *self.slot_mut(family) = true;
    }

    #[must_use]
    pub fn contains(&self, family: CommandFamily) -> bool {
        match family {
            CommandFamily::Wget => self.wget,
            CommandFamily::Unzip => self.unzip,
            CommandFamily::Dpkg => self.dpkg,
            CommandFamily::Apt => self.apt,
            CommandFamily::Flatpak => self.flatpak,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    /// Members in rule priority order.
    pub fn iter(&self) -> impl Iterator<Item = CommandFamily> + '_ {
        CommandFamily::ALL
            .into_iter()
            .filter(move |family| self.contains(*family))
    }

    fn slot_mut(&mut self, family: CommandFamily) -> &mut bool {
        match family {
            CommandFamily::Wget => &mut self.wget,
            CommandFamily::Unzip => &mut self.unzip,
            CommandFamily::Dpkg => &mut self.dpkg,
            CommandFamily::Apt => &mut self.apt,
            CommandFamily::Flatpak => &mut self.flatpak,
        }
    }
}

impl FromIterator<CommandFamily> for CommandFamilies {
    fn from_iter<I: IntoIterator<Item = CommandFamily>>(iter: I) -> Self {
        let mut families = Self::NONE;
        for family in iter {
            families.insert(family);
        }
        families
    }
}

impl fmt::Display for CommandFamilies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter().map(CommandFamily::keyword).collect();
        f.write_str(&names.join("+"))
    }
}
