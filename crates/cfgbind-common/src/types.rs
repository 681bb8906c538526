//! Domain primitive types used across the cfgbind workspace.

use std::fmt;

use crate::constants::{FALSE_WORDS, TRUE_WORDS};

/// Handle to a [`ConfigSection`] added to a registry.
///
/// Only meaningful for the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(usize);

impl SectionId {
    /// Creates a handle from a registry-local index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the registry-local index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A help-output grouping of config types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSection {
    /// Heading printed above the section's types.
    pub description: String,
    /// Sort key; sections print in ascending order.
    pub order: i32,
}

impl ConfigSection {
    /// Creates a section with the given heading and sort key.
    #[must_use]
    pub fn new(description: impl Into<String>, order: i32) -> Self {
        Self {
            description: description.into(),
            order,
        }
    }
}

/// Marker attached to a config type at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// At least one instance must be supplied.
    Required,
    /// At most one instance may be supplied.
    Singleton,
    /// When present, it must be the only instance of any type.
    Exclusive,
    /// Omitted from help output.
    Hidden,
    /// Listed under the given section in help output.
    Section(SectionId),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Singleton => write!(f, "singleton"),
            Self::Exclusive => write!(f, "exclusive"),
            Self::Hidden => write!(f, "hidden"),
            Self::Section(id) => write!(f, "section #{}", id.index()),
        }
    }
}

/// Normalizes a flag, field, or phase name into its lookup key.
#[must_use]
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Interprets a boolean annotation value such as `yes` or `True`.
///
/// Returns `None` when the text is not a recognized boolean word.
#[must_use]
pub fn parse_flag_bool(text: &str) -> Option<bool> {
    let word = text.trim().to_lowercase();
    if TRUE_WORDS.contains(&word.as_str()) {
        Some(true)
    } else if FALSE_WORDS.contains(&word.as_str()) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_is_case_insensitive() {
        assert_eq!(normalize_key("PhaseTest"), "phasetest");
        assert_eq!(normalize_key(" Mss "), "mss");
    }

    #[test]
    fn parse_flag_bool_accepts_common_words() {
        assert_eq!(parse_flag_bool("yes"), Some(true));
        assert_eq!(parse_flag_bool("True"), Some(true));
        assert_eq!(parse_flag_bool("NO"), Some(false));
        assert_eq!(parse_flag_bool("0"), Some(false));
        assert_eq!(parse_flag_bool("maybe"), None);
    }
}
