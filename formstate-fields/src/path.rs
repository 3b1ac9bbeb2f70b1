//! Path addressing for fields inside a document.
//!
//! A path key concatenates ancestor names and array row indices with `.`,
//! e.g. `layout.2.heading`. Unnamed containers and unnamed tabs add nothing.

use std::fmt;

/// Separator between path segments.
pub const DELIMITER: char = '.';

/// The address prefix shared by every field in one field list.
///
/// A prefix is either empty (document root) or ends with [`DELIMITER`], so a
/// field key is always `prefix + name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathPrefix(String);

impl PathPrefix {
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path key of a field named `name` in this list.
    pub fn key(&self, name: &str) -> String {
        format!("{}{}", self.0, name)
    }

    /// Prefix for the children of a named group or named tab.
    pub fn nested(&self, name: &str) -> PathPrefix {
        PathPrefix(format!("{}{}{}", self.0, name, DELIMITER))
    }

    /// Prefix for the fields of row `index` of the container `name`.
    pub fn row(&self, name: &str, index: usize) -> PathPrefix {
        PathPrefix(format!("{}{}{}{}{}", self.0, name, DELIMITER, index, DELIMITER))
    }
}

impl fmt::Display for PathPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.strip_suffix(DELIMITER) {
            Some(trimmed) => f.write_str(trimmed),
            None if self.0.is_empty() => f.write_str("<root>"),
            None => f.write_str(&self.0),
        }
    }
}
