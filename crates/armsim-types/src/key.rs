//! Node keys and key selectors.
//!
//! Most collections are keyed by a single name. A few (configuration
//! key-values) are keyed by a primary field plus an optional secondary
//! field. An absent secondary (`None`) is its own value: it never equals
//! `Some("")` or any other string.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The identity of a node within its owning collection.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    /// The primary key component (a name, table name, entity id, or key).
    pub primary: String,
    /// The secondary key component. `None` is the null component.
    #[serde(default)]
    pub secondary: Option<String>,
}

impl NodeKey {
    /// A single-component key.
    pub fn simple(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
        }
    }

    /// A compound key with an optional secondary component.
    pub fn compound(primary: impl Into<String>, secondary: Option<impl Into<String>>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.map(Into::into),
        }
    }

    /// Returns `true` if both components are equal, treating `None` as a
    /// distinct value.
    pub fn matches(&self, primary: &str, secondary: Option<&str>) -> bool {
        self.primary == primary && self.secondary.as_deref() == secondary
    }

    /// The secondary component as a borrowed option.
    pub fn secondary(&self) -> Option<&str> {
        self.secondary.as_deref()
    }

    /// Parse the display form: `primary[secondary]` is compound,
    /// `primary[]` has an empty (not null) secondary, anything else is
    /// simple.
    pub fn parse(text: &str) -> Self {
        match text.strip_suffix(']').and_then(|rest| rest.split_once('[')) {
            Some((primary, secondary)) => Self::compound(primary, Some(secondary)),
            None => Self::simple(text),
        }
    }
}

impl fmt::Debug for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeKey({self})")
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.secondary {
            Some(secondary) => write!(f, "{}[{}]", self.primary, secondary),
            None => f.write_str(&self.primary),
        }
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        Self::simple(value)
    }
}

impl From<String> for NodeKey {
    fn from(value: String) -> Self {
        Self::simple(value)
    }
}

/// Selects which item a delete removes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeySelector {
    /// Match on the primary component only; the first item with that
    /// primary is selected whatever its secondary is.
    Primary(String),
    /// Match on both components; `None` selects only the null secondary.
    Exact(NodeKey),
}

impl KeySelector {
    /// Select by primary component only.
    pub fn primary(primary: impl Into<String>) -> Self {
        Self::Primary(primary.into())
    }

    /// Select by both components.
    pub fn exact(key: NodeKey) -> Self {
        Self::Exact(key)
    }

    /// Returns `true` if `key` is selected.
    pub fn selects(&self, key: &NodeKey) -> bool {
        match self {
            Self::Primary(primary) => key.primary == *primary,
            Self::Exact(exact) => exact == key,
        }
    }
}

impl fmt::Display for KeySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary(primary) => write!(f, "{primary}[*]"),
            Self::Exact(key) => write!(f, "{key}"),
        }
    }
}
