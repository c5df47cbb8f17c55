//! Key/label filtering over compound-keyed collections.

use crate::collection::Collection;
use crate::model::Node;

/// Label filter text that selects only items with a null label.
pub const NULL_LABEL_FILTER: &str = "\\0";

/// A single key or label pattern: exact text, or a prefix when the filter
/// ends with `*`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pattern<'a> {
    Exact(&'a str),
    Prefix(&'a str),
}

impl<'a> Pattern<'a> {
    fn parse(filter: &'a str) -> Self {
        match filter.strip_suffix('*') {
            Some(prefix) => Self::Prefix(prefix),
            None => Self::Exact(filter),
        }
    }

    fn matches(self, value: &str) -> bool {
        match self {
            Self::Exact(exact) => value == exact,
            Self::Prefix(prefix) => value.starts_with(prefix),
        }
    }
}

fn label_matches(filter: &str, label: Option<&str>) -> bool {
    if filter == NULL_LABEL_FILTER {
        return label.is_none();
    }
    match (Pattern::parse(filter), label) {
        (pattern, Some(label)) => pattern.matches(label),
        // A bare `*` is the only pattern that admits the null label.
        (Pattern::Prefix(prefix), None) => prefix.is_empty(),
        (Pattern::Exact(_), None) => false,
    }
}

/// Copies of the items in `collection` whose primary key matches
/// `key_filter` and whose secondary key matches `label_filter`.
///
/// `None` filters match everything. A filter ending in `*` is a prefix
/// match. The label filter `\0` (backslash, zero) matches only the null
/// label, and a wildcard label filter other than `*` never matches it.
pub fn filter_key_values(
    collection: &Collection,
    key_filter: Option<&str>,
    label_filter: Option<&str>,
) -> Vec<Node> {
    let key_pattern = key_filter.map(Pattern::parse);
    collection
        .iter()
        .filter(|node| key_pattern.map_or(true, |pattern| pattern.matches(&node.key.primary)))
        .filter(|node| label_filter.map_or(true, |filter| label_matches(filter, node.key.secondary())))
        .cloned()
        .collect()
}
