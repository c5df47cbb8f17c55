use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque version token used for optimistic concurrency.
///
/// Fresh tokens are UUID v7 strings, so tokens issued by one process are
/// time-ordered and never collide. Tokens loaded from a snapshot may be any
/// string and are compared verbatim.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    /// Generate a new, globally unique token.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Generate a token guaranteed to differ from `previous`.
    pub fn next_after(previous: &ETag) -> Self {
        loop {
            let candidate = Self::new();
            if &candidate != previous {
                return candidate;
            }
        }
    }

    /// Wrap an existing token value (e.g. one read from a snapshot).
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The token as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short representation (first 8 characters).
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map_or(self.0.len(), |(idx, _)| idx);
        &self.0[..end]
    }
}

impl Default for ETag {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ETag({})", self.short())
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn fresh_tokens_are_unique() {
        let tokens: HashSet<ETag> = (0..1000).map(|_| ETag::new()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn next_after_differs_from_previous() {
        let first = ETag::from_string("fixed");
        let next = ETag::next_after(&first);
        assert_ne!(first, next);
    }

    #[test]
    fn short_handles_short_values() {
        assert_eq!(ETag::from_string("abc").short(), "abc");
        assert_eq!(ETag::from_string("0123456789").short(), "01234567");
    }

    #[test]
    fn serializes_as_plain_string() {
        let tag = ETag::from_string("etag-1");
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, "\"etag-1\"");
        let parsed: ETag = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tag);
    }
}
