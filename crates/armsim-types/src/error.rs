use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("subscription id is required to build a resource id")]
    MissingSubscription,

    #[error("empty {0} segment in resource id")]
    EmptySegment(&'static str),

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}
