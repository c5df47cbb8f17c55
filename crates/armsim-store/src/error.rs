use armsim_types::{NodeKey, TypeError};

use crate::kind::CollectionKind;

/// Errors from resource store operations.
///
/// These are the store's own outcomes. They carry the failing kind and key
/// but no caller-facing wording; operation handlers decide how each one is
/// reported.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No subscription matched the identifier.
    #[error("subscription not found: {identifier}")]
    SubscriptionNotFound { identifier: String },

    /// Path resolution failed at step `depth` (0-based).
    #[error("no {kind} entry {key} at path step {depth}")]
    NotFound {
        depth: usize,
        kind: CollectionKind,
        key: NodeKey,
    },

    /// A collection-level update found no item with the key.
    #[error("no entry {key}")]
    Missing { key: NodeKey },

    /// A subscription with the same stable id is already registered.
    #[error("subscription already exists: {subscription_id}")]
    SubscriptionExists { subscription_id: String },

    /// An add collided with an existing item's unique key.
    #[error("{kind} entry {key} already exists")]
    AlreadyExists { kind: CollectionKind, key: NodeKey },

    /// A content mutation was attempted on a locked item.
    #[error("{key} is locked")]
    Locked { key: NodeKey },

    /// A lock or unlock was attempted from the wrong state.
    #[error("{key} is already {}", lock_word(.locked))]
    StateConflict { key: NodeKey, locked: bool },

    /// Lock transitions are not defined for this kind.
    #[error("{kind} entries cannot be locked")]
    NotLockable { kind: CollectionKind },

    /// The path is structurally invalid (empty, or a step descends into a
    /// collection its parent cannot hold).
    #[error("invalid path: {reason}")]
    InvalidPath { reason: String },

    /// Internal resolver defect. Never an ordinary outcome.
    #[error("store invariant violated: {0}")]
    Invariant(String),

    /// Resource id synthesis failed.
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    /// Snapshot serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A loaded snapshot breaks the tree's structural rules.
    #[error("corrupt snapshot: {reason}")]
    CorruptSnapshot { reason: String },

    /// I/O error while reading or writing a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A shared store's lock was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    /// Returns `true` for [`StoreError::NotFound`] and [`StoreError::Missing`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Missing { .. })
    }

    /// Returns `true` for [`StoreError::AlreadyExists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

fn lock_word(locked: &bool) -> &'static str {
    if *locked {
        "locked"
    } else {
        "unlocked"
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
