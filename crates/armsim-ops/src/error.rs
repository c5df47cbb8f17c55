use armsim_store::StoreError;
use thiserror::Error;

/// Caller-facing operation errors.
#[derive(Debug, Error)]
pub enum OpError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("subscription not found: {0}")]
    SubscriptionNotFound(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("service error: {0}")]
    Service(String),
}

impl From<StoreError> for OpError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SubscriptionNotFound { identifier } => Self::SubscriptionNotFound(identifier),
            err @ (StoreError::NotFound { .. } | StoreError::Missing { .. }) => {
                Self::ResourceNotFound(err.to_string())
            }
            err @ (StoreError::AlreadyExists { .. }
            | StoreError::SubscriptionExists { .. }
            | StoreError::Locked { .. }
            | StoreError::StateConflict { .. }) => Self::Conflict(err.to_string()),
            StoreError::InvalidPath { reason } => Self::InvalidInput(reason),
            err @ StoreError::NotLockable { .. } => Self::InvalidInput(err.to_string()),
            other => Self::Service(other.to_string()),
        }
    }
}

pub type OpResult<T> = Result<T, OpError>;

#[cfg(test)]
mod tests {
    use armsim_store::CollectionKind;
    use armsim_types::NodeKey;

    use super::*;

    #[test]
    fn store_outcomes_map_to_caller_categories() {
        let not_found = StoreError::NotFound {
            depth: 1,
            kind: CollectionKind::KeyVaults,
            key: NodeKey::simple("kv1"),
        };
        assert!(matches!(OpError::from(not_found), OpError::ResourceNotFound(_)));

        let locked = StoreError::Locked {
            key: NodeKey::simple("k"),
        };
        assert!(matches!(OpError::from(locked), OpError::Conflict(_)));

        let missing_sub = StoreError::SubscriptionNotFound {
            identifier: "Acme".into(),
        };
        match OpError::from(missing_sub) {
            OpError::SubscriptionNotFound(identifier) => assert_eq!(identifier, "Acme"),
            other => panic!("unexpected: {other}"),
        }

        let not_lockable = StoreError::NotLockable {
            kind: CollectionKind::KeyVaults,
        };
        assert!(matches!(OpError::from(not_lockable), OpError::InvalidInput(_)));

        let invariant = StoreError::Invariant("bad index".into());
        assert!(matches!(OpError::from(invariant), OpError::Service(_)));
    }
}
