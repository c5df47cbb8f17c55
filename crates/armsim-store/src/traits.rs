use crate::collection::Collection;
use crate::error::{StoreError, StoreResult};
use crate::kind::CollectionKind;
use crate::model::{Node, Subscription};

/// Anything that owns typed child collections: a subscription (which owns
/// resource groups) or a node.
///
/// Implementations must satisfy these invariants:
/// - A kind may only be requested from an owner that the schema allows as
///   its parent. Anything else is rejected with [`StoreError::InvalidPath`].
/// - Read access never creates a collection.
/// - `collection_or_create` creates at most one empty collection and leaves
///   every existing collection untouched.
pub trait CollectionOwner {
    /// The kind of this owner. `None` for a subscription.
    fn owner_kind(&self) -> Option<CollectionKind>;

    /// A child collection, if present.
    fn collection(&self, kind: CollectionKind) -> Option<&Collection>;

    /// A child collection for in-place mutation, if present.
    fn collection_mut(&mut self, kind: CollectionKind) -> Option<&mut Collection>;

    /// A child collection, inserting an empty one if absent.
    fn collection_or_create(&mut self, kind: CollectionKind) -> StoreResult<&mut Collection>;

    /// Check that `kind` may hang off this owner.
    fn check_child(&self, kind: CollectionKind) -> StoreResult<()> {
        if kind.parent() == self.owner_kind() {
            Ok(())
        } else {
            Err(StoreError::InvalidPath {
                reason: match self.owner_kind() {
                    Some(owner) => format!("{owner} entries cannot hold {kind}"),
                    None => format!("subscriptions cannot hold {kind}"),
                },
            })
        }
    }
}

impl CollectionOwner for Subscription {
    fn owner_kind(&self) -> Option<CollectionKind> {
        None
    }

    fn collection(&self, kind: CollectionKind) -> Option<&Collection> {
        match kind {
            CollectionKind::ResourceGroups => self.resource_groups.as_ref(),
            _ => None,
        }
    }

    fn collection_mut(&mut self, kind: CollectionKind) -> Option<&mut Collection> {
        match kind {
            CollectionKind::ResourceGroups => self.resource_groups.as_mut(),
            _ => None,
        }
    }

    fn collection_or_create(&mut self, kind: CollectionKind) -> StoreResult<&mut Collection> {
        self.check_child(kind)?;
        Ok(self.resource_groups.get_or_insert_with(Collection::new))
    }
}

impl CollectionOwner for Node {
    fn owner_kind(&self) -> Option<CollectionKind> {
        Some(self.kind)
    }

    fn collection(&self, kind: CollectionKind) -> Option<&Collection> {
        self.children.get(&kind)
    }

    fn collection_mut(&mut self, kind: CollectionKind) -> Option<&mut Collection> {
        self.children.get_mut(&kind)
    }

    fn collection_or_create(&mut self, kind: CollectionKind) -> StoreResult<&mut Collection> {
        self.check_child(kind)?;
        Ok(self.children.entry(kind).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_only_holds_resource_groups() {
        let mut sub = Subscription::new("s1", "Acme");
        assert!(sub.collection(CollectionKind::ResourceGroups).is_none());
        assert!(sub.collection_or_create(CollectionKind::KeyVaults).is_err());
        assert!(sub.resource_groups.is_none());

        sub.collection_or_create(CollectionKind::ResourceGroups)
            .unwrap();
        assert!(sub.collection(CollectionKind::ResourceGroups).is_some());
    }

    #[test]
    fn node_creates_only_schema_children() {
        let mut vault = Node::new(CollectionKind::KeyVaults, "kv1");
        let err = vault
            .collection_or_create(CollectionKind::Blobs)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath { .. }));
        assert!(vault.children.is_empty());

        vault.collection_or_create(CollectionKind::Keys).unwrap();
        assert!(vault.collection(CollectionKind::Keys).unwrap().is_empty());
    }

    #[test]
    fn reads_never_create() {
        let group = Node::new(CollectionKind::ResourceGroups, "rg1");
        assert!(group.collection(CollectionKind::KeyVaults).is_none());
        assert!(group.children.is_empty());
    }
}
