use std::ops::{Deref, DerefMut};

use armsim_types::{KeySelector, NodeKey};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::collection::{apply_patch, Collection, Uniqueness};
use crate::error::{StoreError, StoreResult};
use crate::kind::CollectionKind;
use crate::model::{Node, Subscription, Versioning};
use crate::path::{ResourcePath, Step};
use crate::stamp::{self, Stamper};
use crate::traits::CollectionOwner;

/// The in-memory entity tree: an ordered list of subscriptions, each owning
/// its resource groups and everything beneath them.
///
/// Two access modes are offered:
/// - **Copy** (`get_path_if_exists`, `collection_if_exists`): independent
///   clones, no side effects on the tree.
/// - **Reference** (`get_or_create_path`, `get_or_create_collection`):
///   live handles into the tree. Missing intermediate collections along
///   the path are created as empty collections; missing items are not.
#[derive(Debug, Default)]
pub struct ResourceStore {
    subscriptions: Vec<Subscription>,
    stamper: Stamper,
}

impl ResourceStore {
    /// Create an empty store stamping with the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `subscriptions`.
    pub fn from_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        Self {
            subscriptions,
            stamper: Stamper::system(),
        }
    }

    /// Replace the stamper (e.g. to inject a manual clock).
    pub fn with_stamper(mut self, stamper: Stamper) -> Self {
        self.stamper = stamper;
        self
    }

    pub fn stamper(&self) -> &Stamper {
        &self.stamper
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub(crate) fn into_subscriptions(self) -> Vec<Subscription> {
        self.subscriptions
    }

    // ---- Subscriptions ----

    /// Register a subscription. Stable ids must be unique.
    pub fn add_subscription(&mut self, subscription: Subscription) -> StoreResult<&mut Subscription> {
        if self.subscription(&subscription.subscription_id).is_some() {
            return Err(StoreError::SubscriptionExists {
                subscription_id: subscription.subscription_id,
            });
        }
        debug!(subscription_id = %subscription.subscription_id, "subscription added");
        self.subscriptions.push(subscription);
        let last = self.subscriptions.len() - 1;
        Ok(&mut self.subscriptions[last])
    }

    /// Remove a subscription by stable id. Returns `true` if it existed.
    pub fn remove_subscription(&mut self, subscription_id: &str) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions
            .retain(|sub| sub.subscription_id != subscription_id);
        before != self.subscriptions.len()
    }

    /// Exact lookup by stable id.
    pub fn subscription(&self, subscription_id: &str) -> Option<&Subscription> {
        self.subscriptions
            .iter()
            .find(|sub| sub.subscription_id == subscription_id)
    }

    fn subscription_mut(&mut self, subscription_id: &str) -> StoreResult<&mut Subscription> {
        self.subscriptions
            .iter_mut()
            .find(|sub| sub.subscription_id == subscription_id)
            .ok_or_else(|| StoreError::SubscriptionNotFound {
                identifier: subscription_id.to_string(),
            })
    }

    /// Resolve a caller-supplied identifier to a subscription.
    ///
    /// Every stable id is tried before any display name, so a display name
    /// that happens to equal another subscription's id never shadows it.
    /// Among display-name matches the first in store order wins.
    pub fn resolve_subscription(&self, identifier: &str) -> StoreResult<&Subscription> {
        self.subscription(identifier)
            .or_else(|| {
                self.subscriptions
                    .iter()
                    .find(|sub| sub.display_name == identifier)
            })
            .ok_or_else(|| StoreError::SubscriptionNotFound {
                identifier: identifier.to_string(),
            })
    }

    // ---- Copy access ----

    /// A clone of the node at `path`. Never modifies the tree.
    pub fn get_path_if_exists(&self, path: &ResourcePath) -> StoreResult<Node> {
        self.resolve(path).cloned()
    }

    /// Alias of [`ResourceStore::get_path_if_exists`].
    pub fn read_copy(&self, path: &ResourcePath) -> StoreResult<Node> {
        self.get_path_if_exists(path)
    }

    /// A clone of `parent`'s collection of `kind`, or an empty collection if
    /// it was never created. Never modifies the tree.
    pub fn collection_if_exists(
        &self,
        parent: &ResourcePath,
        kind: CollectionKind,
    ) -> StoreResult<Collection> {
        check_collection_parent(parent, kind)?;
        let found = if parent.is_root() {
            self.subscription(parent.subscription_id())
                .ok_or_else(|| not_found_subscription(parent))?
                .collection(kind)
        } else {
            self.resolve(parent)?.collection(kind)
        };
        Ok(found.cloned().unwrap_or_default())
    }

    /// Borrow the node at `path` without cloning.
    pub fn resolve(&self, path: &ResourcePath) -> StoreResult<&Node> {
        path.validate()?;
        let subscription = self
            .subscription(path.subscription_id())
            .ok_or_else(|| not_found_subscription(path))?;
        let (first, rest) = path.steps().split_first().ok_or_else(empty_path)?;

        let mut node = lookup(subscription.collection(first.kind), 0, first)?;
        for (offset, step) in rest.iter().enumerate() {
            node = lookup(node.collection(step.kind), offset + 1, step)?;
        }
        Ok(node)
    }

    // ---- Reference access ----

    /// A live handle to the node at `path`.
    ///
    /// Every collection along the path up to the first missing item is
    /// created if absent, even when the lookup then fails. The item itself
    /// is never created.
    pub fn get_or_create_path(&mut self, path: &ResourcePath) -> StoreResult<Slot<'_>> {
        path.validate()?;
        let stamper = self.stamper.clone();
        let subscription = self.subscription_mut(path.subscription_id())?;
        let (list, index) = walk_mut(subscription, path.steps())?;
        Slot::new(list, index, path.clone(), stamper)
    }

    /// Alias of [`ResourceStore::get_or_create_path`].
    pub fn read_reference(&mut self, path: &ResourcePath) -> StoreResult<Slot<'_>> {
        self.get_or_create_path(path)
    }

    /// A live handle to `parent`'s collection of `kind`, created empty if
    /// absent.
    pub fn get_or_create_collection(
        &mut self,
        parent: &ResourcePath,
        kind: CollectionKind,
    ) -> StoreResult<ListHandle<'_>> {
        parent.validate()?;
        check_collection_parent(parent, kind)?;
        let stamper = self.stamper.clone();
        let subscription = self.subscription_mut(parent.subscription_id())?;
        let list = if parent.is_root() {
            subscription.collection_or_create(kind)?
        } else {
            let (owner_list, index) = walk_mut(subscription, parent.steps())?;
            let owner = owner_list
                .get_mut(index)
                .ok_or_else(|| lost_index(parent, index))?;
            owner.collection_or_create(kind)?
        };
        Ok(ListHandle {
            list,
            parent: parent.clone(),
            kind,
            stamper,
        })
    }

    // ---- Path-level mutators ----

    /// Create `node` under `parent`. See [`ListHandle::add`].
    pub fn create(
        &mut self,
        parent: &ResourcePath,
        node: Node,
        uniqueness: Uniqueness,
    ) -> StoreResult<&mut Node> {
        let handle = self.get_or_create_collection(parent, node.kind)?;
        handle.into_add(node, uniqueness)
    }

    /// Shallow-merge `patch` into the node at `path`.
    pub fn update(&mut self, path: &ResourcePath, patch: Map<String, Value>) -> StoreResult<&mut Node> {
        let mut slot = self.get_or_create_path(path)?;
        slot.update(patch)?;
        Ok(slot.into_node())
    }

    /// Delete the node at `path` by exact key.
    ///
    /// Returns `Ok(false)` if the owning collection holds no such item.
    /// Fails if the path to the owner does not resolve.
    pub fn delete(&mut self, path: &ResourcePath) -> StoreResult<bool> {
        let (parent, last) = split_target(path)?;
        let mut handle = self.get_or_create_collection(&parent, last.kind)?;
        handle.delete(&KeySelector::exact(last.key.clone()))
    }

    /// Lock the node at `path`.
    pub fn lock(&mut self, path: &ResourcePath) -> StoreResult<Versioning> {
        self.get_or_create_path(path)?.lock()
    }

    /// Unlock the node at `path`.
    pub fn unlock(&mut self, path: &ResourcePath) -> StoreResult<Versioning> {
        self.get_or_create_path(path)?.unlock()
    }

    /// Find the group-level resource of `kind` named `name` by scanning every
    /// resource group of the subscription in order.
    pub fn locate(
        &self,
        subscription_id: &str,
        kind: CollectionKind,
        name: &str,
    ) -> StoreResult<ResourcePath> {
        if kind.parent() != Some(CollectionKind::ResourceGroups) {
            return Err(StoreError::InvalidPath {
                reason: format!("{kind} entries are not group-level resources"),
            });
        }
        let subscription =
            self.subscription(subscription_id)
                .ok_or_else(|| StoreError::SubscriptionNotFound {
                    identifier: subscription_id.to_string(),
                })?;
        let key = NodeKey::simple(name);
        subscription
            .collection(CollectionKind::ResourceGroups)
            .into_iter()
            .flatten()
            .find(|group| {
                group
                    .collection(kind)
                    .is_some_and(|list| list.find(&key).is_some())
            })
            .map(|group| {
                ResourcePath::new(subscription_id)
                    .step(CollectionKind::ResourceGroups, group.key.clone())
                    .step(kind, key.clone())
            })
            .ok_or(StoreError::NotFound {
                depth: 1,
                kind,
                key,
            })
    }
}

/// Walk `steps` from `subscription`, creating absent collections, and
/// return the list holding the final item plus its index.
fn walk_mut<'a>(
    subscription: &'a mut Subscription,
    steps: &[Step],
) -> StoreResult<(&'a mut Collection, usize)> {
    let (first, rest) = steps.split_first().ok_or_else(empty_path)?;
    let mut list = subscription.collection_or_create(first.kind)?;
    let mut index = locate_in(list, 0, first)?;
    for (offset, step) in rest.iter().enumerate() {
        let current = list;
        let node = current.get_mut(index).ok_or_else(|| {
            error!(depth = offset, index, "resolved index vanished during walk");
            StoreError::Invariant(format!("index {index} missing at step {offset}"))
        })?;
        list = node.collection_or_create(step.kind)?;
        index = locate_in(list, offset + 1, step)?;
    }
    Ok((list, index))
}

fn locate_in(list: &Collection, depth: usize, step: &Step) -> StoreResult<usize> {
    list.position(&step.key)
        .ok_or_else(|| not_found(depth, step))
}

fn lookup<'a>(list: Option<&'a Collection>, depth: usize, step: &Step) -> StoreResult<&'a Node> {
    list.and_then(|list| list.find(&step.key))
        .ok_or_else(|| not_found(depth, step))
}

fn not_found(depth: usize, step: &Step) -> StoreError {
    StoreError::NotFound {
        depth,
        kind: step.kind,
        key: step.key.clone(),
    }
}

fn not_found_subscription(path: &ResourcePath) -> StoreError {
    StoreError::SubscriptionNotFound {
        identifier: path.subscription_id().to_string(),
    }
}

fn empty_path() -> StoreError {
    StoreError::InvalidPath {
        reason: "path has no steps".into(),
    }
}

fn lost_index(path: &ResourcePath, index: usize) -> StoreError {
    error!(%path, index, "resolved index vanished");
    StoreError::Invariant(format!("index {index} missing under {path}"))
}

fn check_collection_parent(parent: &ResourcePath, kind: CollectionKind) -> StoreResult<()> {
    if kind.parent() == parent.kind() {
        Ok(())
    } else {
        Err(StoreError::InvalidPath {
            reason: format!("{kind} cannot be held by {parent}"),
        })
    }
}

fn split_target(path: &ResourcePath) -> StoreResult<(ResourcePath, &Step)> {
    let last = path.last().ok_or_else(empty_path)?;
    let parent = path.parent().ok_or_else(empty_path)?;
    Ok((parent, last))
}

/// A live handle to one node plus the collection that holds it.
///
/// The index is checked when the slot is built, so the node accessors never
/// fail. Consuming methods give up the slot so the index cannot go stale.
#[derive(Debug)]
pub struct Slot<'a> {
    list: &'a mut Collection,
    index: usize,
    path: ResourcePath,
    stamper: Stamper,
}

impl<'a> Slot<'a> {
    fn new(
        list: &'a mut Collection,
        index: usize,
        path: ResourcePath,
        stamper: Stamper,
    ) -> StoreResult<Self> {
        if index >= list.len() {
            return Err(lost_index(&path, index));
        }
        Ok(Self {
            list,
            index,
            path,
            stamper,
        })
    }

    pub fn node(&self) -> &Node {
        &self.list[self.index]
    }

    pub fn node_mut(&mut self) -> &mut Node {
        &mut self.list[self.index]
    }

    /// The node's position in its collection.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// The collection holding the node.
    pub fn list(&self) -> &Collection {
        &*self.list
    }

    /// Give up the slot, keeping the node borrow.
    pub fn into_node(self) -> &'a mut Node {
        let Slot { list, index, .. } = self;
        &mut list[index]
    }

    /// Give up the slot, keeping the collection borrow and the index.
    pub fn into_parts(self) -> (&'a mut Collection, usize) {
        (self.list, self.index)
    }

    /// Shallow-merge `patch` into the node.
    pub fn update(&mut self, patch: Map<String, Value>) -> StoreResult<&mut Node> {
        let stamper = self.stamper.clone();
        let node = self.node_mut();
        apply_patch(node, patch, &stamper)?;
        Ok(node)
    }

    pub fn lock(&mut self) -> StoreResult<Versioning> {
        let stamper = self.stamper.clone();
        stamp::lock(self.node_mut(), &stamper)
    }

    pub fn unlock(&mut self) -> StoreResult<Versioning> {
        let stamper = self.stamper.clone();
        stamp::unlock(self.node_mut(), &stamper)
    }

    /// Remove the node from its collection and return it.
    pub fn remove(self) -> StoreResult<Node> {
        if self.node().locked {
            return Err(StoreError::Locked {
                key: self.node().key.clone(),
            });
        }
        let removed = self.list.remove_at(self.index);
        debug!(kind = %removed.kind, key = %removed.key, "removed");
        Ok(removed)
    }
}

/// A live handle to one collection, remembering where it hangs.
///
/// Derefs to [`Collection`] for the raw primitives. [`ListHandle::add`] is
/// the creating mutator: it fills in the resource id and stamps versioned
/// kinds.
#[derive(Debug)]
pub struct ListHandle<'a> {
    list: &'a mut Collection,
    parent: ResourcePath,
    kind: CollectionKind,
    stamper: Stamper,
}

impl<'a> ListHandle<'a> {
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Path of the collection's owner.
    pub fn parent(&self) -> &ResourcePath {
        &self.parent
    }

    /// Append `node`, rejecting it on collision.
    ///
    /// An absent id is derived from the ownership chain. Versioned kinds are
    /// stamped once the add is known to succeed.
    pub fn add(&mut self, node: Node, uniqueness: Uniqueness) -> StoreResult<&mut Node> {
        let node = self.prepare(node, uniqueness)?;
        Ok(self.list.push_unchecked(node))
    }

    /// As [`ListHandle::add`], consuming the handle so the node borrow
    /// outlives it.
    pub fn into_add(self, node: Node, uniqueness: Uniqueness) -> StoreResult<&'a mut Node> {
        let node = self.prepare(node, uniqueness)?;
        let list = self.list;
        Ok(list.push_unchecked(node))
    }

    fn prepare(&self, mut node: Node, uniqueness: Uniqueness) -> StoreResult<Node> {
        if node.kind != self.kind {
            return Err(StoreError::InvalidPath {
                reason: format!("cannot add {} entry to {}", node.kind, self.kind),
            });
        }
        if self.list.conflict(&node.key, uniqueness).is_some() {
            debug!(kind = %node.kind, key = %node.key, "add rejected, key taken");
            return Err(StoreError::AlreadyExists {
                kind: node.kind,
                key: node.key,
            });
        }
        if node.id.is_none() {
            node.id = Some(self.parent.child(self.kind, node.key.clone()).resource_id()?);
        }
        if self.kind.is_versioned() {
            self.stamper.stamp(&mut node);
        }
        debug!(kind = %node.kind, key = %node.key, parent = %self.parent, "created");
        Ok(node)
    }

    /// Shallow-merge `patch` into the item with `key`.
    pub fn update(&mut self, key: &NodeKey, patch: Map<String, Value>) -> StoreResult<&mut Node> {
        let depth = self.parent.depth();
        let kind = self.kind;
        self.list
            .update(key, patch, &self.stamper)
            .map_err(|e| match e {
                StoreError::Missing { key } => StoreError::NotFound { depth, kind, key },
                other => other,
            })
    }

    /// Lock the item with `key`.
    pub fn lock(&mut self, key: &NodeKey) -> StoreResult<Versioning> {
        let stamper = self.stamper.clone();
        stamp::lock(self.item_mut(key)?, &stamper)
    }

    /// Unlock the item with `key`.
    pub fn unlock(&mut self, key: &NodeKey) -> StoreResult<Versioning> {
        let stamper = self.stamper.clone();
        stamp::unlock(self.item_mut(key)?, &stamper)
    }

    fn item_mut(&mut self, key: &NodeKey) -> StoreResult<&mut Node> {
        let depth = self.parent.depth();
        let kind = self.kind;
        self.list
            .find_mut(key)
            .ok_or_else(|| StoreError::NotFound {
                depth,
                kind,
                key: key.clone(),
            })
    }

    /// Give up the handle, keeping the collection borrow.
    pub fn into_collection(self) -> &'a mut Collection {
        self.list
    }
}

impl Deref for ListHandle<'_> {
    type Target = Collection;

    fn deref(&self) -> &Collection {
        &*self.list
    }
}

impl DerefMut for ListHandle<'_> {
    fn deref_mut(&mut self) -> &mut Collection {
        &mut *self.list
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::stamp::ManualClock;
    use armsim_types::Timestamp;

    fn patch(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    /// One subscription `s1` ("Acme") with group `rg1` holding vault `kv1`
    /// and config store `cfg`.
    fn seeded() -> ResourceStore {
        let mut store = ResourceStore::new();
        store
            .add_subscription(Subscription::new("s1", "Acme"))
            .unwrap();
        let root = ResourcePath::new("s1");
        store
            .create(
                &root,
                Node::new(CollectionKind::ResourceGroups, "rg1"),
                Uniqueness::Primary,
            )
            .unwrap();
        let group = root.resource_group("rg1");
        store
            .create(
                &group,
                Node::new(CollectionKind::KeyVaults, "kv1").with_property("location", "eastus"),
                Uniqueness::Primary,
            )
            .unwrap();
        store
            .create(
                &group,
                Node::new(CollectionKind::AppConfigStores, "cfg"),
                Uniqueness::Primary,
            )
            .unwrap();
        store
    }

    fn vault_path() -> ResourcePath {
        ResourcePath::new("s1")
            .resource_group("rg1")
            .step(CollectionKind::KeyVaults, "kv1")
    }

    fn cfg_path() -> ResourcePath {
        ResourcePath::new("s1")
            .resource_group("rg1")
            .step(CollectionKind::AppConfigStores, "cfg")
    }

    fn kv_key(label: Option<&str>) -> NodeKey {
        NodeKey::compound("color", label)
    }

    // ---- Identifier resolution ----

    #[test]
    fn resolves_by_id_then_display_name() {
        let mut store = ResourceStore::new();
        store
            .add_subscription(Subscription::new("s1", "Acme"))
            .unwrap();
        store
            .add_subscription(Subscription::new("s2", "s1"))
            .unwrap();
        store
            .add_subscription(Subscription::new("s3", "Acme"))
            .unwrap();

        assert_eq!(store.resolve_subscription("s1").unwrap().subscription_id, "s1");
        assert_eq!(store.resolve_subscription("Acme").unwrap().subscription_id, "s1");
        assert_eq!(store.resolve_subscription("s2").unwrap().subscription_id, "s2");
        assert!(matches!(
            store.resolve_subscription("nope"),
            Err(StoreError::SubscriptionNotFound { .. })
        ));
    }

    #[test]
    fn duplicate_subscription_ids_are_rejected() {
        let mut store = ResourceStore::new();
        store
            .add_subscription(Subscription::new("s1", "A"))
            .unwrap();
        let err = store
            .add_subscription(Subscription::new("s1", "B"))
            .unwrap_err();
        assert!(matches!(err, StoreError::SubscriptionExists { .. }));
        assert!(store.remove_subscription("s1"));
        assert!(!store.remove_subscription("s1"));
    }

    // ---- Copy access ----

    #[test]
    fn copy_access_is_independent_of_the_tree() {
        let store = seeded();
        let mut copy = store.get_path_if_exists(&vault_path()).unwrap();
        copy.properties.insert("location".into(), json!("westus"));

        let again = store.get_path_if_exists(&vault_path()).unwrap();
        assert_eq!(again.property_str("location"), Some("eastus"));
    }

    #[test]
    fn copy_access_reports_failing_step() {
        let store = seeded();
        let path = ResourcePath::new("s1")
            .resource_group("rg1")
            .step(CollectionKind::KeyVaults, "missing")
            .step(CollectionKind::Keys, "k1");
        match store.get_path_if_exists(&path).unwrap_err() {
            StoreError::NotFound { depth, kind, key } => {
                assert_eq!(depth, 1);
                assert_eq!(kind, CollectionKind::KeyVaults);
                assert_eq!(key, NodeKey::simple("missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn copy_access_never_creates_collections() {
        let store = seeded();
        let path = vault_path().step(CollectionKind::Keys, "k1");
        assert!(store.get_path_if_exists(&path).unwrap_err().is_not_found());

        let vault = store.get_path_if_exists(&vault_path()).unwrap();
        assert!(vault.collection(CollectionKind::Keys).is_none());
    }

    #[test]
    fn collection_copy_of_absent_list_is_empty() {
        let store = seeded();
        let keys = store
            .collection_if_exists(&vault_path(), CollectionKind::Keys)
            .unwrap();
        assert!(keys.is_empty());
        assert!(store
            .get_path_if_exists(&vault_path())
            .unwrap()
            .children
            .is_empty());
    }

    #[test]
    fn collection_copy_rejects_wrong_parent() {
        let store = seeded();
        let err = store
            .collection_if_exists(&vault_path(), CollectionKind::Blobs)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath { .. }));
    }

    #[test]
    fn unknown_subscription_is_reported() {
        let store = seeded();
        let path = ResourcePath::new("s9").resource_group("rg1");
        assert!(matches!(
            store.get_path_if_exists(&path),
            Err(StoreError::SubscriptionNotFound { .. })
        ));
    }

    #[test]
    fn empty_path_is_invalid_for_node_lookup() {
        let store = seeded();
        assert!(matches!(
            store.get_path_if_exists(&ResourcePath::new("s1")),
            Err(StoreError::InvalidPath { .. })
        ));
    }

    // ---- Reference access ----

    #[test]
    fn reference_access_mutates_in_place() {
        let mut store = seeded();
        store
            .get_or_create_path(&vault_path())
            .unwrap()
            .node_mut()
            .properties
            .insert("sku".into(), json!("premium"));

        let vault = store.get_path_if_exists(&vault_path()).unwrap();
        assert_eq!(vault.property_str("sku"), Some("premium"));
    }

    #[test]
    fn reference_calls_alias_the_same_node() {
        let mut store = seeded();
        store
            .read_reference(&vault_path())
            .unwrap()
            .node_mut()
            .locked = true;
        assert!(store.read_reference(&vault_path()).unwrap().node().locked);
        assert!(store.read_copy(&vault_path()).unwrap().locked);
    }

    #[test]
    fn reference_access_creates_intermediate_collections_even_on_failure() {
        let mut store = seeded();
        let path = vault_path().step(CollectionKind::Keys, "k1");
        let err = store.get_or_create_path(&path).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { depth: 2, .. }));

        let keys = store
            .get_path_if_exists(&vault_path())
            .unwrap()
            .collection(CollectionKind::Keys)
            .cloned();
        assert_eq!(keys, Some(Collection::new()));
    }

    #[test]
    fn reference_access_stops_at_first_missing_item() {
        let mut store = seeded();
        let path = ResourcePath::new("s1")
            .resource_group("rg9")
            .step(CollectionKind::KeyVaults, "kv1");
        let err = store.get_or_create_path(&path).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { depth: 0, .. }));
        let groups = store
            .collection_if_exists(&ResourcePath::new("s1"), CollectionKind::ResourceGroups)
            .unwrap();
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn invalid_nesting_creates_nothing() {
        let mut store = seeded();
        let path = vault_path().step(CollectionKind::Blobs, "b1");
        assert!(matches!(
            store.get_or_create_path(&path),
            Err(StoreError::InvalidPath { .. })
        ));
        assert!(store
            .get_path_if_exists(&vault_path())
            .unwrap()
            .children
            .is_empty());
    }

    #[test]
    fn created_nodes_get_hierarchical_ids() {
        let store = seeded();
        let vault = store.get_path_if_exists(&vault_path()).unwrap();
        assert_eq!(
            vault.id.unwrap().as_str(),
            "/subscriptions/s1/resourceGroups/rg1/providers/Microsoft.KeyVault/vaults/kv1"
        );
    }

    #[test]
    fn create_rejects_wrong_kind_for_handle() {
        let mut store = seeded();
        let mut handle = store
            .get_or_create_collection(&vault_path(), CollectionKind::Keys)
            .unwrap();
        let err = handle
            .add(Node::new(CollectionKind::Blobs, "b"), Uniqueness::Primary)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath { .. }));
        assert!(handle.is_empty());
    }

    #[test]
    fn explicit_ids_are_kept() {
        let mut store = seeded();
        let id = armsim_types::ResourceId::from_string("/custom/id");
        let node = store
            .create(
                &vault_path(),
                Node::new(CollectionKind::Keys, "k1").with_id(id.clone()),
                Uniqueness::Primary,
            )
            .unwrap();
        assert_eq!(node.id.as_ref(), Some(&id));
    }

    // ---- Versioned mutations ----

    #[test]
    fn key_value_lifecycle() {
        let clock = Arc::new(ManualClock::new(Timestamp::from_datetime(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )));
        let mut store = seeded().with_stamper(Stamper::new(clock.clone()));
        let kv_path = cfg_path().step(CollectionKind::KeyValues, kv_key(None));

        let created = store
            .create(
                &cfg_path(),
                Node::new(CollectionKind::KeyValues, kv_key(None)).with_property("value", "red"),
                Uniqueness::Compound,
            )
            .unwrap()
            .version
            .clone()
            .unwrap();

        let updated = store
            .update(&kv_path, patch(json!({"value": "blue"})))
            .unwrap()
            .version
            .clone()
            .unwrap();
        assert_ne!(created.etag, updated.etag);
        assert!(updated.last_modified > created.last_modified);

        let locked = store.lock(&kv_path).unwrap();
        assert!(locked.last_modified > updated.last_modified);

        let err = store
            .update(&kv_path, patch(json!({"value": "green"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::Locked { .. }));
        assert!(matches!(
            store.delete(&kv_path),
            Err(StoreError::Locked { .. })
        ));
        assert!(matches!(
            store.lock(&kv_path),
            Err(StoreError::StateConflict { locked: true, .. })
        ));

        let current = store.get_path_if_exists(&kv_path).unwrap();
        assert_eq!(current.property_str("value"), Some("blue"));
        assert_eq!(current.version, Some(locked));

        store.unlock(&kv_path).unwrap();
        assert!(store.delete(&kv_path).unwrap());
        assert!(!store.delete(&kv_path).unwrap());
    }

    #[test]
    fn labels_address_distinct_items() {
        let mut store = seeded();
        let mut handle = store
            .get_or_create_collection(&cfg_path(), CollectionKind::KeyValues)
            .unwrap();
        handle
            .add(
                Node::new(CollectionKind::KeyValues, kv_key(None)).with_property("value", "a"),
                Uniqueness::Compound,
            )
            .unwrap();
        handle
            .add(
                Node::new(CollectionKind::KeyValues, kv_key(Some(""))).with_property("value", "b"),
                Uniqueness::Compound,
            )
            .unwrap();
        handle.lock(&kv_key(Some(""))).unwrap();
        assert!(!handle.find(&kv_key(None)).unwrap().locked);
        assert!(handle.find(&kv_key(Some(""))).unwrap().locked);

        let err = handle
            .update(&kv_key(Some("prod")), Map::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { depth: 2, .. }));
    }

    #[test]
    fn slot_remove_detaches_node() {
        let mut store = seeded();
        let removed = store
            .get_or_create_path(&vault_path())
            .unwrap()
            .remove()
            .unwrap();
        assert_eq!(removed.name(), "kv1");
        assert!(store.get_path_if_exists(&vault_path()).is_err());
        assert!(store.get_path_if_exists(&cfg_path()).is_ok());
    }

    #[test]
    fn delete_requires_resolvable_owner() {
        let mut store = seeded();
        let path = ResourcePath::new("s1")
            .resource_group("rg9")
            .step(CollectionKind::KeyVaults, "kv1");
        assert!(store.delete(&path).unwrap_err().is_not_found());
    }

    // ---- Locate ----

    #[test]
    fn locate_scans_groups_in_order() {
        let mut store = seeded();
        let root = ResourcePath::new("s1");
        store
            .create(
                &root,
                Node::new(CollectionKind::ResourceGroups, "rg2"),
                Uniqueness::Primary,
            )
            .unwrap();
        store
            .create(
                &root.clone().resource_group("rg2"),
                Node::new(CollectionKind::KeyVaults, "kv2"),
                Uniqueness::Primary,
            )
            .unwrap();

        assert_eq!(
            store.locate("s1", CollectionKind::KeyVaults, "kv1").unwrap(),
            vault_path()
        );
        let found = store.locate("s1", CollectionKind::KeyVaults, "kv2").unwrap();
        assert_eq!(found.steps()[0].key, NodeKey::simple("rg2"));
        assert!(store
            .locate("s1", CollectionKind::KeyVaults, "kv3")
            .unwrap_err()
            .is_not_found());
        assert!(store.locate("s1", CollectionKind::Keys, "k").is_err());
    }

    // ---- End to end ----

    #[test]
    fn scenario_subscription_group_resource() {
        let mut store = ResourceStore::new();
        store
            .add_subscription(Subscription::new("E1", "Acme"))
            .unwrap();

        let sub_id = store.resolve_subscription("Acme").unwrap().subscription_id.clone();
        assert_eq!(sub_id, "E1");

        let root = ResourcePath::new(sub_id.clone());
        let mut groups = store
            .get_or_create_collection(&root, CollectionKind::ResourceGroups)
            .unwrap();
        assert!(groups.is_empty());
        groups
            .add(
                Node::new(CollectionKind::ResourceGroups, "G1"),
                Uniqueness::Primary,
            )
            .unwrap();

        let group = root.resource_group("G1");
        let r1 = store
            .create(
                &group,
                Node::new(CollectionKind::StorageAccounts, "R1"),
                Uniqueness::Primary,
            )
            .unwrap();
        let id = r1.id.clone().unwrap();
        for part in ["E1", "G1", "R1"] {
            assert!(id.as_str().contains(part));
        }

        let r1_path = group.step(CollectionKind::StorageAccounts, "R1");
        assert!(store.delete(&r1_path).unwrap());
        assert!(!store.delete(&r1_path).unwrap());
    }

    #[test]
    fn look_alike_key_values_get_distinct_ids() {
        let mut store = seeded();
        let mut ids = Vec::new();
        for key in [
            NodeKey::compound("a$b", None::<String>),
            NodeKey::compound("a", Some("b")),
            NodeKey::compound("a", Some("")),
            NodeKey::compound("a$", None::<String>),
        ] {
            let created = store
                .create(
                    &cfg_path(),
                    Node::new(CollectionKind::KeyValues, key),
                    Uniqueness::Compound,
                )
                .unwrap();
            ids.push(created.id.clone().unwrap());
        }
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[2], ids[3]);
    }
}
