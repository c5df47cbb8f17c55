use std::ops::{Index, IndexMut};

use armsim_types::{KeySelector, NodeKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::kind::CollectionKind;
use crate::model::Node;
use crate::stamp::Stamper;

/// Which existing items an add must not collide with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Uniqueness {
    /// Append unconditionally.
    Unchecked,
    /// No other item may share the primary component.
    Primary,
    /// No other item may share both components (a null secondary is a
    /// distinct value).
    Compound,
}

impl Uniqueness {
    /// The rule ordinary creates use for `kind`.
    pub fn for_kind(kind: CollectionKind) -> Self {
        if kind.is_compound() {
            Self::Compound
        } else {
            Self::Primary
        }
    }

    fn collides(self, existing: &NodeKey, candidate: &NodeKey) -> bool {
        match self {
            Self::Unchecked => false,
            Self::Primary => existing.primary == candidate.primary,
            Self::Compound => existing == candidate,
        }
    }
}

/// An ordered list of sibling nodes.
///
/// Insertion order is preserved and is the order lookups scan in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    items: Vec<Node>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(items: Vec<Node>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.items
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.items.get_mut(index)
    }

    /// Index of the first item whose key equals `key` on both components.
    pub fn position(&self, key: &NodeKey) -> Option<usize> {
        self.items.iter().position(|node| &node.key == key)
    }

    pub fn find(&self, key: &NodeKey) -> Option<&Node> {
        self.items.iter().find(|node| &node.key == key)
    }

    pub fn find_mut(&mut self, key: &NodeKey) -> Option<&mut Node> {
        self.items.iter_mut().find(|node| &node.key == key)
    }

    /// First item with the given primary component, whatever its secondary.
    pub fn find_primary(&self, primary: &str) -> Option<&Node> {
        self.items.iter().find(|node| node.key.primary == primary)
    }

    /// The existing item `key` would collide with under `uniqueness`.
    pub fn conflict(&self, key: &NodeKey, uniqueness: Uniqueness) -> Option<&Node> {
        self.items
            .iter()
            .find(|node| uniqueness.collides(&node.key, key))
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Node {
        self.items.remove(index)
    }

    /// Append without any uniqueness check.
    pub fn push_unchecked(&mut self, node: Node) -> &mut Node {
        self.items.push(node);
        let last = self.items.len() - 1;
        &mut self.items[last]
    }

    /// Append `node`, rejecting it if it collides with an existing item.
    ///
    /// On rejection the collection is unchanged.
    pub fn add(&mut self, node: Node, uniqueness: Uniqueness) -> StoreResult<&mut Node> {
        if self.conflict(&node.key, uniqueness).is_some() {
            debug!(kind = %node.kind, key = %node.key, "add rejected, key taken");
            return Err(StoreError::AlreadyExists {
                kind: node.kind,
                key: node.key,
            });
        }
        debug!(kind = %node.kind, key = %node.key, "added");
        Ok(self.push_unchecked(node))
    }

    /// Shallow-merge `patch` into the item with `key`.
    ///
    /// Fails with [`StoreError::Missing`] if no item matches and with
    /// [`StoreError::Locked`] if the item is locked. Versioned items are
    /// stamped on success.
    pub fn update(
        &mut self,
        key: &NodeKey,
        patch: Map<String, Value>,
        stamper: &Stamper,
    ) -> StoreResult<&mut Node> {
        let node = self
            .find_mut(key)
            .ok_or_else(|| StoreError::Missing { key: key.clone() })?;
        apply_patch(node, patch, stamper)?;
        Ok(node)
    }

    /// Remove the first item `selector` selects.
    ///
    /// Returns `Ok(false)` if nothing matched. A locked match is refused
    /// with [`StoreError::Locked`] and left in place.
    pub fn delete(&mut self, selector: &KeySelector) -> StoreResult<bool> {
        let Some(index) = self
            .items
            .iter()
            .position(|node| selector.selects(&node.key))
        else {
            debug!(%selector, "delete matched nothing");
            return Ok(false);
        };
        let target = &self.items[index];
        if target.locked {
            warn!(key = %target.key, "delete refused, item is locked");
            return Err(StoreError::Locked {
                key: target.key.clone(),
            });
        }
        let removed = self.items.remove(index);
        debug!(kind = %removed.kind, key = %removed.key, "deleted");
        Ok(true)
    }
}

/// Merge `patch` into `node`'s properties and stamp it if versioned.
///
/// Keys in `patch` overwrite existing properties; properties absent from
/// `patch` are kept. The node's key, id, and children are never touched.
pub fn apply_patch(node: &mut Node, patch: Map<String, Value>, stamper: &Stamper) -> StoreResult<()> {
    if node.locked {
        warn!(key = %node.key, "update refused, item is locked");
        return Err(StoreError::Locked {
            key: node.key.clone(),
        });
    }
    node.properties.extend(patch);
    if node.kind.is_versioned() {
        stamper.stamp(node);
    }
    debug!(kind = %node.kind, key = %node.key, "updated");
    Ok(())
}

impl Index<usize> for Collection {
    type Output = Node;

    fn index(&self, index: usize) -> &Node {
        &self.items[index]
    }
}

impl IndexMut<usize> for Collection {
    fn index_mut(&mut self, index: usize) -> &mut Node {
        &mut self.items[index]
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Node> for Collection {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
