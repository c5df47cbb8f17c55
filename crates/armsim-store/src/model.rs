use std::collections::BTreeMap;

use armsim_types::{ETag, NodeKey, ResourceId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collection::Collection;
use crate::kind::CollectionKind;

/// Optimistic-concurrency metadata carried by versioned nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioning {
    /// Regenerated on every successful mutation.
    pub etag: ETag,
    /// Instant of the last successful mutation.
    pub last_modified: Timestamp,
}

/// A group, resource, or sub-resource in the entity tree.
///
/// Parents own their children by value. Domain attributes live in
/// `properties`; the store only interprets the key, id, lock flag, and
/// versioning metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// The collection kind this node belongs to.
    pub kind: CollectionKind,
    /// Identity within the owning collection.
    pub key: NodeKey,
    /// Hierarchical id, fixed at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    /// Lock flag. Only meaningful for lockable kinds.
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
    /// Version token and modification time. Present on versioned kinds once
    /// they have been created or mutated through the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Versioning>,
    /// Domain attributes.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    /// Nested collections. A missing entry is an empty collection.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<CollectionKind, Collection>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Node {
    /// Create a bare node of the given kind.
    pub fn new(kind: CollectionKind, key: impl Into<NodeKey>) -> Self {
        Self {
            kind,
            key: key.into(),
            id: None,
            locked: false,
            version: None,
            properties: Map::new(),
            children: BTreeMap::new(),
        }
    }

    /// Set a single property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Replace all properties.
    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    /// Set the lock flag.
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Attach an explicit id (e.g. one loaded from elsewhere).
    pub fn with_id(mut self, id: ResourceId) -> Self {
        self.id = Some(id);
        self
    }

    /// The primary key component.
    pub fn name(&self) -> &str {
        &self.key.primary
    }

    /// A property value.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// A property value, if it is a string.
    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    /// The current version token, if any.
    pub fn etag(&self) -> Option<&ETag> {
        self.version.as_ref().map(|v| &v.etag)
    }

    /// Returns `true` if the node is locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

/// The top-level entity of the tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Stable, globally unique identifier.
    pub subscription_id: String,
    /// Human-readable name. Not guaranteed unique.
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    /// Resource groups. `None` until first populated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_groups: Option<Collection>,
}

impl Subscription {
    /// Create a subscription with no resource groups collection.
    pub fn new(subscription_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            display_name: display_name.into(),
            tenant_id: None,
            state: None,
            properties: Map::new(),
            resource_groups: None,
        }
    }

    /// Set the tenant id.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the subscription state (e.g. `"Enabled"`).
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builder_sets_properties() {
        let node = Node::new(CollectionKind::KeyVaults, "kv1")
            .with_property("location", "eastus")
            .with_property("sku", json!({"name": "standard"}));
        assert_eq!(node.name(), "kv1");
        assert_eq!(node.property_str("location"), Some("eastus"));
        assert_eq!(node.property("sku"), Some(&json!({"name": "standard"})));
        assert!(node.property_str("sku").is_none());
    }

    #[test]
    fn minimal_node_serializes_compactly() {
        let node = Node::new(CollectionKind::ResourceGroups, "rg1");
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({"kind": "resource_groups", "key": {"primary": "rg1", "secondary": null}})
        );
    }

    #[test]
    fn node_json_roundtrip_with_children() {
        let mut store = Node::new(CollectionKind::AppConfigStores, "cfg");
        let kv = Node::new(
            CollectionKind::KeyValues,
            NodeKey::compound("color", Some("prod")),
        )
        .with_locked(true)
        .with_property("value", "blue");
        store
            .children
            .entry(CollectionKind::KeyValues)
            .or_default()
            .push_unchecked(kv);

        let json = serde_json::to_string(&store).unwrap();
        let parsed: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, store);
        assert!(json.contains("\"key_values\""));
    }

    #[test]
    fn subscription_without_groups_omits_the_field() {
        let sub = Subscription::new("s1", "Acme").with_state("Enabled");
        let value = serde_json::to_value(&sub).unwrap();
        assert!(value.get("resource_groups").is_none());
        assert_eq!(value["state"], "Enabled");
    }
}
