//! Result shapes returned by operation handlers.

use armsim_store::{CollectionKind, CollectionOwner, Node, Subscription};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OpError, OpResult};

/// A subscription as listed to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubscriptionSummary {
    pub subscription_id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub resource_groups: usize,
}

impl From<&Subscription> for SubscriptionSummary {
    fn from(sub: &Subscription) -> Self {
        Self {
            subscription_id: sub.subscription_id.clone(),
            display_name: sub.display_name.clone(),
            tenant_id: sub.tenant_id.clone(),
            state: sub.state.clone(),
            resource_groups: sub
                .collection(CollectionKind::ResourceGroups)
                .map_or(0, |groups| groups.len()),
        }
    }
}

/// A group-level or nested resource as listed to callers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceSummary {
    pub kind: CollectionKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl ResourceSummary {
    pub(crate) fn from_node(node: &Node, resource_group: Option<&str>) -> Self {
        Self {
            kind: node.kind,
            name: node.key.to_string(),
            id: node.id.as_ref().map(|id| id.to_string()),
            resource_group: resource_group.map(str::to_string),
            properties: node.properties.clone(),
        }
    }
}

/// An App Configuration store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigStoreSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub resource_group: String,
}

impl ConfigStoreSummary {
    pub(crate) fn from_node(node: &Node, resource_group: &str) -> Self {
        Self {
            name: node.name().to_string(),
            id: node.id.as_ref().map(|id| id.to_string()),
            location: node.property_str("location").map(str::to_string),
            resource_group: resource_group.to_string(),
        }
    }
}

/// An App Configuration key-value setting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyValueItem {
    pub key: String,
    pub label: Option<String>,
    pub value: Option<String>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub locked: bool,
}

impl KeyValueItem {
    pub(crate) fn from_node(node: &Node) -> Self {
        Self {
            key: node.key.primary.clone(),
            label: node.key.secondary.clone(),
            value: node.property_str("value").map(str::to_string),
            content_type: node.property_str("content_type").map(str::to_string),
            etag: node.version.as_ref().map(|v| v.etag.to_string()),
            last_modified: node.version.as_ref().map(|v| v.last_modified.to_rfc3339()),
            locked: node.locked,
        }
    }
}

/// A blob container with its lease and retention state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDetails {
    #[serde(default)]
    pub name: String,
    pub last_modified: String,
    pub etag: String,
    #[serde(default = "lease_unlocked")]
    pub lease_status: String,
    #[serde(default = "lease_available")]
    pub lease_state: String,
    #[serde(default)]
    pub public_access: Option<String>,
    #[serde(default)]
    pub has_immutability_policy: bool,
    #[serde(default)]
    pub has_legal_hold: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn lease_unlocked() -> String {
    "unlocked".into()
}

fn lease_available() -> String {
    "available".into()
}

impl ContainerDetails {
    pub(crate) fn from_node(node: &Node, account_name: &str) -> OpResult<Self> {
        let mut details: Self = serde_json::from_value(Value::Object(node.properties.clone()))
            .map_err(|e| {
                OpError::Service(format!(
                    "container '{}' in storage account '{account_name}' is incomplete: {e}",
                    node.name()
                ))
            })?;
        details.name = node.name().to_string();
        Ok(details)
    }
}

/// Key Vault key attributes. Times are Unix seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAttributes {
    pub enabled: bool,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    pub created: i64,
    pub updated: i64,
    #[serde(rename = "recoveryLevel", default, skip_serializing_if = "Option::is_none")]
    pub recovery_level: Option<String>,
}

impl KeyAttributes {
    /// Attributes of a freshly created, enabled key.
    pub fn created_at(unix_seconds: i64) -> Self {
        Self {
            enabled: true,
            exp: None,
            nbf: None,
            created: unix_seconds,
            updated: unix_seconds,
            recovery_level: Some("Recoverable".into()),
        }
    }
}

/// A Key Vault key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDetails {
    pub name: String,
    pub kid: String,
    pub kty: String,
    pub key_ops: Vec<String>,
    pub attributes: KeyAttributes,
    #[serde(default)]
    pub tags: Option<Map<String, Value>>,
}

impl KeyDetails {
    /// The stored property map for this key.
    pub(crate) fn to_properties(&self) -> OpResult<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(OpError::Service("key did not serialize to an object".into())),
            Err(e) => Err(OpError::Service(e.to_string())),
        }
    }

    pub(crate) fn from_node(node: &Node) -> OpResult<Self> {
        serde_json::from_value(Value::Object(node.properties.clone())).map_err(|e| {
            OpError::Service(format!("key {} is malformed: {e}", node.name()))
        })
    }
}

/// A key as listed to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyListItem {
    pub name: String,
    pub kid: String,
    pub attributes: KeyAttributes,
    pub tags: Option<Map<String, Value>>,
}

impl From<KeyDetails> for KeyListItem {
    fn from(details: KeyDetails) -> Self {
        Self {
            name: details.name,
            kid: details.kid,
            attributes: details.attributes,
            tags: details.tags,
        }
    }
}
