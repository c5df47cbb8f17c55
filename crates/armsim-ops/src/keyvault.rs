//! Key Vault key handlers.

use std::fmt;
use std::str::FromStr;

use armsim_store::{CollectionKind, Node, ResourcePath, StoreError, Uniqueness};
use armsim_types::NodeKey;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{OpError, OpResult};
use crate::models::{KeyAttributes, KeyDetails, KeyListItem};
use crate::simulator::Simulator;
use crate::validation::require;

/// Supported key types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyType {
    Rsa,
    Ec,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Ec => "EC",
        }
    }

    /// Operations permitted on a new key of this type.
    pub fn key_ops(&self) -> &'static [&'static str] {
        match self {
            Self::Rsa => &["encrypt", "decrypt", "sign", "verify", "wrapKey", "unwrapKey"],
            Self::Ec => &["sign", "verify"],
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RSA" => Ok(Self::Rsa),
            "EC" => Ok(Self::Ec),
            _ => Err(OpError::InvalidInput(format!(
                "invalid key type '{s}', expected RSA or EC"
            ))),
        }
    }
}

impl Simulator {
    fn vault(&self, subscription: &str, vault_name: &str) -> OpResult<ResourcePath> {
        let subscription_id = self.subscription_id(subscription)?;
        require("vault name", vault_name)?;
        self.find_resource(
            &subscription_id,
            CollectionKind::KeyVaults,
            vault_name,
            "Key Vault",
        )
    }

    /// Create a key. Names are unique per vault.
    pub fn key_create(
        &mut self,
        subscription: &str,
        vault_name: &str,
        key_name: &str,
        key_type: KeyType,
    ) -> OpResult<KeyDetails> {
        let vault_path = self.vault(subscription, vault_name)?;
        require("key name", key_name)?;

        let created = self.store.stamper().now().as_datetime().timestamp();
        let details = KeyDetails {
            name: key_name.to_string(),
            kid: format!(
                "https://{vault_name}.vault.azure.net/keys/{key_name}/{}",
                Uuid::now_v7().simple()
            ),
            kty: key_type.as_str().to_string(),
            key_ops: key_type.key_ops().iter().map(|op| op.to_string()).collect(),
            attributes: KeyAttributes::created_at(created),
            tags: None,
        };
        let node = Node::new(CollectionKind::Keys, key_name).with_properties(details.to_properties()?);
        self.store
            .create(&vault_path, node, Uniqueness::Primary)
            .map_err(|e| match e {
                StoreError::AlreadyExists { .. } => OpError::Conflict(format!(
                    "key '{key_name}' already exists in vault '{vault_name}'"
                )),
                other => other.into(),
            })?;
        info!(vault = vault_name, key = key_name, kty = %key_type, "key created");
        Ok(details)
    }

    pub fn key_get(
        &self,
        subscription: &str,
        vault_name: &str,
        key_name: &str,
    ) -> OpResult<KeyDetails> {
        let vault_path = self.vault(subscription, vault_name)?;
        require("key name", key_name)?;
        let path = vault_path.child(CollectionKind::Keys, NodeKey::simple(key_name));
        let node = self.store.get_path_if_exists(&path).map_err(|e| match e {
            StoreError::NotFound { .. } => OpError::ResourceNotFound(format!(
                "key '{key_name}' not found in vault '{vault_name}'"
            )),
            other => other.into(),
        })?;
        KeyDetails::from_node(&node)
    }

    /// Every key in a vault. Malformed entries are skipped.
    pub fn key_list(&self, subscription: &str, vault_name: &str) -> OpResult<Vec<KeyListItem>> {
        let vault_path = self.vault(subscription, vault_name)?;
        let keys = self
            .store
            .collection_if_exists(&vault_path, CollectionKind::Keys)?;
        Ok(keys
            .iter()
            .filter_map(|node| match KeyDetails::from_node(node) {
                Ok(details) => Some(KeyListItem::from(details)),
                Err(e) => {
                    warn!(vault = vault_name, error = %e, "skipping malformed key");
                    None
                }
            })
            .collect())
    }
}
