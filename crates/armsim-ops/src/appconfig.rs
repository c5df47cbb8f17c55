//! App Configuration handlers: stores and their key-value settings.

use armsim_store::{
    filter_key_values, CollectionKind, CollectionOwner, Node, ResourcePath, StoreError, Uniqueness,
};
use armsim_types::NodeKey;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{OpError, OpResult};
use crate::models::{ConfigStoreSummary, KeyValueItem};
use crate::simulator::Simulator;
use crate::validation::{label_display, require};

impl Simulator {
    /// Every App Configuration store in the subscription, in group order.
    pub fn list_stores(&self, subscription: &str) -> OpResult<Vec<ConfigStoreSummary>> {
        let subscription_id = self.subscription_id(subscription)?;
        let groups = self.store.collection_if_exists(
            &ResourcePath::new(subscription_id),
            CollectionKind::ResourceGroups,
        )?;
        Ok(groups
            .iter()
            .flat_map(|group| {
                group
                    .collection(CollectionKind::AppConfigStores)
                    .into_iter()
                    .flatten()
                    .map(move |store| ConfigStoreSummary::from_node(store, group.name()))
            })
            .collect())
    }

    fn config_store(&self, subscription: &str, account_name: &str) -> OpResult<ResourcePath> {
        let subscription_id = self.subscription_id(subscription)?;
        require("account name", account_name)?;
        self.find_resource(
            &subscription_id,
            CollectionKind::AppConfigStores,
            account_name,
            "App Configuration store",
        )
    }

    /// Settings matching the key and label filters (see
    /// [`filter_key_values`]).
    pub fn kv_list(
        &self,
        subscription: &str,
        account_name: &str,
        key_filter: Option<&str>,
        label_filter: Option<&str>,
    ) -> OpResult<Vec<KeyValueItem>> {
        let store_path = self.config_store(subscription, account_name)?;
        let settings = self
            .store
            .collection_if_exists(&store_path, CollectionKind::KeyValues)?;
        Ok(filter_key_values(&settings, key_filter, label_filter)
            .iter()
            .map(KeyValueItem::from_node)
            .collect())
    }

    /// One setting by key and label. `None` is the null label.
    pub fn kv_show(
        &self,
        subscription: &str,
        account_name: &str,
        key: &str,
        label: Option<&str>,
    ) -> OpResult<KeyValueItem> {
        let store_path = self.config_store(subscription, account_name)?;
        require("key", key)?;
        let path = store_path.child(CollectionKind::KeyValues, NodeKey::compound(key, label));
        let node = self.store.get_path_if_exists(&path).map_err(|e| match e {
            StoreError::NotFound { .. } => missing_setting(key, label, account_name),
            other => other.into(),
        })?;
        Ok(KeyValueItem::from_node(&node))
    }

    /// Create or update a setting. Locked settings are refused.
    pub fn kv_set(
        &mut self,
        subscription: &str,
        account_name: &str,
        key: &str,
        value: &str,
        label: Option<&str>,
        content_type: Option<&str>,
    ) -> OpResult<KeyValueItem> {
        let store_path = self.config_store(subscription, account_name)?;
        require("key", key)?;
        let node_key = NodeKey::compound(key, label);

        let mut patch = Map::new();
        patch.insert("value".into(), Value::from(value));
        if let Some(content_type) = content_type {
            patch.insert("content_type".into(), Value::from(content_type));
        }

        let mut settings = self
            .store
            .get_or_create_collection(&store_path, CollectionKind::KeyValues)?;
        let node = if settings.find(&node_key).is_some() {
            settings.update(&node_key, patch).map_err(|e| match e {
                StoreError::Locked { .. } => OpError::Conflict(format!(
                    "key-value '{key}' with label {} is locked and cannot be modified",
                    label_display(label)
                )),
                other => other.into(),
            })?
        } else {
            settings.add(
                Node::new(CollectionKind::KeyValues, node_key).with_properties(patch),
                Uniqueness::Compound,
            )?
        };
        info!(account = account_name, key, label, "key-value set");
        Ok(KeyValueItem::from_node(node))
    }

    /// Delete a setting by exact key and label.
    pub fn kv_delete(
        &mut self,
        subscription: &str,
        account_name: &str,
        key: &str,
        label: Option<&str>,
    ) -> OpResult<()> {
        let store_path = self.config_store(subscription, account_name)?;
        require("key", key)?;
        let path = store_path.child(CollectionKind::KeyValues, NodeKey::compound(key, label));
        match self.store.delete(&path) {
            Ok(true) => {
                info!(account = account_name, key, label, "key-value deleted");
                Ok(())
            }
            Ok(false) => Err(missing_setting(key, label, account_name)),
            Err(StoreError::Locked { .. }) => Err(OpError::Conflict(format!(
                "key-value '{key}' with label {} is locked and cannot be deleted",
                label_display(label)
            ))),
            Err(other) => Err(other.into()),
        }
    }

    /// Lock a setting. Locking a locked setting is a conflict.
    pub fn kv_lock(
        &mut self,
        subscription: &str,
        account_name: &str,
        key: &str,
        label: Option<&str>,
    ) -> OpResult<KeyValueItem> {
        self.set_lock(subscription, account_name, key, label, true)
    }

    /// Unlock a setting. Unlocking an unlocked setting is a conflict.
    pub fn kv_unlock(
        &mut self,
        subscription: &str,
        account_name: &str,
        key: &str,
        label: Option<&str>,
    ) -> OpResult<KeyValueItem> {
        self.set_lock(subscription, account_name, key, label, false)
    }

    fn set_lock(
        &mut self,
        subscription: &str,
        account_name: &str,
        key: &str,
        label: Option<&str>,
        locked: bool,
    ) -> OpResult<KeyValueItem> {
        let store_path = self.config_store(subscription, account_name)?;
        require("key", key)?;
        let path = store_path.child(CollectionKind::KeyValues, NodeKey::compound(key, label));

        let mut slot = self.store.get_or_create_path(&path).map_err(|e| match e {
            StoreError::NotFound { .. } => missing_setting(key, label, account_name),
            other => other.into(),
        })?;
        let outcome = if locked { slot.lock() } else { slot.unlock() };
        outcome.map_err(|e| match e {
            StoreError::StateConflict { locked, .. } => OpError::Conflict(format!(
                "key-value '{key}' with label {} is already {}",
                label_display(label),
                if locked { "locked" } else { "unlocked" }
            )),
            other => other.into(),
        })?;
        info!(account = account_name, key, label, locked, "key-value lock changed");
        Ok(KeyValueItem::from_node(slot.node()))
    }
}

fn missing_setting(key: &str, label: Option<&str>, account_name: &str) -> OpError {
    OpError::ResourceNotFound(format!(
        "key-value '{key}' with label {} not found in App Configuration store '{account_name}'",
        label_display(label)
    ))
}

#[cfg(test)]
mod tests {
    use armsim_types::Timestamp;

    use super::*;
    use crate::simulator::fixture::simulator;

    #[test]
    fn list_stores_reports_group_and_location() {
        let sim = simulator();
        let stores = sim.list_stores("Acme").unwrap();
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].name, "cfg");
        assert_eq!(stores[0].resource_group, "rg1");
        assert_eq!(stores[0].location.as_deref(), Some("eastus"));
        assert!(stores[0]
            .id
            .as_deref()
            .unwrap()
            .ends_with("/configurationStores/cfg"));
    }

    #[test]
    fn set_creates_then_updates() {
        let mut sim = simulator();
        let created = sim
            .kv_set("Acme", "cfg", "color", "red", None, Some("text/plain"))
            .unwrap();
        assert_eq!(created.value.as_deref(), Some("red"));
        assert!(!created.locked);
        let first_etag = created.etag.clone().unwrap();

        let updated = sim
            .kv_set("sub-1", "cfg", "color", "blue", None, None)
            .unwrap();
        assert_eq!(updated.value.as_deref(), Some("blue"));
        assert_eq!(updated.content_type.as_deref(), Some("text/plain"));
        assert_ne!(updated.etag.unwrap(), first_etag);
        assert!(updated.last_modified.unwrap() > created.last_modified.unwrap());
        assert_eq!(sim.kv_list("Acme", "cfg", None, None).unwrap().len(), 1);
    }

    #[test]
    fn last_modified_uses_store_clock_format() {
        let mut sim = simulator();
        let item = sim
            .kv_set("Acme", "cfg", "color", "red", None, None)
            .unwrap();
        let rendered = item.last_modified.unwrap();
        assert_eq!(rendered, "2023-11-14T22:13:20.000000Z");
        assert!(Timestamp::parse(&rendered).is_ok());
    }

    #[test]
    fn labels_are_separate_settings() {
        let mut sim = simulator();
        sim.kv_set("Acme", "cfg", "color", "a", None, None).unwrap();
        sim.kv_set("Acme", "cfg", "color", "b", Some(""), None).unwrap();
        sim.kv_set("Acme", "cfg", "color", "c", Some("prod"), None)
            .unwrap();

        assert_eq!(
            sim.kv_show("Acme", "cfg", "color", Some("")).unwrap().value.as_deref(),
            Some("b")
        );
        assert_eq!(
            sim.kv_show("Acme", "cfg", "color", None).unwrap().value.as_deref(),
            Some("a")
        );
        let null_only = sim.kv_list("Acme", "cfg", None, Some("\\0")).unwrap();
        assert_eq!(null_only.len(), 1);
        assert_eq!(null_only[0].value.as_deref(), Some("a"));
    }

    #[test]
    fn show_missing_setting_is_not_found() {
        let sim = simulator();
        let err = sim.kv_show("Acme", "cfg", "color", None).unwrap_err();
        assert!(matches!(err, OpError::ResourceNotFound(msg) if msg.contains("(no label)")));
    }

    #[test]
    fn unknown_store_and_subscription() {
        let mut sim = simulator();
        assert!(matches!(
            sim.kv_set("Acme", "nope", "k", "v", None, None),
            Err(OpError::ResourceNotFound(msg)) if msg.contains("App Configuration store 'nope'")
        ));
        assert!(matches!(
            sim.kv_list("Nobody", "cfg", None, None),
            Err(OpError::SubscriptionNotFound(_))
        ));
        assert!(matches!(
            sim.kv_set("Acme", "", "k", "v", None, None),
            Err(OpError::InvalidInput(_))
        ));
        assert!(matches!(
            sim.kv_set("Acme", "cfg", "", "v", None, None),
            Err(OpError::InvalidInput(_))
        ));
    }

    #[test]
    fn lock_gates_set_and_delete() {
        let mut sim = simulator();
        sim.kv_set("Acme", "cfg", "color", "red", None, None).unwrap();
        let locked = sim.kv_lock("Acme", "cfg", "color", None).unwrap();
        assert!(locked.locked);

        assert!(matches!(
            sim.kv_set("Acme", "cfg", "color", "blue", None, None),
            Err(OpError::Conflict(_))
        ));
        assert!(matches!(
            sim.kv_delete("Acme", "cfg", "color", None),
            Err(OpError::Conflict(_))
        ));
        assert!(matches!(
            sim.kv_lock("Acme", "cfg", "color", None),
            Err(OpError::Conflict(msg)) if msg.contains("already locked")
        ));
        let shown = sim.kv_show("Acme", "cfg", "color", None).unwrap();
        assert_eq!(shown.value.as_deref(), Some("red"));
        assert_eq!(shown.etag, locked.etag);

        let unlocked = sim.kv_unlock("Acme", "cfg", "color", None).unwrap();
        assert!(!unlocked.locked);
        assert_ne!(unlocked.etag, locked.etag);
        assert!(matches!(
            sim.kv_unlock("Acme", "cfg", "color", None),
            Err(OpError::Conflict(msg)) if msg.contains("already unlocked")
        ));
        sim.kv_delete("Acme", "cfg", "color", None).unwrap();
    }

    #[test]
    fn lock_missing_setting_is_not_found() {
        let mut sim = simulator();
        assert!(matches!(
            sim.kv_lock("Acme", "cfg", "color", Some("prod")),
            Err(OpError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn delete_matches_label_exactly() {
        let mut sim = simulator();
        sim.kv_set("Acme", "cfg", "color", "a", Some("prod"), None)
            .unwrap();
        assert!(matches!(
            sim.kv_delete("Acme", "cfg", "color", None),
            Err(OpError::ResourceNotFound(_))
        ));
        sim.kv_delete("Acme", "cfg", "color", Some("prod")).unwrap();
        assert!(sim.kv_list("Acme", "cfg", None, None).unwrap().is_empty());
    }
}
