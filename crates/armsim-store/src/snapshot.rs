//! JSON snapshots of the entity tree.
//!
//! On-disk format mirrors the tree one-for-one:
//! ```text
//! { "subscriptions": [ { "subscription_id": ..., "resource_groups": [
//!     { "kind": "resource_groups", "key": {...}, "children": { "key_vaults": [...] } } ] } ] }
//! ```

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collection::Collection;
use crate::error::{StoreError, StoreResult};
use crate::kind::CollectionKind;
use crate::model::Subscription;
use crate::store::ResourceStore;

/// Serialized form of a [`ResourceStore`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

impl Snapshot {
    /// Check the tree's structural rules: unique subscription ids, nodes
    /// filed under the collection of their own kind, collections only under
    /// owners the schema allows, and no exact key repeated in a collection.
    pub fn validate(&self) -> StoreResult<()> {
        for (position, subscription) in self.subscriptions.iter().enumerate() {
            let duplicate = self.subscriptions[..position]
                .iter()
                .any(|earlier| earlier.subscription_id == subscription.subscription_id);
            if duplicate {
                return Err(corrupt(format!(
                    "subscription {} appears twice",
                    subscription.subscription_id
                )));
            }
            if let Some(groups) = &subscription.resource_groups {
                validate_collection(
                    groups,
                    CollectionKind::ResourceGroups,
                    &subscription.subscription_id,
                )?;
            }
        }
        Ok(())
    }
}

fn validate_collection(list: &Collection, kind: CollectionKind, owner: &str) -> StoreResult<()> {
    for (position, node) in list.iter().enumerate() {
        let here = format!("{owner}/{kind}/{}", node.key);
        if node.kind != kind {
            return Err(corrupt(format!("{here} is a {} entry", node.kind)));
        }
        if list.as_slice()[..position]
            .iter()
            .any(|earlier| earlier.key == node.key)
        {
            return Err(corrupt(format!("{here} appears twice")));
        }
        for (child_kind, children) in &node.children {
            if child_kind.parent() != Some(kind) {
                return Err(corrupt(format!("{here} cannot hold {child_kind}")));
            }
            validate_collection(children, *child_kind, &here)?;
        }
    }
    Ok(())
}

fn corrupt(reason: String) -> StoreError {
    StoreError::CorruptSnapshot { reason }
}

impl ResourceStore {
    /// Build a store from a validated snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> StoreResult<Self> {
        snapshot.validate()?;
        Ok(Self::from_subscriptions(snapshot.subscriptions))
    }

    /// Clone the tree into a snapshot.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            subscriptions: self.subscriptions().to_vec(),
        }
    }

    /// Consume the store into a snapshot without cloning.
    pub fn into_snapshot(self) -> Snapshot {
        Snapshot {
            subscriptions: self.into_subscriptions(),
        }
    }

    pub fn from_json(json: &str) -> StoreResult<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(&self.to_snapshot())
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Load a snapshot file. A missing file is an I/O error.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = fs::read_to_string(path)?;
        let store = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            subscriptions = store.subscriptions().len(),
            "snapshot loaded"
        );
        Ok(store)
    }

    /// Write a snapshot file, replacing any existing one atomically.
    ///
    /// The document is written to a temporary file in the target directory
    /// and renamed into place, so readers never observe a partial file.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &self.to_snapshot())
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| StoreError::Io(e.error))?;

        info!(
            path = %path.display(),
            subscriptions = self.subscriptions().len(),
            "snapshot saved"
        );
        Ok(())
    }
}
