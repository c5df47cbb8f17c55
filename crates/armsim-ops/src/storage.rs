//! Storage handlers: accounts, blob containers, blobs, and tables.

use armsim_store::{CollectionKind, ResourcePath, StoreError};

use crate::error::{OpError, OpResult};
use crate::models::{ContainerDetails, ResourceSummary};
use crate::simulator::Simulator;
use crate::validation::require;

impl Simulator {
    fn storage_account(&self, subscription: &str, account_name: &str) -> OpResult<ResourcePath> {
        let subscription_id = self.subscription_id(subscription)?;
        require("account name", account_name)?;
        self.find_resource(
            &subscription_id,
            CollectionKind::StorageAccounts,
            account_name,
            "Storage account",
        )
    }

    fn blob_container(
        &self,
        subscription: &str,
        account_name: &str,
        container_name: &str,
    ) -> OpResult<ResourcePath> {
        let account = self.storage_account(subscription, account_name)?;
        require("container name", container_name)?;
        let path = account.child(CollectionKind::BlobContainers, container_name);
        self.store.resolve(&path).map_err(|e| match e {
            StoreError::NotFound { .. } => missing_container(container_name, account_name),
            other => other.into(),
        })?;
        Ok(path)
    }

    pub fn storage_account_list(&self, subscription: &str) -> OpResult<Vec<ResourceSummary>> {
        self.list_group_resources(subscription, CollectionKind::StorageAccounts)
    }

    pub fn blob_container_list(
        &self,
        subscription: &str,
        account_name: &str,
    ) -> OpResult<Vec<ResourceSummary>> {
        let account = self.storage_account(subscription, account_name)?;
        Ok(self.child_summaries(&account, CollectionKind::BlobContainers)?)
    }

    /// One container with lease defaults filled in. A container without a
    /// modification time or etag is a service error.
    pub fn blob_container_details(
        &self,
        subscription: &str,
        account_name: &str,
        container_name: &str,
    ) -> OpResult<ContainerDetails> {
        let path = self.blob_container(subscription, account_name, container_name)?;
        let node = self.store.resolve(&path)?;
        ContainerDetails::from_node(node, account_name)
    }

    pub fn blob_list(
        &self,
        subscription: &str,
        account_name: &str,
        container_name: &str,
    ) -> OpResult<Vec<ResourceSummary>> {
        let container = self.blob_container(subscription, account_name, container_name)?;
        Ok(self.child_summaries(&container, CollectionKind::Blobs)?)
    }

    /// Table names of a storage account.
    pub fn storage_table_list(&self, subscription: &str, account_name: &str) -> OpResult<Vec<String>> {
        let account = self.storage_account(subscription, account_name)?;
        let tables = self
            .store
            .collection_if_exists(&account, CollectionKind::StorageTables)?;
        Ok(tables.iter().map(|table| table.name().to_string()).collect())
    }
}

fn missing_container(container_name: &str, account_name: &str) -> OpError {
    OpError::ResourceNotFound(format!(
        "Container '{container_name}' not found in storage account '{account_name}'"
    ))
}
