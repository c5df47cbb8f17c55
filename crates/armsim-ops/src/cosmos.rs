//! Cosmos DB handlers: accounts, databases, and containers.

use armsim_store::{CollectionKind, Node, ResourcePath, StoreError, Uniqueness};
use tracing::info;

use crate::error::{OpError, OpResult};
use crate::models::ResourceSummary;
use crate::simulator::Simulator;
use crate::validation::require;

const DEFAULT_ACCOUNT_KIND: &str = "GlobalDocumentDB";

impl Simulator {
    fn cosmos_account(&self, subscription: &str, account_name: &str) -> OpResult<ResourcePath> {
        let subscription_id = self.subscription_id(subscription)?;
        require("account name", account_name)?;
        self.find_resource(
            &subscription_id,
            CollectionKind::CosmosDbAccounts,
            account_name,
            "Cosmos DB account",
        )
    }

    pub fn cosmos_account_list(&self, subscription: &str) -> OpResult<Vec<ResourceSummary>> {
        self.list_group_resources(subscription, CollectionKind::CosmosDbAccounts)
    }

    /// Create an account in an existing resource group. Names are unique
    /// per group; `kind` defaults to `GlobalDocumentDB`.
    pub fn cosmos_account_create(
        &mut self,
        subscription: &str,
        resource_group: &str,
        account_name: &str,
        location: &str,
        kind: Option<&str>,
    ) -> OpResult<ResourceSummary> {
        let subscription_id = self.subscription_id(subscription)?;
        require("resource group", resource_group)?;
        require("account name", account_name)?;
        require("location", location)?;

        let group = ResourcePath::new(subscription_id.as_str()).resource_group(resource_group);
        self.store.resolve(&group).map_err(|e| match e {
            StoreError::NotFound { .. } => OpError::ResourceNotFound(format!(
                "Resource group '{resource_group}' not found in subscription '{subscription_id}'"
            )),
            other => other.into(),
        })?;

        let node = Node::new(CollectionKind::CosmosDbAccounts, account_name)
            .with_property("location", location)
            .with_property("kind", kind.unwrap_or(DEFAULT_ACCOUNT_KIND))
            .with_property("provisioning_state", "Succeeded");
        let created = self
            .store
            .create(&group, node, Uniqueness::Primary)
            .map_err(|e| match e {
                StoreError::AlreadyExists { .. } => OpError::Conflict(format!(
                    "Cosmos DB account '{account_name}' already exists in resource group '{resource_group}'"
                )),
                other => other.into(),
            })?;
        info!(subscription_id, resource_group, account_name, "cosmos account created");
        Ok(ResourceSummary::from_node(created, Some(resource_group)))
    }

    pub fn cosmos_database_list(
        &self,
        subscription: &str,
        account_name: &str,
    ) -> OpResult<Vec<ResourceSummary>> {
        let account = self.cosmos_account(subscription, account_name)?;
        Ok(self.child_summaries(&account, CollectionKind::Databases)?)
    }

    pub fn cosmos_container_list(
        &self,
        subscription: &str,
        account_name: &str,
        database_name: &str,
    ) -> OpResult<Vec<ResourceSummary>> {
        let account = self.cosmos_account(subscription, account_name)?;
        require("database name", database_name)?;
        let database = account.child(CollectionKind::Databases, database_name);
        self.child_summaries(&database, CollectionKind::Containers)
            .map_err(|e| match e {
                StoreError::NotFound { .. } => OpError::ResourceNotFound(format!(
                    "Database '{database_name}' not found in Cosmos DB account '{account_name}'"
                )),
                other => other.into(),
            })
    }
}
