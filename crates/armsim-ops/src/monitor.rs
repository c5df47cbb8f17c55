//! Log Analytics handlers: workspaces and their tables.

use armsim_store::{CollectionKind, CollectionOwner, Node, ResourcePath, StoreError};
use serde_json::Value;

use crate::error::{OpError, OpResult};
use crate::models::ResourceSummary;
use crate::simulator::Simulator;
use crate::validation::require;

/// Table type selecting every custom log table (`*_CL`).
pub const CUSTOM_LOG: &str = "CustomLog";

impl Simulator {
    pub fn workspace_list(&self, subscription: &str) -> OpResult<Vec<ResourceSummary>> {
        self.list_group_resources(subscription, CollectionKind::LogAnalyticsWorkspaces)
    }

    /// Tables of a workspace in `resource_group`, matched by name, resource
    /// id, or customer id.
    ///
    /// `CustomLog` keeps tables whose names end in `_CL`; any other table
    /// type keeps the table of that exact name.
    pub fn workspace_table_list(
        &self,
        subscription: &str,
        resource_group: &str,
        workspace: &str,
        table_type: Option<&str>,
    ) -> OpResult<Vec<ResourceSummary>> {
        let subscription_id = self.subscription_id(subscription)?;
        require("resource group", resource_group)?;
        require("workspace", workspace)?;
        let group_path = ResourcePath::new(subscription_id.as_str()).resource_group(resource_group);
        let group = self.store.resolve(&group_path).map_err(|e| match e {
            StoreError::NotFound { .. } => OpError::ResourceNotFound(format!(
                "Resource group '{resource_group}' not found in subscription '{subscription_id}'"
            )),
            other => other.into(),
        })?;
        let found = group
            .collection(CollectionKind::LogAnalyticsWorkspaces)
            .into_iter()
            .flatten()
            .find(|node| matches_workspace(node, workspace))
            .ok_or_else(|| {
                OpError::ResourceNotFound(format!(
                    "Log Analytics workspace '{workspace}' not found in resource group '{resource_group}'"
                ))
            })?;
        let path = group_path.child(CollectionKind::LogAnalyticsWorkspaces, found.key.clone());
        let tables = self.child_summaries(&path, CollectionKind::WorkspaceTables)?;
        Ok(match table_type {
            None => tables,
            Some(CUSTOM_LOG) => tables
                .into_iter()
                .filter(|table| table.name.ends_with("_CL"))
                .collect(),
            Some(name) => tables.into_iter().filter(|table| table.name == name).collect(),
        })
    }

    /// Table types a workspace advertises. A workspace without the list
    /// advertises none.
    pub fn table_type_list(&self, subscription: &str, workspace: &str) -> OpResult<Vec<String>> {
        let subscription_id = self.subscription_id(subscription)?;
        require("workspace", workspace)?;
        let path = self.find_resource(
            &subscription_id,
            CollectionKind::LogAnalyticsWorkspaces,
            workspace,
            "Log Analytics workspace",
        )?;
        let node = self.store.resolve(&path)?;
        let malformed = || {
            OpError::Service(format!(
                "Log Analytics workspace '{workspace}' contains malformed table type data"
            ))
        };
        match node.property("available_table_types") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(malformed))
                .collect(),
            Some(_) => Err(malformed()),
        }
    }
}

fn matches_workspace(node: &Node, workspace: &str) -> bool {
    node.name() == workspace
        || node.id.as_ref().is_some_and(|id| id.as_str() == workspace)
        || node.property_str("customer_id") == Some(workspace)
}
