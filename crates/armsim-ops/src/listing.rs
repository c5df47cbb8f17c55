use armsim_store::{CollectionKind, CollectionOwner, ResourcePath, StoreError, StoreResult};

use crate::error::{OpError, OpResult};
use crate::models::ResourceSummary;
use crate::simulator::Simulator;
use crate::validation::require;

impl Simulator {
    /// Resources of `kind` across every group of the subscription.
    ///
    /// `ResourceGroups` lists the groups themselves.
    pub fn list_group_resources(
        &self,
        subscription: &str,
        kind: CollectionKind,
    ) -> OpResult<Vec<ResourceSummary>> {
        let subscription_id = self.subscription_id(subscription)?;
        let groups = self.store.collection_if_exists(
            &ResourcePath::new(subscription_id),
            CollectionKind::ResourceGroups,
        )?;
        if kind == CollectionKind::ResourceGroups {
            return Ok(groups
                .iter()
                .map(|group| ResourceSummary::from_node(group, None))
                .collect());
        }
        if kind.parent() != Some(CollectionKind::ResourceGroups) {
            return Err(OpError::InvalidInput(format!(
                "{kind} is not a group-level resource kind"
            )));
        }
        Ok(groups
            .iter()
            .flat_map(|group| {
                group
                    .collection(kind)
                    .into_iter()
                    .flatten()
                    .map(move |node| ResourceSummary::from_node(node, Some(group.name())))
            })
            .collect())
    }

    /// Children of kind `child_kind` under the node at `parent`, a path as
    /// accepted by [`show`](Self::show).
    pub fn list_children(
        &self,
        subscription: &str,
        parent: &str,
        child_kind: CollectionKind,
    ) -> OpResult<Vec<ResourceSummary>> {
        let subscription_id = self.subscription_id(subscription)?;
        require("parent", parent)?;
        let parent = self.resolve_path(&subscription_id, parent)?;
        if child_kind.parent() != parent.kind() {
            return Err(OpError::InvalidInput(format!(
                "{child_kind} entries do not belong under {parent}"
            )));
        }
        self.child_summaries(&parent, child_kind).map_err(|e| match e {
            StoreError::NotFound { kind, key, .. } => {
                OpError::ResourceNotFound(format!("{kind} entry '{key}' not found under {parent}"))
            }
            other => other.into(),
        })
    }

    /// The `kind` children of `parent`, tagged with the group that holds it.
    pub(crate) fn child_summaries(
        &self,
        parent: &ResourcePath,
        kind: CollectionKind,
    ) -> StoreResult<Vec<ResourceSummary>> {
        let children = self.store.collection_if_exists(parent, kind)?;
        let group = parent.steps().first().map(|step| step.key.to_string());
        Ok(children
            .iter()
            .map(|node| ResourceSummary::from_node(node, group.as_deref()))
            .collect())
    }
}
