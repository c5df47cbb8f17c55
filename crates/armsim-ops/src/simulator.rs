use armsim_store::{CollectionKind, Node, ResourcePath, ResourceStore, StoreError, Subscription, Uniqueness};
use armsim_types::NodeKey;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{OpError, OpResult};
use crate::models::SubscriptionSummary;
use crate::validation::require;

/// Operation entry point over one resource store.
///
/// Handlers accept a subscription by stable id or display name, locate the
/// target through the store's accessors, and translate store outcomes into
/// [`OpError`]s with caller-facing text.
#[derive(Debug, Default)]
pub struct Simulator {
    pub(crate) store: ResourceStore,
}

impl Simulator {
    pub fn new(store: ResourceStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ResourceStore {
        &mut self.store
    }

    pub fn into_store(self) -> ResourceStore {
        self.store
    }

    // ---- Subscriptions ----

    pub fn subscriptions(&self) -> Vec<SubscriptionSummary> {
        self.store
            .subscriptions()
            .iter()
            .map(SubscriptionSummary::from)
            .collect()
    }

    /// Resolve an identifier (stable id or display name).
    pub fn resolve(&self, subscription: &str) -> OpResult<SubscriptionSummary> {
        require("subscription", subscription)?;
        Ok(SubscriptionSummary::from(
            self.store.resolve_subscription(subscription)?,
        ))
    }

    /// Register a subscription. Ids and display names must both be unused.
    pub fn add_subscription(
        &mut self,
        subscription_id: &str,
        display_name: &str,
        tenant_id: Option<&str>,
    ) -> OpResult<SubscriptionSummary> {
        require("subscription id", subscription_id)?;
        require("display name", display_name)?;
        if self.store.resolve_subscription(display_name).is_ok() {
            return Err(OpError::Conflict(format!(
                "subscription '{display_name}' already exists"
            )));
        }
        let mut subscription = Subscription::new(subscription_id, display_name).with_state("Enabled");
        if let Some(tenant_id) = tenant_id {
            subscription = subscription.with_tenant(tenant_id);
        }
        let added = self.store.add_subscription(subscription)?;
        info!(subscription_id, display_name, "subscription registered");
        Ok(SubscriptionSummary::from(&*added))
    }

    pub fn remove_subscription(&mut self, subscription: &str) -> OpResult<()> {
        let subscription_id = self.subscription_id(subscription)?;
        self.store.remove_subscription(&subscription_id);
        info!(subscription_id, "subscription removed");
        Ok(())
    }

    pub(crate) fn subscription_id(&self, subscription: &str) -> OpResult<String> {
        require("subscription", subscription)?;
        let found = self.store.resolve_subscription(subscription)?;
        debug!(identifier = subscription, subscription_id = %found.subscription_id, "subscription resolved");
        Ok(found.subscription_id.clone())
    }

    /// Path of the group-level resource of `kind` named `name`, searching
    /// every resource group of the subscription.
    pub(crate) fn find_resource(
        &self,
        subscription_id: &str,
        kind: CollectionKind,
        name: &str,
        what: &str,
    ) -> OpResult<ResourcePath> {
        self.store
            .locate(subscription_id, kind, name)
            .map_err(|e| match e {
                StoreError::NotFound { .. } => OpError::ResourceNotFound(format!(
                    "{what} '{name}' not found in subscription '{subscription_id}'"
                )),
                other => other.into(),
            })
    }

    /// Resolve `kind/name/kind/name/...` to a path.
    ///
    /// Text that does not start at `resource_groups` is anchored at the
    /// group-level resource named by its first pair, in whichever group holds
    /// it, and descends from there.
    pub(crate) fn resolve_path(&self, subscription_id: &str, text: &str) -> OpResult<ResourcePath> {
        let segments: Vec<&str> = text.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [first, name, rest @ ..] if *first != CollectionKind::ResourceGroups.as_str() => {
                let kind: CollectionKind = first
                    .parse()
                    .map_err(|e| OpError::InvalidInput(format!("{e}")))?;
                let anchor = self.find_resource(subscription_id, kind, name, kind.as_str())?;
                Ok(anchor.join(&rest.join("/"))?)
            }
            _ => Ok(ResourcePath::parse(subscription_id, text)?),
        }
    }

    // ---- Generic access ----

    /// The node at `path` under a subscription, either from the group down
    /// (`resource_groups/rg/kind/name/...`) or from a group-level resource
    /// (`kind/name/...`).
    pub fn show(&self, subscription: &str, path: &str) -> OpResult<Node> {
        let subscription_id = self.subscription_id(subscription)?;
        let path = self.resolve_path(&subscription_id, path)?;
        if path.is_root() {
            return Err(OpError::InvalidInput("path cannot be empty".into()));
        }
        self.store.get_path_if_exists(&path).map_err(|e| match e {
            StoreError::NotFound { kind, key, .. } => {
                OpError::ResourceNotFound(format!("{kind} entry '{key}' not found under {path}"))
            }
            other => other.into(),
        })
    }

    /// Create a `kind` entry named `name` under `parent` (a path as accepted
    /// by [`show`](Self::show); empty for the subscription root).
    ///
    /// Key-values take their label from `name[label]`.
    pub fn create_resource(
        &mut self,
        subscription: &str,
        parent: &str,
        kind: CollectionKind,
        name: &str,
        properties: Map<String, Value>,
    ) -> OpResult<Node> {
        let subscription_id = self.subscription_id(subscription)?;
        require("name", name)?;
        let parent = self.resolve_path(&subscription_id, parent)?;
        let key = if kind.is_compound() {
            NodeKey::parse(name)
        } else {
            NodeKey::simple(name)
        };
        let node = Node::new(kind, key).with_properties(properties);
        let created = self
            .store
            .create(&parent, node, Uniqueness::for_kind(kind))
            .map_err(|e| match e {
                StoreError::NotFound { kind, key, .. } => {
                    OpError::ResourceNotFound(format!("{kind} entry '{key}' not found under {parent}"))
                }
                other => other.into(),
            })?;
        Ok(created.clone())
    }
}
