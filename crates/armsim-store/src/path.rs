//! Addresses of nodes within a subscription.

use std::fmt;

use armsim_types::{NodeKey, ResourceId};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::kind::{CollectionKind, IdSegment};

/// One hop of a path: a collection and the key of an item within it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    pub kind: CollectionKind,
    pub key: NodeKey,
}

impl Step {
    pub fn new(kind: CollectionKind, key: impl Into<NodeKey>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}

/// A subscription id followed by an ordered list of steps.
///
/// A path with no steps addresses the subscription itself; it is valid as
/// the parent of a collection but not as the target of a node lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    subscription_id: String,
    steps: Vec<Step>,
}

impl ResourcePath {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn step(mut self, kind: CollectionKind, key: impl Into<NodeKey>) -> Self {
        self.steps.push(Step::new(kind, key));
        self
    }

    /// Append a resource group step.
    pub fn resource_group(self, name: impl Into<String>) -> Self {
        self.step(CollectionKind::ResourceGroups, NodeKey::simple(name))
    }

    /// A copy of this path extended by one step.
    pub fn child(&self, kind: CollectionKind, key: impl Into<NodeKey>) -> Self {
        self.clone().step(kind, key)
    }

    /// This path without its last step. `None` for the subscription root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.steps.split_last()?;
        Some(Self {
            subscription_id: self.subscription_id.clone(),
            steps: rest.to_vec(),
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// Number of steps.
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the path addresses the subscription itself.
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// The kind of node this path addresses. `None` for the subscription.
    pub fn kind(&self) -> Option<CollectionKind> {
        self.last().map(|step| step.kind)
    }

    /// Check that every step descends into a collection its predecessor
    /// may hold.
    pub fn validate(&self) -> StoreResult<()> {
        let mut owner: Option<CollectionKind> = None;
        for (depth, step) in self.steps.iter().enumerate() {
            if step.kind.parent() != owner {
                return Err(StoreError::InvalidPath {
                    reason: format!(
                        "step {depth} ({}) cannot follow {}",
                        step.kind,
                        owner.map_or("the subscription", CollectionKind::as_str)
                    ),
                });
            }
            owner = Some(step.kind);
        }
        Ok(())
    }

    /// Derive the hierarchical id of the addressed node.
    ///
    /// Compound keys always render as `{primary}${secondary}`, with `%` and
    /// `$` percent-encoded in both components and `%00` standing for a null
    /// secondary.
    pub fn resource_id(&self) -> StoreResult<ResourceId> {
        self.validate()?;
        let mut builder = ResourceId::builder(self.subscription_id.clone());
        for step in &self.steps {
            let name = id_name(step);
            builder = match step.kind.id_segment() {
                IdSegment::ResourceGroup => builder.resource_group(name),
                IdSegment::Provider {
                    namespace,
                    resource_type,
                } => builder.provider(namespace, resource_type, name),
                IdSegment::Child { resource_type } => builder.child(resource_type, name),
            };
        }
        Ok(builder.build()?)
    }

    /// Parse `kind/name/kind/name/...` relative to `subscription_id`.
    ///
    /// For key-values a name of the form `primary[secondary]` produces a
    /// compound key; `primary[]` has an empty (not null) secondary. Names of
    /// other kinds are taken verbatim.
    pub fn parse(subscription_id: impl Into<String>, text: &str) -> StoreResult<Self> {
        Self::new(subscription_id).join(text)
    }

    /// Append the steps of `text` (same syntax as [`parse`](Self::parse))
    /// and validate the result.
    pub fn join(mut self, text: &str) -> StoreResult<Self> {
        let segments: Vec<&str> = text
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        if segments.len() % 2 != 0 {
            return Err(StoreError::InvalidPath {
                reason: format!("'{text}' does not alternate collection and name"),
            });
        }
        for pair in segments.chunks_exact(2) {
            let kind: CollectionKind = pair[0].parse().map_err(|e| StoreError::InvalidPath {
                reason: format!("{e}"),
            })?;
            let key = if kind.is_compound() {
                NodeKey::parse(pair[1])
            } else {
                NodeKey::simple(pair[1])
            };
            self = self.step(kind, key);
        }
        self.validate()?;
        Ok(self)
    }
}

fn id_name(step: &Step) -> String {
    if !step.kind.is_compound() && step.key.secondary().is_none() {
        return step.key.primary.clone();
    }
    let secondary = step
        .key
        .secondary()
        .map_or_else(|| "%00".to_string(), escape_id_component);
    format!("{}${}", escape_id_component(&step.key.primary), secondary)
}

fn escape_id_component(text: &str) -> String {
    text.replace('%', "%25").replace('$', "%24")
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.subscription_id)?;
        for step in &self.steps {
            write!(f, "/{}/{}", step.kind, step.key)?;
        }
        Ok(())
    }
}
