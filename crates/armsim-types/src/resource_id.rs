use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Hierarchical resource identifier.
///
/// Ids are derived from the ownership chain of a resource:
///
/// ```text
/// /subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.{ns}/{type}/{name}/{child-type}/{child-name}
/// ```
///
/// They are computed once when a resource is created and never rewritten.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Start building an id rooted at a subscription.
    pub fn builder(subscription_id: impl Into<String>) -> ResourceIdBuilder {
        ResourceIdBuilder {
            subscription_id: subscription_id.into(),
            segments: Vec::new(),
        }
    }

    /// Wrap an id string read from a snapshot.
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The id as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path segment (the resource's own name).
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Returns `true` if `other` is this id or a descendant of it.
    pub fn contains(&self, other: &ResourceId) -> bool {
        other.0 == self.0
            || other
                .0
                .strip_prefix(&self.0)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug)]
enum Segment {
    ResourceGroup(String),
    Provider {
        namespace: String,
        resource_type: String,
        name: String,
    },
    Child {
        resource_type: String,
        name: String,
    },
}

/// Incremental builder for [`ResourceId`].
#[derive(Clone, Debug)]
pub struct ResourceIdBuilder {
    subscription_id: String,
    segments: Vec<Segment>,
}

impl ResourceIdBuilder {
    /// Append `/resourceGroups/{name}`.
    pub fn resource_group(mut self, name: impl Into<String>) -> Self {
        self.segments.push(Segment::ResourceGroup(name.into()));
        self
    }

    /// Append `/providers/Microsoft.{namespace}/{resource_type}/{name}`.
    ///
    /// `namespace` must not include the `Microsoft.` prefix.
    pub fn provider(
        mut self,
        namespace: impl Into<String>,
        resource_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.segments.push(Segment::Provider {
            namespace: namespace.into(),
            resource_type: resource_type.into(),
            name: name.into(),
        });
        self
    }

    /// Append `/{resource_type}/{name}`. The type may itself contain
    /// slashes (e.g. `blobServices/default/containers`).
    pub fn child(mut self, resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        self.segments.push(Segment::Child {
            resource_type: resource_type.into(),
            name: name.into(),
        });
        self
    }

    /// Render the id, rejecting empty components.
    pub fn build(self) -> Result<ResourceId, TypeError> {
        if self.subscription_id.is_empty() {
            return Err(TypeError::MissingSubscription);
        }

        let mut id = format!("/subscriptions/{}", self.subscription_id);
        for segment in self.segments {
            match segment {
                Segment::ResourceGroup(name) => {
                    non_empty(&name, "resource group")?;
                    id.push_str("/resourceGroups/");
                    id.push_str(&name);
                }
                Segment::Provider {
                    namespace,
                    resource_type,
                    name,
                } => {
                    non_empty(&namespace, "provider namespace")?;
                    non_empty(&resource_type, "resource type")?;
                    non_empty(&name, "resource name")?;
                    id.push_str(&format!(
                        "/providers/Microsoft.{namespace}/{resource_type}/{name}"
                    ));
                }
                Segment::Child {
                    resource_type,
                    name,
                } => {
                    non_empty(&resource_type, "child type")?;
                    non_empty(&name, "child name")?;
                    id.push_str(&format!("/{resource_type}/{name}"));
                }
            }
        }
        Ok(ResourceId(id))
    }
}

fn non_empty(value: &str, what: &'static str) -> Result<(), TypeError> {
    if value.is_empty() {
        Err(TypeError::EmptySegment(what))
    } else {
        Ok(())
    }
}
