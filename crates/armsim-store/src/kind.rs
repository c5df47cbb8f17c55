//! The schema of the entity tree: which collections exist, where they may
//! appear, how their items are keyed, and which items carry versioning or
//! lock state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A typed collection within the entity tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    ResourceGroups,
    AppConfigStores,
    KeyValues,
    StorageAccounts,
    BlobContainers,
    Blobs,
    StorageTables,
    CosmosDbAccounts,
    Databases,
    Containers,
    KeyVaults,
    Keys,
    LogAnalyticsWorkspaces,
    WorkspaceTables,
    MonitorHealthModels,
    Entities,
}

/// How a collection contributes to a resource id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdSegment {
    /// `/resourceGroups/{name}`
    ResourceGroup,
    /// `/providers/Microsoft.{namespace}/{resource_type}/{name}`
    Provider {
        namespace: &'static str,
        resource_type: &'static str,
    },
    /// `/{resource_type}/{name}`
    Child { resource_type: &'static str },
}

impl CollectionKind {
    /// Every kind, in schema order.
    pub const ALL: [CollectionKind; 16] = [
        Self::ResourceGroups,
        Self::AppConfigStores,
        Self::KeyValues,
        Self::StorageAccounts,
        Self::BlobContainers,
        Self::Blobs,
        Self::StorageTables,
        Self::CosmosDbAccounts,
        Self::Databases,
        Self::Containers,
        Self::KeyVaults,
        Self::Keys,
        Self::LogAnalyticsWorkspaces,
        Self::WorkspaceTables,
        Self::MonitorHealthModels,
        Self::Entities,
    ];

    /// The snapshot/collection name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResourceGroups => "resource_groups",
            Self::AppConfigStores => "app_config_stores",
            Self::KeyValues => "key_values",
            Self::StorageAccounts => "storage_accounts",
            Self::BlobContainers => "blob_containers",
            Self::Blobs => "blobs",
            Self::StorageTables => "storage_tables",
            Self::CosmosDbAccounts => "cosmos_db_accounts",
            Self::Databases => "databases",
            Self::Containers => "containers",
            Self::KeyVaults => "key_vaults",
            Self::Keys => "keys",
            Self::LogAnalyticsWorkspaces => "log_analytics_workspaces",
            Self::WorkspaceTables => "workspace_tables",
            Self::MonitorHealthModels => "monitor_health_models",
            Self::Entities => "entities",
        }
    }

    /// The kind of node that owns this collection. `None` means the
    /// collection hangs directly off a subscription.
    pub fn parent(self) -> Option<CollectionKind> {
        match self {
            Self::ResourceGroups => None,
            Self::AppConfigStores
            | Self::StorageAccounts
            | Self::CosmosDbAccounts
            | Self::KeyVaults
            | Self::LogAnalyticsWorkspaces
            | Self::MonitorHealthModels => Some(Self::ResourceGroups),
            Self::KeyValues => Some(Self::AppConfigStores),
            Self::BlobContainers | Self::StorageTables => Some(Self::StorageAccounts),
            Self::Blobs => Some(Self::BlobContainers),
            Self::Databases => Some(Self::CosmosDbAccounts),
            Self::Containers => Some(Self::Databases),
            Self::Keys => Some(Self::KeyVaults),
            Self::WorkspaceTables => Some(Self::LogAnalyticsWorkspaces),
            Self::Entities => Some(Self::MonitorHealthModels),
        }
    }

    /// Kinds whose parent is `self`.
    pub fn children(self) -> impl Iterator<Item = CollectionKind> {
        Self::ALL
            .into_iter()
            .filter(move |kind| kind.parent() == Some(self))
    }

    /// Field names of the primary and (for compound keys) secondary key
    /// components, as they appear in caller-facing payloads.
    pub fn key_fields(self) -> (&'static str, Option<&'static str>) {
        match self {
            Self::KeyValues => ("key", Some("label")),
            Self::StorageTables => ("TableName", None),
            Self::Entities => ("entityId", None),
            _ => ("name", None),
        }
    }

    /// Returns `true` if items are keyed by primary + nullable secondary.
    pub fn is_compound(self) -> bool {
        self.key_fields().1.is_some()
    }

    /// Returns `true` if items carry a version token and modification time.
    pub fn is_versioned(self) -> bool {
        matches!(self, Self::KeyValues | Self::Keys)
    }

    /// Returns `true` if items carry a lock flag.
    pub fn is_lockable(self) -> bool {
        matches!(self, Self::KeyValues)
    }

    /// The resource id segment contributed by items of this kind.
    pub fn id_segment(self) -> IdSegment {
        match self {
            Self::ResourceGroups => IdSegment::ResourceGroup,
            Self::AppConfigStores => IdSegment::Provider {
                namespace: "AppConfiguration",
                resource_type: "configurationStores",
            },
            Self::StorageAccounts => IdSegment::Provider {
                namespace: "Storage",
                resource_type: "storageAccounts",
            },
            Self::CosmosDbAccounts => IdSegment::Provider {
                namespace: "DocumentDB",
                resource_type: "databaseAccounts",
            },
            Self::KeyVaults => IdSegment::Provider {
                namespace: "KeyVault",
                resource_type: "vaults",
            },
            Self::LogAnalyticsWorkspaces => IdSegment::Provider {
                namespace: "OperationalInsights",
                resource_type: "workspaces",
            },
            Self::MonitorHealthModels => IdSegment::Provider {
                namespace: "Monitor",
                resource_type: "healthModels",
            },
            Self::KeyValues => IdSegment::Child {
                resource_type: "keyValues",
            },
            Self::BlobContainers => IdSegment::Child {
                resource_type: "blobServices/default/containers",
            },
            Self::Blobs => IdSegment::Child {
                resource_type: "blobs",
            },
            Self::StorageTables => IdSegment::Child {
                resource_type: "tableServices/default/tables",
            },
            Self::Databases => IdSegment::Child {
                resource_type: "sqlDatabases",
            },
            Self::Containers => IdSegment::Child {
                resource_type: "containers",
            },
            Self::Keys => IdSegment::Child {
                resource_type: "keys",
            },
            Self::WorkspaceTables => IdSegment::Child {
                resource_type: "tables",
            },
            Self::Entities => IdSegment::Child {
                resource_type: "entities",
            },
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown collection name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for CollectionKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}
