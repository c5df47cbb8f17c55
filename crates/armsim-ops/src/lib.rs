//! Operation handlers for the resource-management simulator.
//!
//! [`Simulator`] wraps one [`ResourceStore`] and exposes the caller-facing
//! operations: subscription resolution, App Configuration key-values,
//! Key Vault keys, storage containers and blobs, Cosmos DB accounts,
//! Log Analytics tables, and generic resource listing. Handlers validate inputs,
//! drive the store's accessors, and translate store outcomes into
//! [`OpError`]s.

pub mod appconfig;
pub mod cosmos;
pub mod error;
pub mod keyvault;
pub mod listing;
pub mod models;
pub mod monitor;
pub mod simulator;
pub mod storage;
pub mod validation;

pub use error::{OpError, OpResult};
pub use keyvault::KeyType;
pub use models::{
    ConfigStoreSummary, ContainerDetails, KeyAttributes, KeyDetails, KeyListItem, KeyValueItem, ResourceSummary,
    SubscriptionSummary,
};
pub use monitor::CUSTOM_LOG;
pub use simulator::Simulator;
pub use validation::require;

// Re-export key store types
pub use armsim_store::{CollectionKind, Node, ResourcePath, ResourceStore, Subscription};
