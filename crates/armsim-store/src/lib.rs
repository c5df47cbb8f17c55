//! Hierarchical in-memory resource store for the resource-management
//! simulator.
//!
//! The store holds an ordered forest rooted at subscriptions. Each
//! subscription owns resource groups; groups own typed resource collections;
//! resources own typed sub-resource collections, and so on down the schema
//! in [`CollectionKind`].
//!
//! # Access
//!
//! - [`ResourceStore::get_path_if_exists`] -- copy access, no side effects
//! - [`ResourceStore::get_or_create_path`] -- live [`Slot`] into the tree,
//!   creating missing intermediate collections along the way
//! - [`ResourceStore::get_or_create_collection`] -- live [`ListHandle`] for
//!   adds and keyed updates
//! - [`ResourceStore::resolve_subscription`] -- id first, then display name
//!
//! # Mutation
//!
//! - [`Collection::add`] with a [`Uniqueness`] policy
//! - [`Collection::update`] -- shallow merge, refused while locked
//! - [`Collection::delete`] with a [`KeySelector`](armsim_types::KeySelector)
//! - [`lock`] / [`unlock`] -- the lock state machine
//!
//! Versioned kinds are stamped by the [`Stamper`] after every successful
//! mutation and never on a failed one.
//!
//! # Design Rules
//!
//! 1. Parents own children by value; a live reference is a borrow of the
//!    containing collection plus an index.
//! 2. Identity (kind, key, id) never changes after creation.
//! 3. The store reports typed outcomes and never formats caller-facing text.
//! 4. Resolver defects surface as [`StoreError::Invariant`], never a panic.

pub mod collection;
pub mod error;
pub mod filter;
pub mod kind;
pub mod model;
pub mod path;
pub mod shared;
pub mod snapshot;
pub mod stamp;
pub mod store;
pub mod traits;

pub use collection::{apply_patch, Collection, Uniqueness};
pub use error::{StoreError, StoreResult};
pub use filter::{filter_key_values, NULL_LABEL_FILTER};
pub use kind::{CollectionKind, IdSegment, UnknownKind};
pub use model::{Node, Subscription, Versioning};
pub use path::{ResourcePath, Step};
pub use shared::SharedStore;
pub use snapshot::Snapshot;
pub use stamp::{lock, unlock, Clock, ManualClock, Stamper, SystemClock};
pub use store::{ListHandle, ResourceStore, Slot};
pub use traits::CollectionOwner;
