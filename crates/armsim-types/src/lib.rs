//! Foundation types for the resource-management simulator.
//!
//! This crate provides the identity, versioning, and keying types shared by
//! every other `armsim` crate.
//!
//! # Key Types
//!
//! - [`ResourceId`] -- Hierarchical resource identifier derived from the ownership chain
//! - [`ETag`] -- Opaque version token regenerated on every mutation
//! - [`Timestamp`] -- UTC instant with a fixed, sortable text form
//! - [`NodeKey`] -- Primary key with an optional (nullable) secondary component
//! - [`KeySelector`] -- Key pattern used by delete operations

pub mod error;
pub mod etag;
pub mod key;
pub mod resource_id;
pub mod timestamp;

pub use error::TypeError;
pub use etag::ETag;
pub use key::{KeySelector, NodeKey};
pub use resource_id::{ResourceId, ResourceIdBuilder};
pub use timestamp::Timestamp;
