//! # xnft-registry: Local-to-Remote Collection Mapping
//!
//! The [`TokenRegistry`] is the sole source of truth for translating a local
//! collection address into its remote counterpart. A mapping is written
//! once and never changed or deleted.
//!
//! ## Registration Policy
//!
//! The caller must be the collection's owner as reported by an
//! [`OwnerDirectory`](xnft_core::OwnerDirectory) probe:
//!
//! | Probe | Outcome |
//! |-------|---------|
//! | `HasOwner(a)` | allowed only when `caller == a` |
//! | `NoOwner` | allowed for any caller |
//! | `ProbeFailed` | `Unauthorized` |
//!
//! The `NoOwner` row is a trust boundary: collections without an owner
//! accessor can be mapped by whoever registers first.

pub mod error;
pub mod registry;

pub use error::RegistryError;
pub use registry::{BridgePair, RegistryEvent, TokenRegistry};
