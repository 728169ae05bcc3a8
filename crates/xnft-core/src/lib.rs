//! # xnft-core: Foundational Types for the Bridge
//!
//! Leaf crate of the workspace. Everything the registry, escrow and
//! controller exchange is defined here so the two domains never meet as
//! bare integers or byte slices.
//!
//! ## Key Design Principles
//!
//! 1. **Domain-separated identifiers.** A local-domain account is an
//!    [`Address`]; a remote-domain value is a [`Felt`]; an asset is an
//!    [`AssetId`]. A 256-bit asset identifier never travels as a `Felt`
//!    without going through the split codec.
//!
//! 2. **One payload layout.** [`TransferPayload`] is the only way to build
//!    or parse the word sequence carried by bridge messages in either
//!    direction.
//!
//! 3. **Explicit authorization.** Role checks go through a [`RoleStore`];
//!    collection ownership is discovered through an [`OwnerProbe`] with a
//!    distinct failure state rather than a guess.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `xnft-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod access;
pub mod codec;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use access::{AccessError, OwnerDirectory, OwnerProbe, Role, RoleStore, SharedRoleStore};
pub use codec::{join_asset_id, split_asset_id, SplitAssetId, TransferPayload, LIMB_BITS};
pub use digest::{Digest32, WordHasher};
pub use error::{CodecError, CoreError};
pub use identity::{Address, AssetId, Felt, FELT_MODULUS};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
