//! Registry errors.

use thiserror::Error;
use xnft_core::{Address, Felt};

/// Errors returned by [`TokenRegistry`](crate::TokenRegistry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The caller is not allowed to register this collection.
    #[error("caller {caller} may not register collection {collection}: {reason}")]
    Unauthorized {
        /// The caller.
        caller: Address,
        /// The collection.
        collection: Address,
        /// Why the check failed.
        reason: &'static str,
    },

    /// The collection already has a remote counterpart.
    #[error("collection {collection} is already registered to {existing}")]
    AlreadyRegistered {
        /// The collection.
        collection: Address,
        /// The remote id it maps to.
        existing: Felt,
    },

    /// Zero is reserved for "not registered".
    #[error("remote token for collection {collection} must be non-zero")]
    InvalidRemoteToken {
        /// The collection.
        collection: Address,
    },
}
