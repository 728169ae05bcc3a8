//! # Bridge Errors
//!
//! One stable variant per rejected precondition. `NotDepositor` never
//! reveals which field of a cancellation request was wrong.

use thiserror::Error;
use xnft_core::{AccessError, Address, AssetId, Timestamp};
use xnft_escrow::EscrowError;
use xnft_ledger::LedgerError;
use xnft_messaging::PortError;
use xnft_registry::RegistryError;

/// Errors returned by [`BridgeController`](crate::BridgeController).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// No registry has been attached yet.
    #[error("bridge registry not set")]
    RegistryNotSet,

    /// A registry is already attached.
    #[error("bridge registry already set")]
    RegistryAlreadySet,

    /// The registry's standard bridge is a different controller.
    #[error("registry serves bridge {found}, not {expected}")]
    RegistryMismatch {
        /// This controller's address.
        expected: Address,
        /// The local bridge named by the registry.
        found: Address,
    },

    /// The asset list is empty.
    #[error("asset list must not be empty")]
    EmptyList,

    /// The asset list is longer than one message may carry.
    #[error("{count} assets exceed the per-message limit of {max}")]
    TooManyAssets {
        /// Assets in the request.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The same asset appears twice in the list.
    #[error("asset {asset} appears more than once")]
    DuplicateAsset {
        /// The repeated asset.
        asset: AssetId,
    },

    /// The collection has no remote counterpart.
    #[error("collection {collection} is not registered")]
    TokenNotRegistered {
        /// The collection.
        collection: Address,
    },

    /// No live deposit by this caller matches the given parameters.
    #[error("tokens were not deposited by sender")]
    NotDepositor,

    /// The deposit message was already consumed on the remote side.
    #[error("no message to cancel")]
    NoMessageToCancel,

    /// Completion was attempted without a prior initiation.
    #[error("deposit cancellation was not requested")]
    CancellationNotRequested,

    /// The port's cancellation delay has not elapsed.
    #[error("deposit cancellation is not allowed before {ready_at}")]
    CancellationNotAllowedYet {
        /// Earliest completion time.
        ready_at: Timestamp,
    },

    /// No unconsumed inbound message matches the withdrawal.
    #[error("invalid message to consume")]
    InvalidMessage,

    /// An aborted deposit could not return the assets it had already
    /// moved into escrow.
    #[error("rollback failed after {cause}: {rollback}")]
    RollbackFailed {
        /// Why the deposit was aborted.
        cause: Box<BridgeError>,
        /// Why restoring custody failed.
        rollback: Box<BridgeError>,
    },

    /// A role check failed.
    #[error("unauthorized: {0}")]
    Unauthorized(AccessError),

    /// The registry rejected a registration.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The asset ledger rejected a transfer or approval.
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    /// The messaging port failed for a reason with no bridge meaning.
    #[error("messaging port: {0}")]
    Port(#[from] PortError),
}

impl BridgeError {
    /// Whether the failure is a role or ownership check.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized(_) | Self::Registry(RegistryError::Unauthorized { .. })
        )
    }
}

impl From<EscrowError> for BridgeError {
    fn from(err: EscrowError) -> Self {
        match err {
            EscrowError::Unauthorized(access) => Self::Unauthorized(access),
            EscrowError::Ledger(ledger) => Self::Ledger(ledger),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xnft_core::Role;

    #[test]
    fn escrow_ledger_errors_surface_as_ledger() {
        let err: BridgeError = EscrowError::Ledger(LedgerError::TransferToZero).into();
        assert_eq!(err, BridgeError::Ledger(LedgerError::TransferToZero));
    }

    #[test]
    fn escrow_role_errors_are_unauthorized() {
        let access = AccessError::MissingRole {
            account: Address::repeat_byte(1),
            role: Role::Withdrawer,
        };
        let err: BridgeError = EscrowError::Unauthorized(access).into();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn registry_unauthorized_is_unauthorized() {
        let err = BridgeError::Registry(RegistryError::Unauthorized {
            caller: Address::repeat_byte(1),
            collection: Address::repeat_byte(2),
            reason: "caller is not the collection owner",
        });
        assert!(err.is_unauthorized());
        assert!(!BridgeError::NotDepositor.is_unauthorized());
    }
}
