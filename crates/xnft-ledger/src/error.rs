//! Ledger-level transfer and approval failures.
//!
//! The bridge propagates these unchanged. Messages follow the wording of
//! the standard unique-asset interface so integrators can match on them.

use thiserror::Error;
use xnft_core::{Address, AssetId};

/// Errors returned by an [`AssetLedger`](crate::AssetLedger).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No collection is deployed at this address.
    #[error("no collection at {collection}")]
    UnknownCollection {
        /// The collection address.
        collection: Address,
    },

    /// The asset has not been minted.
    #[error("owner query for nonexistent token {asset} in {collection}")]
    NonexistentAsset {
        /// The collection address.
        collection: Address,
        /// The asset id.
        asset: AssetId,
    },

    /// The asset is already minted.
    #[error("token {asset} already minted in {collection}")]
    AlreadyMinted {
        /// The collection address.
        collection: Address,
        /// The asset id.
        asset: AssetId,
    },

    /// The caller may not move the asset.
    #[error("transfer caller {caller} is not owner nor approved for token {asset}")]
    NotOwnerNorApproved {
        /// The caller.
        caller: Address,
        /// The asset id.
        asset: AssetId,
    },

    /// `from` is not the current owner.
    #[error("transfer of token {asset} from incorrect owner {from}")]
    IncorrectOwner {
        /// The claimed owner.
        from: Address,
        /// The asset id.
        asset: AssetId,
    },

    /// The caller may not set the approval.
    #[error("approve caller {caller} is not owner nor approved for all on token {asset}")]
    ApproveNotAuthorized {
        /// The caller.
        caller: Address,
        /// The asset id.
        asset: AssetId,
    },

    /// Approving the current owner is meaningless.
    #[error("approval of token {asset} to current owner")]
    ApprovalToCurrentOwner {
        /// The asset id.
        asset: AssetId,
    },

    /// Operators cannot approve themselves.
    #[error("approve to caller")]
    ApproveToCaller,

    /// Transfers to the zero address are burns and are not supported.
    #[error("transfer to the zero address")]
    TransferToZero,

    /// The recipient's receiver hook declined the transfer.
    #[error("transfer to non receiver implementer {to}")]
    ReceiverRejected {
        /// The recipient.
        to: Address,
    },
}
