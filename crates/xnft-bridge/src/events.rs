//! Events emitted by the controller for external indexers. Each carries the
//! full deposit or withdrawal tuple.

use serde::{Deserialize, Serialize};
use xnft_core::{Address, AssetId, Felt, Timestamp};
use xnft_messaging::MessageHash;

use crate::commitment::CommitmentId;

/// A controller event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// A registry was attached.
    BridgeRegistrySet {
        /// Local bridge.
        local: Address,
        /// Remote bridge.
        remote: Felt,
    },
    /// A collection mapping was registered through the controller.
    TokenRegistered {
        /// Registrar.
        caller: Address,
        /// Local collection.
        collection: Address,
        /// Remote collection.
        remote: Felt,
    },
    /// Assets entered escrow and a deposit message was sent.
    Deposit {
        /// Depositor.
        depositor: Address,
        /// Local collection.
        collection: Address,
        /// Assets deposited.
        asset_ids: Vec<AssetId>,
        /// Remote recipient.
        recipient: Felt,
        /// Message nonce.
        nonce: u64,
        /// Message hash.
        message_hash: MessageHash,
        /// Commitment digest.
        commitment: CommitmentId,
    },
    /// A deposit cancellation was started or re-armed.
    DepositCancelInitiated {
        /// Depositor.
        depositor: Address,
        /// Local collection.
        collection: Address,
        /// Assets deposited.
        asset_ids: Vec<AssetId>,
        /// Remote recipient.
        recipient: Felt,
        /// Message nonce.
        nonce: u64,
        /// When the request was armed.
        requested_at: Timestamp,
    },
    /// A deposit was cancelled and its assets returned.
    DepositCancelled {
        /// Depositor.
        depositor: Address,
        /// Local collection.
        collection: Address,
        /// Assets returned.
        asset_ids: Vec<AssetId>,
        /// Remote recipient.
        recipient: Felt,
        /// Message nonce.
        nonce: u64,
        /// Where the assets went.
        return_to: Address,
    },
    /// An inbound message was consumed and its assets released.
    Withdraw {
        /// Local collection.
        collection: Address,
        /// Assets released.
        asset_ids: Vec<AssetId>,
        /// Recipient of the assets.
        claimant: Address,
    },
}

impl BridgeEvent {
    /// Short name of the event kind, as used in the serialized tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BridgeRegistrySet { .. } => "bridge_registry_set",
            Self::TokenRegistered { .. } => "token_registered",
            Self::Deposit { .. } => "deposit",
            Self::DepositCancelInitiated { .. } => "deposit_cancel_initiated",
            Self::DepositCancelled { .. } => "deposit_cancelled",
            Self::Withdraw { .. } => "withdraw",
        }
    }
}
