//! # Deposit Commitments
//!
//! A deposit is identified by the tuple
//! `(depositor, collection, asset ids, recipient, nonce)`. Its
//! [`CommitmentId`] is a digest of that tuple in the given asset order.
//! Nothing else about a deposit is stored; whether it is still live is a
//! question for the messaging port.

use serde::{Deserialize, Serialize};
use xnft_core::{Address, AssetId, Digest32, Felt, Timestamp, WordHasher};
use xnft_messaging::MessageHash;

/// Digest identifying one deposit.
pub type CommitmentId = Digest32;

const COMMITMENT_DOMAIN: &str = "xnft.deposit.commitment.v1";

/// The full identity of a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositCommitment {
    /// Who deposited.
    pub depositor: Address,
    /// Local collection.
    pub collection: Address,
    /// Assets, in message order.
    pub asset_ids: Vec<AssetId>,
    /// Remote recipient.
    pub recipient: Felt,
    /// Port nonce of the deposit message.
    pub nonce: u64,
}

impl DepositCommitment {
    /// The commitment digest.
    pub fn id(&self) -> CommitmentId {
        let mut hasher = WordHasher::new(COMMITMENT_DOMAIN);
        hasher
            .address(&self.depositor)
            .address(&self.collection)
            .u64(self.asset_ids.len() as u64);
        for id in &self.asset_ids {
            hasher.asset(id);
        }
        hasher.felt(&self.recipient).u64(self.nonce).finish()
    }
}

/// A pending request to cancel a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRequest {
    /// Who asked.
    pub depositor: Address,
    /// Which deposit.
    pub commitment: CommitmentId,
    /// When it was last (re)armed.
    pub requested_at: Timestamp,
}

/// What `deposit` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// Port nonce of the outbound message.
    pub nonce: u64,
    /// Port hash of the outbound message.
    pub message_hash: MessageHash,
    /// Commitment digest.
    pub commitment: CommitmentId,
}

/// Derived state of a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DepositStatus {
    /// The message is live and no cancellation is pending.
    Sent,
    /// The depositor started a cancellation.
    CancelRequested {
        /// When it was last armed.
        requested_at: Timestamp,
    },
    /// The cancellation completed and the assets were returned.
    Cancelled,
    /// The remote side consumed the message.
    Consumed,
}
