//! # Messages and Their Hashes
//!
//! An outbound message is identified by the hash of
//! `(sender, recipient, nonce, selector, len, payload…)`; an inbound one by
//! the hash of `(from, to, len, payload…)`. Each is computed with a
//! [`WordHasher`] under its own domain tag, so the two directions never
//! share a hash space.

use serde::{Deserialize, Serialize};
use xnft_core::{Address, Digest32, Felt, Timestamp, WordHasher};

/// Identity of a message within the port.
pub type MessageHash = Digest32;

const OUTBOUND_DOMAIN: &str = "xnft.message.outbound.v1";
const INBOUND_DOMAIN: &str = "xnft.message.inbound.v1";

/// A message from the local domain to the remote domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// The local contract that sent it.
    pub sender: Address,
    /// The remote contract it is addressed to.
    pub recipient: Felt,
    /// Per-sender sequence number.
    pub nonce: u64,
    /// Entry point on the remote contract.
    pub selector: Felt,
    /// Message body.
    pub payload: Vec<Felt>,
}

impl OutboundMessage {
    /// The port-level identity of this message.
    pub fn hash(&self) -> MessageHash {
        let mut hasher = WordHasher::new(OUTBOUND_DOMAIN);
        hasher
            .address(&self.sender)
            .felt(&self.recipient)
            .u64(self.nonce)
            .felt(&self.selector)
            .u64(self.payload.len() as u64);
        for word in &self.payload {
            hasher.felt(word);
        }
        hasher.finish()
    }
}

/// A message from the remote domain to the local domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The remote contract that sent it.
    pub from: Felt,
    /// The local contract allowed to consume it.
    pub to: Address,
    /// Message body.
    pub payload: Vec<Felt>,
}

impl InboundMessage {
    /// The port-level identity of this message.
    pub fn hash(&self) -> MessageHash {
        let mut hasher = WordHasher::new(INBOUND_DOMAIN);
        hasher
            .felt(&self.from)
            .address(&self.to)
            .u64(self.payload.len() as u64);
        for word in &self.payload {
            hasher.felt(word);
        }
        hasher.finish()
    }
}

/// What a successful send returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundReceipt {
    /// Hash of the queued message.
    pub hash: MessageHash,
    /// Nonce assigned to it.
    pub nonce: u64,
}

/// Port-side state of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OutboundStatus {
    /// Queued and live. `cancellation_started_at` is set once the sender
    /// begins a cancellation.
    Pending {
        /// When the cancellation was last (re)started.
        cancellation_started_at: Option<Timestamp>,
    },
    /// Handled by the remote side. Terminal.
    Consumed,
    /// Cancelled by the sender. Terminal.
    Cancelled,
}

impl OutboundStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Consumed | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outbound(nonce: u64) -> OutboundMessage {
        OutboundMessage {
            sender: Address::repeat_byte(1),
            recipient: Felt::from(2u64),
            nonce,
            selector: Felt::from(3u64),
            payload: vec![Felt::from(4u64), Felt::from(5u64)],
        }
    }

    #[test]
    fn test_nonce_changes_hash() {
        assert_ne!(outbound(0).hash(), outbound(1).hash());
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(outbound(7).hash(), outbound(7).hash());
    }

    #[test]
    fn test_payload_length_is_bound() {
        let mut short = outbound(0);
        short.payload.pop();
        assert_ne!(short.hash(), outbound(0).hash());
    }

    #[test]
    fn test_directions_do_not_collide() {
        let inbound = InboundMessage {
            from: Felt::from(2u64),
            to: Address::repeat_byte(1),
            payload: vec![],
        };
        let outbound = OutboundMessage {
            sender: Address::repeat_byte(1),
            recipient: Felt::from(2u64),
            nonce: 0,
            selector: Felt::ZERO,
            payload: vec![],
        };
        assert_ne!(inbound.hash(), outbound.hash());
    }

    #[test]
    fn test_status_serde_shape() {
        let json = serde_json::to_value(OutboundStatus::Consumed).unwrap();
        assert_eq!(json["state"], "consumed");
        assert!(OutboundStatus::Cancelled.is_terminal());
        assert!(!OutboundStatus::Pending {
            cancellation_started_at: None
        }
        .is_terminal());
    }
}
