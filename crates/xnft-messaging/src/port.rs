//! # Messaging Port Interface
//!
//! The capability the bridge controller calls into. The caller passed to
//! every outbound method is the local contract using the port; a message
//! can only be cancelled by the contract that sent it.

use xnft_core::{Address, Felt, Timestamp};

use crate::error::PortError;
use crate::message::{InboundMessage, MessageHash, OutboundMessage, OutboundReceipt, OutboundStatus};

/// An at-most-once cross-domain message channel.
pub trait MessagingPort {
    /// Queue a message to `recipient` on the remote domain.
    fn send_to_remote(
        &mut self,
        sender: &Address,
        recipient: &Felt,
        selector: &Felt,
        payload: &[Felt],
    ) -> Result<OutboundReceipt, PortError>;

    /// Begin (or re-arm) the cancellation of a pending outbound message.
    ///
    /// Fails with [`PortError::NotFound`] if the message was never sent or
    /// is already cancelled, and [`PortError::AlreadyConsumed`] if the
    /// remote side handled it.
    fn start_cancellation(&mut self, message: &OutboundMessage) -> Result<Timestamp, PortError>;

    /// Permanently cancel a pending outbound message whose cancellation was
    /// started and whose delay has elapsed.
    fn try_cancel(&mut self, message: &OutboundMessage) -> Result<(), PortError>;

    /// How many unconsumed copies of `message` are waiting.
    fn inbound_pending(&self, message: &InboundMessage) -> u64;

    /// Consume one copy of an inbound message. The caller must be
    /// `message.to`, which the port enforces by hash.
    fn try_consume(&mut self, message: &InboundMessage) -> Result<MessageHash, PortError>;

    /// Port-side state of an outbound message, if the port has seen it.
    fn outbound_status(&self, hash: &MessageHash) -> Option<OutboundStatus>;

    /// The next nonce `sender` would be assigned.
    fn next_nonce(&self, sender: &Address) -> u64;
}
