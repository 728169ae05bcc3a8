//! Port-level failures.

use thiserror::Error;
use xnft_core::Timestamp;

use crate::message::MessageHash;

/// Errors returned by a [`MessagingPort`](crate::MessagingPort).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    /// No live message with this hash. Covers never sent, already
    /// cancelled, and (for consumption) already consumed.
    #[error("no live message {hash}")]
    NotFound {
        /// The message hash.
        hash: MessageHash,
    },

    /// The outbound message was consumed by the remote side.
    #[error("message {hash} was already consumed")]
    AlreadyConsumed {
        /// The message hash.
        hash: MessageHash,
    },

    /// `try_cancel` without a prior `start_cancellation`.
    #[error("cancellation of message {hash} was not started")]
    CancellationNotRequested {
        /// The message hash.
        hash: MessageHash,
    },

    /// The configured delay since `start_cancellation` has not elapsed.
    #[error("cancellation of message {hash} is not allowed before {ready_at}")]
    CancellationNotAllowedYet {
        /// The message hash.
        hash: MessageHash,
        /// Earliest time the cancellation can complete.
        ready_at: Timestamp,
    },

    /// The payload exceeds the port's limit.
    #[error("payload of {len} words exceeds the limit of {max}")]
    PayloadTooLarge {
        /// Payload length in words.
        len: usize,
        /// Configured maximum.
        max: usize,
    },
}
