//! # xnft-messaging: Cross-Domain Messaging Port
//!
//! The bridge controller talks to the remote domain only through the
//! [`MessagingPort`] trait. The port is the single arbiter of whether a
//! message is still live: the controller keeps no consumed or cancelled
//! flags of its own and asks the port every time.
//!
//! ## Guarantees
//!
//! - **Outbound.** Every send gets a per-sender nonce, starting at 0 and
//!   increasing by one. A pending outbound message ends in exactly one of
//!   `Consumed` (the remote side handled it) or `Cancelled` (the sender
//!   completed a two-phase cancellation). Neither state can be left.
//!
//! - **Inbound.** Messages from the remote side are counted by hash. Each
//!   consume removes one copy; a consume with nothing left fails with
//!   [`PortError::NotFound`].
//!
//! [`InMemoryMessagingPort`] implements the trait and adds the remote-side
//! helpers used by tests and the simulator.

pub mod config;
pub mod error;
pub mod memory;
pub mod message;
pub mod port;

pub use config::PortConfig;
pub use error::PortError;
pub use memory::InMemoryMessagingPort;
pub use message::{InboundMessage, MessageHash, OutboundMessage, OutboundReceipt, OutboundStatus};
pub use port::MessagingPort;
