//! # xnft-bridge: Bridge Controller
//!
//! Orchestrates the three flows of the bridge against an [`AssetLedger`]
//! and a [`MessagingPort`]:
//!
//! 1. **Deposit.** Assets move from the depositor into the escrow and an
//!    outbound message naming them is sent to the remote bridge.
//! 2. **Cancellation.** The depositor starts a cancellation, then completes
//!    it. Completion cancels the outbound message on the port and returns
//!    the assets.
//! 3. **Withdrawal.** A claimant presents the asset list of an inbound
//!    message from the remote bridge. The message is consumed and the
//!    assets leave the escrow.
//!
//! ## Deposit State Machine
//!
//! ```text
//! Sent ──▶ CancelRequested ──▶ Cancelled
//!   │             │
//!   └─────────────┴──────────▶ Consumed
//! ```
//!
//! The state is never stored here. [`BridgeController::deposit_status`]
//! derives it from the port on every call, and every transition is decided
//! by the port, so cancellation and remote consumption of the same deposit
//! cannot both succeed.
//!
//! [`AssetLedger`]: xnft_ledger::AssetLedger
//! [`MessagingPort`]: xnft_messaging::MessagingPort

pub mod commitment;
pub mod config;
pub mod controller;
pub mod deploy;
pub mod error;
pub mod events;

pub use commitment::{CancellationRequest, CommitmentId, DepositCommitment, DepositReceipt, DepositStatus};
pub use config::{BridgeConfig, ConfigError, DEFAULT_DEPOSIT_SELECTOR};
pub use controller::BridgeController;
pub use deploy::{LocalController, LocalDeployment, LocalDeploymentOptions};
pub use error::BridgeError;
pub use events::BridgeEvent;
