//! # xnft-ledger: Unique-Asset Ownership Ledger
//!
//! The bridge never moves assets itself. It calls into an ownership ledger
//! through the [`AssetLedger`] trait, which models the standard
//! unique-asset interface: one owner per asset, a single approved address
//! per asset, per-owner operators, and two transfer flavors.
//!
//! - `transfer_from` moves the asset with no receiver callback.
//! - `safe_transfer_from` asks the recipient's [`TransferReceiver`] first
//!   and fails with [`LedgerError::ReceiverRejected`] if it declines.
//!
//! [`InMemoryLedger`] implements the trait for tests, the integration
//! suite, and the CLI simulator. It also stands in for the owner accessor
//! of each collection, so it is the [`OwnerDirectory`](xnft_core::OwnerDirectory)
//! the registry consults.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::LedgerError;
pub use memory::{InMemoryLedger, OwnerAccessor};
pub use traits::{AssetLedger, RejectAll, TransferReceiver};
