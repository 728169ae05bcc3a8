//! # xnft-escrow: Custody of In-Transit Assets
//!
//! The [`Escrow`] holds every asset that is in flight between the two
//! domains. It knows nothing about deposits or withdrawals; it only gates
//! custody by role.
//!
//! ## Security Invariant
//!
//! - Custody comes in only through a receiver-checked transfer whose
//!   operator holds [`Role::Withdrawer`](xnft_core::Role::Withdrawer).
//!   Any other receiver-checked transfer is rejected with the ledger's
//!   standard receiver error.
//! - Custody goes out only after a `Withdrawer` calls
//!   [`Escrow::approve_for_withdraw`], which approves that caller on the
//!   ledger for the listed assets.
//! - Role changes are made by `Admin` holders and apply to the next check.

pub mod error;
pub mod escrow;

pub use error::EscrowError;
pub use escrow::{Escrow, EscrowReceiver};
