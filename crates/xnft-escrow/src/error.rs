//! Escrow errors.

use thiserror::Error;
use xnft_core::AccessError;
use xnft_ledger::LedgerError;

/// Errors returned by [`Escrow`](crate::Escrow).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// The caller lacks the required role.
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AccessError),

    /// The ledger refused an approval.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
