//! # Ledger Interface
//!
//! The contract between the bridge and the unique-asset ledger it drives.
//! Every mutating call names its `caller`, because authorization on the
//! ledger depends on who is asking rather than on ambient context.

use xnft_core::{Address, AssetId, OwnerDirectory};

use crate::error::LedgerError;

/// Hook consulted by [`AssetLedger::safe_transfer_from`] when the recipient
/// is a registered contract.
pub trait TransferReceiver: Send + Sync {
    /// Return `true` to accept `asset` of `collection`, moved by `operator`
    /// from `from`.
    fn on_received(
        &self,
        operator: &Address,
        from: &Address,
        collection: &Address,
        asset: &AssetId,
    ) -> bool;
}

/// A receiver that declines every transfer. Registered for contracts that
/// must never take custody directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl TransferReceiver for RejectAll {
    fn on_received(&self, _: &Address, _: &Address, _: &Address, _: &AssetId) -> bool {
        false
    }
}

/// A unique-asset ownership ledger hosting many collections.
///
/// The `check_*` methods are read-only and answer exactly the error the
/// matching mutation would return, so a caller can verify a whole batch
/// before moving anything.
pub trait AssetLedger: OwnerDirectory {
    /// Current owner of `asset`.
    fn owner_of(&self, collection: &Address, asset: &AssetId) -> Result<Address, LedgerError>;

    /// The single approved address for `asset`, if any.
    fn get_approved(
        &self,
        collection: &Address,
        asset: &AssetId,
    ) -> Result<Option<Address>, LedgerError>;

    /// Whether `operator` may move every asset `owner` holds in `collection`.
    fn is_approved_for_all(&self, collection: &Address, owner: &Address, operator: &Address)
        -> bool;

    /// Approve `to` for `asset`. The caller must be the owner or one of its
    /// operators.
    fn approve(
        &mut self,
        caller: &Address,
        collection: &Address,
        to: &Address,
        asset: &AssetId,
    ) -> Result<(), LedgerError>;

    /// Grant or withdraw operator rights of `operator` over the caller's assets.
    fn set_approval_for_all(
        &mut self,
        caller: &Address,
        collection: &Address,
        operator: &Address,
        approved: bool,
    ) -> Result<(), LedgerError>;

    /// Move `asset` with no receiver callback. Clears the per-asset approval.
    fn transfer_from(
        &mut self,
        caller: &Address,
        collection: &Address,
        from: &Address,
        to: &Address,
        asset: &AssetId,
    ) -> Result<(), LedgerError>;

    /// Move `asset`, consulting the recipient's receiver hook first.
    fn safe_transfer_from(
        &mut self,
        caller: &Address,
        collection: &Address,
        from: &Address,
        to: &Address,
        asset: &AssetId,
    ) -> Result<(), LedgerError>;

    /// Would [`transfer_from`](Self::transfer_from) succeed?
    fn check_transfer(
        &self,
        caller: &Address,
        collection: &Address,
        from: &Address,
        to: &Address,
        asset: &AssetId,
    ) -> Result<(), LedgerError>;

    /// Would [`safe_transfer_from`](Self::safe_transfer_from) succeed?
    fn check_safe_transfer(
        &self,
        caller: &Address,
        collection: &Address,
        from: &Address,
        to: &Address,
        asset: &AssetId,
    ) -> Result<(), LedgerError>;
}
