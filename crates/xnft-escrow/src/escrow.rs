//! # Escrow Contract
//!
//! Role assignments live in a [`SharedRoleStore`] that the escrow and its
//! [`EscrowReceiver`] both read, so a grant or revocation is visible to the
//! ledger's receiver check the moment it is made.

use std::sync::Arc;

use xnft_core::{Address, AssetId, Role, RoleStore, SharedRoleStore};
use xnft_ledger::{AssetLedger, LedgerError, TransferReceiver};

use crate::error::EscrowError;

// ─── Receiver Hook ───────────────────────────────────────────────────

/// The escrow's receiver hook. Accepts a transfer only when the operator
/// holds [`Role::Withdrawer`].
#[derive(Debug, Clone)]
pub struct EscrowReceiver {
    escrow: Address,
    roles: SharedRoleStore,
}

impl TransferReceiver for EscrowReceiver {
    fn on_received(
        &self,
        operator: &Address,
        from: &Address,
        collection: &Address,
        asset: &AssetId,
    ) -> bool {
        let accepted = self.roles.read().has(Role::Withdrawer, operator);
        if !accepted {
            tracing::warn!(
                escrow = %self.escrow,
                %operator,
                %from,
                %collection,
                %asset,
                "escrow rejected transfer from non-withdrawer operator"
            );
        }
        accepted
    }
}

// ─── Escrow ──────────────────────────────────────────────────────────

/// The custodial escrow.
#[derive(Debug, Clone)]
pub struct Escrow {
    address: Address,
    roles: SharedRoleStore,
}

impl Escrow {
    /// Deploy at `address` with `admin` holding [`Role::Admin`].
    pub fn new(address: Address, admin: Address) -> Self {
        Self {
            address,
            roles: RoleStore::with_admin(admin).into_shared(),
        }
    }

    /// The escrow's ledger address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The hook to register with the ledger under [`Escrow::address`].
    pub fn receiver(&self) -> Arc<dyn TransferReceiver> {
        Arc::new(EscrowReceiver {
            escrow: self.address,
            roles: Arc::clone(&self.roles),
        })
    }

    /// Grant `role` to `account`. `caller` must be an admin.
    pub fn grant_role(
        &self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, EscrowError> {
        let mut roles = self.roles.write();
        roles.authorize(Role::Admin, caller)?;
        let changed = roles.grant(role, account);
        tracing::info!(escrow = %self.address, %role, %account, changed, "role granted");
        Ok(changed)
    }

    /// Revoke `role` from `account`. `caller` must be an admin.
    pub fn revoke_role(
        &self,
        caller: &Address,
        role: Role,
        account: &Address,
    ) -> Result<bool, EscrowError> {
        let mut roles = self.roles.write();
        roles.authorize(Role::Admin, caller)?;
        let changed = roles.revoke(role, account);
        tracing::info!(escrow = %self.address, %role, %account, changed, "role revoked");
        Ok(changed)
    }

    /// Grant [`Role::Withdrawer`].
    pub fn grant_withdrawer(&self, caller: &Address, account: Address) -> Result<bool, EscrowError> {
        self.grant_role(caller, Role::Withdrawer, account)
    }

    /// Revoke [`Role::Withdrawer`].
    pub fn revoke_withdrawer(
        &self,
        caller: &Address,
        account: &Address,
    ) -> Result<bool, EscrowError> {
        self.revoke_role(caller, Role::Withdrawer, account)
    }

    /// Whether `account` holds `role`.
    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.roles.read().has(role, account)
    }

    /// Whether `account` holds [`Role::Withdrawer`].
    pub fn is_withdrawer(&self, account: &Address) -> bool {
        self.has_role(Role::Withdrawer, account)
    }

    /// Approve `caller` on the ledger to move each listed asset out of
    /// custody.
    ///
    /// Every asset is checked before any approval is written. An asset the
    /// escrow does not hold fails with the ledger's approval error.
    pub fn approve_for_withdraw<L: AssetLedger + ?Sized>(
        &self,
        caller: &Address,
        ledger: &mut L,
        collection: &Address,
        assets: &[AssetId],
    ) -> Result<(), EscrowError> {
        self.roles.read().authorize(Role::Withdrawer, caller)?;
        for asset in assets {
            let owner = ledger.owner_of(collection, asset)?;
            if owner != self.address {
                return Err(LedgerError::ApproveNotAuthorized {
                    caller: self.address,
                    asset: *asset,
                }
                .into());
            }
        }
        for asset in assets {
            ledger.approve(&self.address, collection, caller, asset)?;
        }
        tracing::debug!(
            escrow = %self.address,
            %caller,
            %collection,
            count = assets.len(),
            "assets approved for withdrawal"
        );
        Ok(())
    }

    /// Whether the escrow currently holds every listed asset.
    pub fn holds<L: AssetLedger + ?Sized>(
        &self,
        ledger: &L,
        collection: &Address,
        assets: &[AssetId],
    ) -> bool {
        assets
            .iter()
            .all(|a| ledger.owner_of(collection, a).ok() == Some(self.address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xnft_core::AccessError;
    use xnft_ledger::{InMemoryLedger, OwnerAccessor};

    const ESCROW: Address = Address::repeat_byte(0xe5);
    const ADMIN: Address = Address::repeat_byte(0xad);
    const BRIDGE: Address = Address::repeat_byte(0xb1);
    const USER: Address = Address::repeat_byte(0x01);
    const COLLECTION: Address = Address::repeat_byte(0xc0);

    fn setup() -> (Escrow, InMemoryLedger, Vec<AssetId>) {
        let escrow = Escrow::new(ESCROW, ADMIN);
        let mut ledger = InMemoryLedger::new();
        ledger.create_collection(COLLECTION, OwnerAccessor::Absent);
        ledger.register_receiver(ESCROW, escrow.receiver());
        let ids = ledger.mint_batch(&COLLECTION, &USER, 3).unwrap();
        (escrow, ledger, ids)
    }

    #[test]
    fn only_admin_grants() {
        let (escrow, _, _) = setup();
        let err = escrow.grant_withdrawer(&USER, BRIDGE).unwrap_err();
        assert_eq!(
            err,
            EscrowError::Unauthorized(AccessError::MissingRole {
                account: USER,
                role: Role::Admin
            })
        );
        assert!(escrow.grant_withdrawer(&ADMIN, BRIDGE).unwrap());
        assert!(escrow.is_withdrawer(&BRIDGE));
    }

    #[test]
    fn direct_safe_transfer_is_rejected() {
        let (escrow, mut ledger, ids) = setup();
        let err = ledger
            .safe_transfer_from(&USER, &COLLECTION, &USER, &escrow.address(), &ids[0])
            .unwrap_err();
        assert_eq!(err, LedgerError::ReceiverRejected { to: ESCROW });
    }

    #[test]
    fn withdrawer_operator_can_deposit() {
        let (escrow, mut ledger, ids) = setup();
        escrow.grant_withdrawer(&ADMIN, BRIDGE).unwrap();
        ledger.set_approval_for_all(&USER, &COLLECTION, &BRIDGE, true).unwrap();
        ledger
            .safe_transfer_from(&BRIDGE, &COLLECTION, &USER, &ESCROW, &ids[0])
            .unwrap();
        assert!(escrow.holds(&ledger, &COLLECTION, &ids[..1]));
    }

    #[test]
    fn revocation_closes_intake_immediately() {
        let (escrow, mut ledger, ids) = setup();
        escrow.grant_withdrawer(&ADMIN, BRIDGE).unwrap();
        ledger.set_approval_for_all(&USER, &COLLECTION, &BRIDGE, true).unwrap();
        escrow.revoke_withdrawer(&ADMIN, &BRIDGE).unwrap();
        assert!(ledger
            .safe_transfer_from(&BRIDGE, &COLLECTION, &USER, &ESCROW, &ids[0])
            .is_err());
    }

    #[test]
    fn approve_for_withdraw_requires_role() {
        let (escrow, mut ledger, ids) = setup();
        let err = escrow
            .approve_for_withdraw(&BRIDGE, &mut ledger, &COLLECTION, &ids)
            .unwrap_err();
        assert!(matches!(err, EscrowError::Unauthorized(_)));
    }

    #[test]
    fn approve_for_withdraw_then_release() {
        let (escrow, mut ledger, ids) = setup();
        escrow.grant_withdrawer(&ADMIN, BRIDGE).unwrap();
        ledger.set_approval_for_all(&USER, &COLLECTION, &BRIDGE, true).unwrap();
        for id in &ids {
            ledger
                .safe_transfer_from(&BRIDGE, &COLLECTION, &USER, &ESCROW, id)
                .unwrap();
        }
        escrow
            .approve_for_withdraw(&BRIDGE, &mut ledger, &COLLECTION, &ids)
            .unwrap();
        for id in &ids {
            ledger.transfer_from(&BRIDGE, &COLLECTION, &ESCROW, &USER, id).unwrap();
        }
        assert_eq!(ledger.assets_of(&COLLECTION, &USER), ids);
    }

    #[test]
    fn approve_for_unheld_asset_fails_without_partial_approval() {
        let (escrow, mut ledger, ids) = setup();
        escrow.grant_withdrawer(&ADMIN, BRIDGE).unwrap();
        ledger.set_approval_for_all(&USER, &COLLECTION, &BRIDGE, true).unwrap();
        ledger
            .safe_transfer_from(&BRIDGE, &COLLECTION, &USER, &ESCROW, &ids[0])
            .unwrap();
        let err = escrow
            .approve_for_withdraw(&BRIDGE, &mut ledger, &COLLECTION, &ids[..2])
            .unwrap_err();
        assert_eq!(
            err,
            EscrowError::Ledger(LedgerError::ApproveNotAuthorized {
                caller: ESCROW,
                asset: ids[1]
            })
        );
        assert_eq!(ledger.get_approved(&COLLECTION, &ids[0]).unwrap(), None);
    }
}
