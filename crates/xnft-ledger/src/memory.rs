//! # In-Memory Ledger
//!
//! A complete [`AssetLedger`] held in process memory. Collections are
//! deployed explicitly with an [`OwnerAccessor`] describing how the
//! collection answers an owner query, which lets tests exercise every
//! branch of the registry's ownership check.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use xnft_core::{Address, AssetId, OwnerDirectory, OwnerProbe};

use crate::error::LedgerError;
use crate::traits::{AssetLedger, TransferReceiver};

/// How a collection answers an owner query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "owner", rename_all = "snake_case")]
pub enum OwnerAccessor {
    /// The collection is owner-gated.
    Ownable(Address),
    /// The collection has no owner accessor at all.
    Absent,
    /// The collection has a catch-all fallback that answers any query with
    /// no data and no side effect.
    SilentFallback,
    /// The owner accessor exists but reverts.
    Reverting,
}

#[derive(Debug, Clone)]
struct Collection {
    accessor: OwnerAccessor,
    owners: BTreeMap<AssetId, Address>,
    approvals: BTreeMap<AssetId, Address>,
    operators: BTreeSet<(Address, Address)>,
    next_id: u64,
}

impl Collection {
    fn new(accessor: OwnerAccessor) -> Self {
        Self {
            accessor,
            owners: BTreeMap::new(),
            approvals: BTreeMap::new(),
            operators: BTreeSet::new(),
            next_id: 1,
        }
    }

    fn is_operator(&self, owner: &Address, operator: &Address) -> bool {
        self.operators.contains(&(*owner, *operator))
    }
}

/// A multi-collection ledger in memory.
#[derive(Default)]
pub struct InMemoryLedger {
    collections: BTreeMap<Address, Collection>,
    receivers: BTreeMap<Address, Arc<dyn TransferReceiver>>,
}

impl fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("collections", &self.collections.keys().collect::<Vec<_>>())
            .field("receivers", &self.receivers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl InMemoryLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy a collection at `address`. Redeploying replaces its accessor
    /// and keeps existing holdings.
    pub fn create_collection(&mut self, address: Address, accessor: OwnerAccessor) {
        self.collections
            .entry(address)
            .and_modify(|c| c.accessor = accessor)
            .or_insert_with(|| Collection::new(accessor));
    }

    /// Change how `collection` answers owner queries.
    pub fn set_owner_accessor(
        &mut self,
        collection: &Address,
        accessor: OwnerAccessor,
    ) -> Result<(), LedgerError> {
        self.collection_mut(collection)?.accessor = accessor;
        Ok(())
    }

    /// Mark `address` as a contract with the given receiver hook.
    pub fn register_receiver(&mut self, address: Address, receiver: Arc<dyn TransferReceiver>) {
        self.receivers.insert(address, receiver);
    }

    /// Mint a specific asset to `to`.
    pub fn mint(
        &mut self,
        collection: &Address,
        to: &Address,
        asset: AssetId,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::TransferToZero);
        }
        let c = self.collection_mut(collection)?;
        if c.owners.contains_key(&asset) {
            return Err(LedgerError::AlreadyMinted {
                collection: *collection,
                asset,
            });
        }
        c.owners.insert(asset, *to);
        Ok(())
    }

    /// Mint `count` fresh sequential ids to `to`, starting at 1 for a new
    /// collection and skipping ids already minted.
    pub fn mint_batch(
        &mut self,
        collection: &Address,
        to: &Address,
        count: u64,
    ) -> Result<Vec<AssetId>, LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::TransferToZero);
        }
        let c = self.collection_mut(collection)?;
        let mut minted = Vec::new();
        while (minted.len() as u64) < count {
            let id = AssetId::from(c.next_id);
            c.next_id += 1;
            if c.owners.contains_key(&id) {
                continue;
            }
            c.owners.insert(id, *to);
            minted.push(id);
        }
        Ok(minted)
    }

    /// Every asset `owner` holds in `collection`, in id order.
    pub fn assets_of(&self, collection: &Address, owner: &Address) -> Vec<AssetId> {
        self.collections
            .get(collection)
            .map(|c| {
                c.owners
                    .iter()
                    .filter(|(_, o)| *o == owner)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn collection(&self, collection: &Address) -> Result<&Collection, LedgerError> {
        self.collections
            .get(collection)
            .ok_or(LedgerError::UnknownCollection {
                collection: *collection,
            })
    }

    fn collection_mut(&mut self, collection: &Address) -> Result<&mut Collection, LedgerError> {
        self.collections
            .get_mut(collection)
            .ok_or(LedgerError::UnknownCollection {
                collection: *collection,
            })
    }

    fn check_receiver(
        &self,
        operator: &Address,
        from: &Address,
        to: &Address,
        collection: &Address,
        asset: &AssetId,
    ) -> Result<(), LedgerError> {
        match self.receivers.get(to) {
            Some(receiver) if !receiver.on_received(operator, from, collection, asset) => {
                Err(LedgerError::ReceiverRejected { to: *to })
            }
            _ => Ok(()),
        }
    }

    fn apply_transfer(&mut self, collection: &Address, to: &Address, asset: &AssetId) {
        if let Some(c) = self.collections.get_mut(collection) {
            c.approvals.remove(asset);
            c.owners.insert(*asset, *to);
        }
    }
}

impl OwnerDirectory for InMemoryLedger {
    fn probe_owner(&self, collection: &Address) -> OwnerProbe {
        match self.collections.get(collection).map(|c| c.accessor) {
            Some(OwnerAccessor::Ownable(owner)) => OwnerProbe::HasOwner(owner),
            Some(OwnerAccessor::Absent) | Some(OwnerAccessor::SilentFallback) => {
                OwnerProbe::NoOwner
            }
            // A call into an address with no code fails like a revert.
            Some(OwnerAccessor::Reverting) | None => OwnerProbe::ProbeFailed,
        }
    }
}

impl AssetLedger for InMemoryLedger {
    fn owner_of(&self, collection: &Address, asset: &AssetId) -> Result<Address, LedgerError> {
        self.collection(collection)?
            .owners
            .get(asset)
            .copied()
            .ok_or(LedgerError::NonexistentAsset {
                collection: *collection,
                asset: *asset,
            })
    }

    fn get_approved(
        &self,
        collection: &Address,
        asset: &AssetId,
    ) -> Result<Option<Address>, LedgerError> {
        self.owner_of(collection, asset)?;
        Ok(self.collection(collection)?.approvals.get(asset).copied())
    }

    fn is_approved_for_all(
        &self,
        collection: &Address,
        owner: &Address,
        operator: &Address,
    ) -> bool {
        self.collections
            .get(collection)
            .is_some_and(|c| c.is_operator(owner, operator))
    }

    fn approve(
        &mut self,
        caller: &Address,
        collection: &Address,
        to: &Address,
        asset: &AssetId,
    ) -> Result<(), LedgerError> {
        let owner = self.owner_of(collection, asset)?;
        if *to == owner {
            return Err(LedgerError::ApprovalToCurrentOwner { asset: *asset });
        }
        let c = self.collection_mut(collection)?;
        if *caller != owner && !c.is_operator(&owner, caller) {
            return Err(LedgerError::ApproveNotAuthorized {
                caller: *caller,
                asset: *asset,
            });
        }
        if to.is_zero() {
            c.approvals.remove(asset);
        } else {
            c.approvals.insert(*asset, *to);
        }
        Ok(())
    }

    fn set_approval_for_all(
        &mut self,
        caller: &Address,
        collection: &Address,
        operator: &Address,
        approved: bool,
    ) -> Result<(), LedgerError> {
        if caller == operator {
            return Err(LedgerError::ApproveToCaller);
        }
        let c = self.collection_mut(collection)?;
        if approved {
            c.operators.insert((*caller, *operator));
        } else {
            c.operators.remove(&(*caller, *operator));
        }
        Ok(())
    }

    fn transfer_from(
        &mut self,
        caller: &Address,
        collection: &Address,
        from: &Address,
        to: &Address,
        asset: &AssetId,
    ) -> Result<(), LedgerError> {
        self.check_transfer(caller, collection, from, to, asset)?;
        self.apply_transfer(collection, to, asset);
        Ok(())
    }

    fn safe_transfer_from(
        &mut self,
        caller: &Address,
        collection: &Address,
        from: &Address,
        to: &Address,
        asset: &AssetId,
    ) -> Result<(), LedgerError> {
        self.check_safe_transfer(caller, collection, from, to, asset)?;
        self.apply_transfer(collection, to, asset);
        Ok(())
    }

    fn check_transfer(
        &self,
        caller: &Address,
        collection: &Address,
        from: &Address,
        to: &Address,
        asset: &AssetId,
    ) -> Result<(), LedgerError> {
        let owner = self.owner_of(collection, asset)?;
        let c = self.collection(collection)?;
        let approved = c.approvals.get(asset) == Some(caller);
        if *caller != owner && !approved && !c.is_operator(&owner, caller) {
            return Err(LedgerError::NotOwnerNorApproved {
                caller: *caller,
                asset: *asset,
            });
        }
        if *from != owner {
            return Err(LedgerError::IncorrectOwner {
                from: *from,
                asset: *asset,
            });
        }
        if to.is_zero() {
            return Err(LedgerError::TransferToZero);
        }
        Ok(())
    }

    fn check_safe_transfer(
        &self,
        caller: &Address,
        collection: &Address,
        from: &Address,
        to: &Address,
        asset: &AssetId,
    ) -> Result<(), LedgerError> {
        self.check_transfer(caller, collection, from, to, asset)?;
        self.check_receiver(caller, from, to, collection, asset)
    }
}
