//! # Bridge Controller
//!
//! Every public operation validates everything it can before the first
//! mutation, then mutates in an order that leaves no partial state behind:
//!
//! | Operation | Decided by | Custody change |
//! |-----------|------------|----------------|
//! | `deposit` | port accepts the send | depositor → escrow |
//! | `complete_cancel_deposit` | port cancels the outbound message | escrow → `return_to` |
//! | `withdraw` | port consumes the inbound message | escrow → claimant |
//!
//! ## Security Invariant
//!
//! The controller keeps only the binding `message hash → commitment id`
//! and pending cancellation timestamps. It never records whether a message
//! was consumed or cancelled. The port is asked every time, so the
//! controller and the port cannot disagree about a deposit.

use std::collections::{BTreeMap, BTreeSet};

use xnft_core::{AccessError, Address, AssetId, Felt, Role, TransferPayload};
use xnft_escrow::Escrow;
use xnft_ledger::{AssetLedger, LedgerError};
use xnft_messaging::{InboundMessage, MessageHash, MessagingPort, OutboundMessage, OutboundStatus, PortError};
use xnft_registry::TokenRegistry;

use crate::commitment::{CancellationRequest, CommitmentId, DepositCommitment, DepositReceipt, DepositStatus};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::events::BridgeEvent;

/// The bridge controller.
pub struct BridgeController<L, M> {
    config: BridgeConfig,
    ledger: L,
    port: M,
    escrow: Escrow,
    registry: Option<TokenRegistry>,
    commitments: BTreeMap<MessageHash, CommitmentId>,
    cancellations: BTreeMap<CommitmentId, CancellationRequest>,
    events: Vec<BridgeEvent>,
}

impl<L: AssetLedger, M: MessagingPort> BridgeController<L, M> {
    /// Assemble a controller. It cannot move assets until the escrow's
    /// admin grants it [`Role::Withdrawer`](xnft_core::Role::Withdrawer),
    /// and cannot translate collections until a registry is attached.
    pub fn new(config: BridgeConfig, ledger: L, port: M, escrow: Escrow) -> Self {
        Self {
            config,
            ledger,
            port,
            escrow,
            registry: None,
            commitments: BTreeMap::new(),
            cancellations: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────

    /// The controller's ledger address.
    pub fn address(&self) -> Address {
        self.config.address
    }

    /// The active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The asset ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable access to the asset ledger, for holders acting directly on it.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// The messaging port.
    pub fn port(&self) -> &M {
        &self.port
    }

    /// Mutable access to the messaging port, for driving the remote side.
    pub fn port_mut(&mut self) -> &mut M {
        &mut self.port
    }

    /// The escrow.
    pub fn escrow(&self) -> &Escrow {
        &self.escrow
    }

    /// The attached registry, if any.
    pub fn registry(&self) -> Option<&TokenRegistry> {
        self.registry.as_ref()
    }

    /// A pending cancellation request.
    pub fn cancellation_request(&self, commitment: &CommitmentId) -> Option<&CancellationRequest> {
        self.cancellations.get(commitment)
    }

    /// Events emitted so far.
    pub fn events(&self) -> &[BridgeEvent] {
        &self.events
    }

    /// Take and clear the event log.
    pub fn drain_events(&mut self) -> Vec<BridgeEvent> {
        std::mem::take(&mut self.events)
    }

    // ─── Registry ────────────────────────────────────────────────────

    /// Attach the token registry. Allowed once.
    pub fn set_bridge_registry(&mut self, registry: TokenRegistry) -> Result<(), BridgeError> {
        if self.registry.is_some() {
            return Err(BridgeError::RegistryAlreadySet);
        }
        let pair = registry.standard_token_bridge();
        if pair.local != self.config.address {
            return Err(BridgeError::RegistryMismatch {
                expected: self.config.address,
                found: pair.local,
            });
        }
        tracing::info!(local = %pair.local, remote = %pair.remote, "bridge registry set");
        self.events.push(BridgeEvent::BridgeRegistrySet {
            local: pair.local,
            remote: pair.remote,
        });
        self.registry = Some(registry);
        Ok(())
    }

    /// Register `collection → remote` in the attached registry, checking
    /// ownership against this controller's ledger.
    pub fn register_token(
        &mut self,
        caller: &Address,
        collection: Address,
        remote: Felt,
    ) -> Result<(), BridgeError> {
        let registry = self.registry.as_mut().ok_or(BridgeError::RegistryNotSet)?;
        registry.register_token(&self.ledger, caller, collection, remote)?;
        self.events.push(BridgeEvent::TokenRegistered {
            caller: *caller,
            collection,
            remote,
        });
        Ok(())
    }

    fn registry_ref(&self) -> Result<&TokenRegistry, BridgeError> {
        self.registry.as_ref().ok_or(BridgeError::RegistryNotSet)
    }

    fn remote_bridge(&self) -> Result<Felt, BridgeError> {
        Ok(self.registry_ref()?.standard_token_bridge().remote)
    }

    // ─── Deposit ─────────────────────────────────────────────────────

    /// Move `asset_ids` from `caller` into escrow and send a deposit
    /// message naming `recipient` on the remote domain.
    ///
    /// The caller must have made this controller an operator on the
    /// collection. Either every asset moves and the message is sent, or
    /// nothing changes.
    pub fn deposit(
        &mut self,
        caller: &Address,
        collection: &Address,
        asset_ids: &[AssetId],
        recipient: Felt,
    ) -> Result<DepositReceipt, BridgeError> {
        self.check_asset_list(asset_ids)?;
        let remote_collection = self.registry_ref()?.get_remote_token(collection);
        if remote_collection.is_zero() {
            return Err(BridgeError::TokenNotRegistered {
                collection: *collection,
            });
        }
        let remote_bridge = self.remote_bridge()?;

        let me = self.config.address;
        let escrow = self.escrow.address();
        for id in asset_ids {
            self.ledger
                .check_safe_transfer(&me, collection, caller, &escrow, id)?;
        }

        let mut moved = Vec::with_capacity(asset_ids.len());
        for id in asset_ids {
            if let Err(err) = self
                .ledger
                .safe_transfer_from(&me, collection, caller, &escrow, id)
            {
                return Err(self.restore_custody(collection, &moved, caller, err.into()));
            }
            moved.push(*id);
        }

        let payload = TransferPayload::deposit(remote_collection, recipient, collection, asset_ids).encode();
        let receipt = match self.port.send_to_remote(
            &me,
            &remote_bridge,
            &self.config.deposit_selector,
            &payload,
        ) {
            Ok(receipt) => receipt,
            Err(err) => return Err(self.restore_custody(collection, &moved, caller, err.into())),
        };

        let commitment = DepositCommitment {
            depositor: *caller,
            collection: *collection,
            asset_ids: asset_ids.to_vec(),
            recipient,
            nonce: receipt.nonce,
        }
        .id();
        self.commitments.insert(receipt.hash, commitment);

        tracing::info!(
            depositor = %caller,
            %collection,
            count = asset_ids.len(),
            %recipient,
            nonce = receipt.nonce,
            message = %receipt.hash,
            "deposit"
        );
        metrics::counter!("xnft_deposits_total").increment(1);
        self.events.push(BridgeEvent::Deposit {
            depositor: *caller,
            collection: *collection,
            asset_ids: asset_ids.to_vec(),
            recipient,
            nonce: receipt.nonce,
            message_hash: receipt.hash,
            commitment,
        });
        Ok(DepositReceipt {
            nonce: receipt.nonce,
            message_hash: receipt.hash,
            commitment,
        })
    }

    fn check_asset_list(&self, asset_ids: &[AssetId]) -> Result<(), BridgeError> {
        if asset_ids.is_empty() {
            return Err(BridgeError::EmptyList);
        }
        if asset_ids.len() > self.config.max_assets_per_message {
            return Err(BridgeError::TooManyAssets {
                count: asset_ids.len(),
                max: self.config.max_assets_per_message,
            });
        }
        check_distinct(asset_ids)
    }

    /// Undo a partially applied deposit that failed with `cause`. Only
    /// called on assets this call just moved into escrow.
    fn restore_custody(
        &mut self,
        collection: &Address,
        moved: &[AssetId],
        depositor: &Address,
        cause: BridgeError,
    ) -> BridgeError {
        if moved.is_empty() {
            return cause;
        }
        let restored = self.release(collection, moved, depositor);
        if let Err(err) = &restored {
            tracing::error!(%collection, %depositor, error = %err, "failed to restore custody after aborted deposit");
        }
        rollback_outcome(cause, restored)
    }

    // ─── Cancellation ────────────────────────────────────────────────

    /// Start, or re-arm, the cancellation of a deposit made by `caller`.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::NotDepositor`] if no live deposit by `caller`
    ///   matches the parameters.
    /// - [`BridgeError::NoMessageToCancel`] if the remote side already
    ///   consumed the deposit message.
    pub fn initiate_cancel_deposit(
        &mut self,
        caller: &Address,
        collection: &Address,
        asset_ids: &[AssetId],
        recipient: Felt,
        nonce: u64,
    ) -> Result<CancellationRequest, BridgeError> {
        let (message, commitment) = self
            .resolve_deposit(caller, collection, asset_ids, recipient, nonce)
            .map_err(|err| {
                tracing::warn!(%caller, %collection, nonce, "cancel initiation rejected: no matching deposit");
                err
            })?;
        let requested_at = match self.port.start_cancellation(&message) {
            Ok(at) => at,
            Err(err) => return Err(self.reject_cancel(caller, nonce, err)),
        };
        let request = CancellationRequest {
            depositor: *caller,
            commitment,
            requested_at,
        };
        self.cancellations.insert(commitment, request);

        tracing::info!(depositor = %caller, %collection, nonce, at = %requested_at, "deposit cancel initiated");
        metrics::counter!("xnft_cancellations_initiated_total").increment(1);
        self.events.push(BridgeEvent::DepositCancelInitiated {
            depositor: *caller,
            collection: *collection,
            asset_ids: asset_ids.to_vec(),
            recipient,
            nonce,
            requested_at,
        });
        Ok(request)
    }

    /// Complete a cancellation started by `caller` and send the assets to
    /// `return_to`. After this the deposit message can never be consumed.
    pub fn complete_cancel_deposit(
        &mut self,
        caller: &Address,
        collection: &Address,
        asset_ids: &[AssetId],
        recipient: Felt,
        nonce: u64,
        return_to: &Address,
    ) -> Result<(), BridgeError> {
        let (message, commitment) = self
            .resolve_deposit(caller, collection, asset_ids, recipient, nonce)
            .map_err(|err| {
                tracing::warn!(%caller, %collection, nonce, "cancel completion rejected: no matching deposit");
                err
            })?;
        match self.port.outbound_status(&message.hash()) {
            Some(OutboundStatus::Consumed) => return Err(BridgeError::NoMessageToCancel),
            Some(OutboundStatus::Pending { .. }) => {}
            Some(OutboundStatus::Cancelled) | None => return Err(BridgeError::NotDepositor),
        }
        match self.cancellations.get(&commitment) {
            Some(request) if request.depositor == *caller => {}
            _ => return Err(BridgeError::CancellationNotRequested),
        }
        self.preflight_release(collection, asset_ids, return_to)?;

        if let Err(err) = self.port.try_cancel(&message) {
            return Err(self.reject_cancel(caller, nonce, err));
        }
        self.cancellations.remove(&commitment);
        self.release(collection, asset_ids, return_to)?;

        tracing::info!(depositor = %caller, %collection, nonce, %return_to, "deposit cancelled");
        metrics::counter!("xnft_cancellations_completed_total").increment(1);
        self.events.push(BridgeEvent::DepositCancelled {
            depositor: *caller,
            collection: *collection,
            asset_ids: asset_ids.to_vec(),
            recipient,
            nonce,
            return_to: *return_to,
        });
        Ok(())
    }

    /// Rebuild the deposit message for the tuple and check that `caller`
    /// made that deposit through this controller.
    fn resolve_deposit(
        &self,
        caller: &Address,
        collection: &Address,
        asset_ids: &[AssetId],
        recipient: Felt,
        nonce: u64,
    ) -> Result<(OutboundMessage, CommitmentId), BridgeError> {
        let message = self.outbound_message(collection, asset_ids, recipient, nonce)?;
        let commitment = DepositCommitment {
            depositor: *caller,
            collection: *collection,
            asset_ids: asset_ids.to_vec(),
            recipient,
            nonce,
        }
        .id();
        match self.commitments.get(&message.hash()) {
            Some(bound) if *bound == commitment => Ok((message, commitment)),
            _ => Err(BridgeError::NotDepositor),
        }
    }

    fn outbound_message(
        &self,
        collection: &Address,
        asset_ids: &[AssetId],
        recipient: Felt,
        nonce: u64,
    ) -> Result<OutboundMessage, BridgeError> {
        let registry = self.registry_ref()?;
        let remote_collection = registry.get_remote_token(collection);
        let payload = TransferPayload::deposit(remote_collection, recipient, collection, asset_ids).encode();
        Ok(OutboundMessage {
            sender: self.config.address,
            recipient: registry.standard_token_bridge().remote,
            nonce,
            selector: self.config.deposit_selector,
            payload,
        })
    }

    fn reject_cancel(&self, caller: &Address, nonce: u64, err: PortError) -> BridgeError {
        let mapped = match err {
            PortError::AlreadyConsumed { .. } => BridgeError::NoMessageToCancel,
            PortError::NotFound { .. } => BridgeError::NotDepositor,
            PortError::CancellationNotRequested { .. } => BridgeError::CancellationNotRequested,
            PortError::CancellationNotAllowedYet { ready_at, .. } => {
                BridgeError::CancellationNotAllowedYet { ready_at }
            }
            other => BridgeError::Port(other),
        };
        tracing::warn!(%caller, nonce, error = %mapped, "cancellation rejected");
        mapped
    }

    // ─── Withdrawal ──────────────────────────────────────────────────

    /// Consume the inbound message for `(collection, asset_ids, claimant)`
    /// and release the assets to `claimant`.
    ///
    /// Fails with [`BridgeError::InvalidMessage`] if no such unconsumed
    /// message was sent by the remote bridge.
    pub fn withdraw(
        &mut self,
        collection: &Address,
        asset_ids: &[AssetId],
        claimant: &Address,
    ) -> Result<(), BridgeError> {
        if asset_ids.is_empty() {
            return Err(BridgeError::EmptyList);
        }
        check_distinct(asset_ids)?;
        let message = self.inbound_message(collection, asset_ids, claimant)?;
        if self.port.inbound_pending(&message) == 0 {
            return Err(self.reject_withdraw(collection, claimant));
        }
        self.preflight_release(collection, asset_ids, claimant)?;

        match self.port.try_consume(&message) {
            Ok(_) => {}
            Err(PortError::NotFound { .. }) => return Err(self.reject_withdraw(collection, claimant)),
            Err(other) => return Err(other.into()),
        }
        self.release(collection, asset_ids, claimant)?;

        tracing::info!(%collection, %claimant, count = asset_ids.len(), "withdraw");
        metrics::counter!("xnft_withdrawals_total").increment(1);
        self.events.push(BridgeEvent::Withdraw {
            collection: *collection,
            asset_ids: asset_ids.to_vec(),
            claimant: *claimant,
        });
        Ok(())
    }

    /// Whether [`withdraw`](Self::withdraw) would succeed right now.
    /// Read-only: the message is not consumed.
    pub fn is_withdrawable(&self, collection: &Address, asset_ids: &[AssetId], claimant: &Address) -> bool {
        if asset_ids.is_empty() || claimant.is_zero() || check_distinct(asset_ids).is_err() {
            return false;
        }
        match self.inbound_message(collection, asset_ids, claimant) {
            Ok(message) => {
                self.port.inbound_pending(&message) > 0
                    && self.escrow.is_withdrawer(&self.config.address)
                    && self.escrow.holds(&self.ledger, collection, asset_ids)
            }
            Err(_) => false,
        }
    }

    fn inbound_message(
        &self,
        collection: &Address,
        asset_ids: &[AssetId],
        claimant: &Address,
    ) -> Result<InboundMessage, BridgeError> {
        let registry = self.registry_ref()?;
        let remote_collection = registry.get_remote_token(collection);
        let payload = TransferPayload::withdrawal(remote_collection, claimant, collection, asset_ids).encode();
        Ok(InboundMessage {
            from: registry.standard_token_bridge().remote,
            to: self.config.address,
            payload,
        })
    }

    fn reject_withdraw(&self, collection: &Address, claimant: &Address) -> BridgeError {
        tracing::warn!(%collection, %claimant, "withdraw rejected: no matching inbound message");
        metrics::counter!("xnft_withdrawals_rejected_total").increment(1);
        BridgeError::InvalidMessage
    }

    // ─── Release ─────────────────────────────────────────────────────

    /// Every check a release can fail, without side effects.
    fn preflight_release(&self, collection: &Address, asset_ids: &[AssetId], to: &Address) -> Result<(), BridgeError> {
        if to.is_zero() {
            return Err(LedgerError::TransferToZero.into());
        }
        let me = self.config.address;
        if !self.escrow.is_withdrawer(&me) {
            return Err(BridgeError::Unauthorized(AccessError::MissingRole {
                account: me,
                role: Role::Withdrawer,
            }));
        }
        let escrow = self.escrow.address();
        for id in asset_ids {
            if self.ledger.owner_of(collection, id)? != escrow {
                return Err(LedgerError::ApproveNotAuthorized {
                    caller: escrow,
                    asset: *id,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Approve this controller out of escrow and move each asset to `to`
    /// with a plain transfer.
    fn release(&mut self, collection: &Address, asset_ids: &[AssetId], to: &Address) -> Result<(), BridgeError> {
        let me = self.config.address;
        let escrow = self.escrow.address();
        self.escrow
            .approve_for_withdraw(&me, &mut self.ledger, collection, asset_ids)?;
        for id in asset_ids {
            self.ledger.transfer_from(&me, collection, &escrow, to, id)?;
        }
        Ok(())
    }

    // ─── Views ───────────────────────────────────────────────────────

    /// Derived state of a deposit, or `None` if the tuple names no deposit
    /// made through this controller.
    pub fn deposit_status(
        &self,
        depositor: &Address,
        collection: &Address,
        asset_ids: &[AssetId],
        recipient: Felt,
        nonce: u64,
    ) -> Option<DepositStatus> {
        let (message, _) = self
            .resolve_deposit(depositor, collection, asset_ids, recipient, nonce)
            .ok()?;
        match self.port.outbound_status(&message.hash())? {
            OutboundStatus::Pending {
                cancellation_started_at: None,
            } => Some(DepositStatus::Sent),
            OutboundStatus::Pending {
                cancellation_started_at: Some(requested_at),
            } => Some(DepositStatus::CancelRequested { requested_at }),
            OutboundStatus::Consumed => Some(DepositStatus::Consumed),
            OutboundStatus::Cancelled => Some(DepositStatus::Cancelled),
        }
    }
}

fn check_distinct(asset_ids: &[AssetId]) -> Result<(), BridgeError> {
    let mut seen = BTreeSet::new();
    for id in asset_ids {
        if !seen.insert(*id) {
            return Err(BridgeError::DuplicateAsset { asset: *id });
        }
    }
    Ok(())
}

/// The error an aborted deposit reports once its rollback has run.
fn rollback_outcome(cause: BridgeError, restored: Result<(), BridgeError>) -> BridgeError {
    match restored {
        Ok(()) => cause,
        Err(rollback) => BridgeError::RollbackFailed {
            cause: Box::new(cause),
            rollback: Box::new(rollback),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{LocalDeployment, LocalDeploymentOptions};
    use xnft_ledger::OwnerAccessor;
    use xnft_messaging::PortConfig;

    const COLLECTION: Address = Address::repeat_byte(0xc0);
    const OWNER: Address = Address::repeat_byte(0x0a);
    const ALICE: Address = Address::repeat_byte(0xa1);
    const BOB: Address = Address::repeat_byte(0xb0);

    fn remote_collection() -> Felt {
        Felt::from(0x1234_5678u64)
    }

    fn recipient() -> Felt {
        Felt::from(343_243_534_643_534u64)
    }

    fn setup_with(options: LocalDeploymentOptions, count: u64) -> (LocalDeployment, Vec<AssetId>) {
        let mut d = LocalDeployment::new(options).unwrap();
        let ids = d
            .collection_with_holder(COLLECTION, OwnerAccessor::Ownable(OWNER), &ALICE, count)
            .unwrap();
        d.controller
            .register_token(&OWNER, COLLECTION, remote_collection())
            .unwrap();
        (d, ids)
    }

    fn setup(count: u64) -> (LocalDeployment, Vec<AssetId>) {
        setup_with(LocalDeploymentOptions::default(), count)
    }

    fn escrow_address(d: &LocalDeployment) -> Address {
        d.controller.escrow().address()
    }

    #[test]
    fn deposit_moves_assets_and_sends_message() {
        let (mut d, ids) = setup(3);
        let receipt = d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        assert_eq!(receipt.nonce, 0);
        let escrow = escrow_address(&d);
        assert_eq!(d.controller.ledger().assets_of(&COLLECTION, &escrow), ids);

        let message = d.controller.port().outbound_message(&receipt.message_hash).unwrap();
        assert_eq!(message.payload[0], remote_collection());
        assert_eq!(message.payload[1], recipient());
        assert_eq!(message.payload[2], Felt::from_address(&COLLECTION));
        assert_eq!(message.payload[3], Felt::from(6u64));
        assert_eq!(message.selector, d.controller.config().deposit_selector);
        assert_eq!(
            d.controller.deposit_status(&ALICE, &COLLECTION, &ids, recipient(), 0),
            Some(DepositStatus::Sent)
        );
    }

    #[test]
    fn nonce_increments_per_deposit() {
        let (mut d, ids) = setup(2);
        let first = d.controller.deposit(&ALICE, &COLLECTION, &ids[..1], recipient()).unwrap();
        let second = d.controller.deposit(&ALICE, &COLLECTION, &ids[1..], recipient()).unwrap();
        assert_eq!((first.nonce, second.nonce), (0, 1));
    }

    #[test]
    fn empty_deposit_changes_nothing() {
        let (mut d, ids) = setup(1);
        assert_eq!(
            d.controller.deposit(&ALICE, &COLLECTION, &[], recipient()),
            Err(BridgeError::EmptyList)
        );
        assert_eq!(d.controller.ledger().assets_of(&COLLECTION, &ALICE), ids);
        assert_eq!(d.controller.port().next_nonce(&d.controller.address()), 0);
        assert!(d.controller.port().pending_outbound().is_empty());
    }

    #[test]
    fn duplicate_and_oversized_lists_rejected() {
        let options = LocalDeploymentOptions {
            bridge: BridgeConfig {
                address: Address::repeat_byte(0xb1),
                max_assets_per_message: 2,
                ..BridgeConfig::default()
            },
            ..LocalDeploymentOptions::default()
        };
        let (mut d, ids) = setup_with(options, 3);
        assert_eq!(
            d.controller.deposit(&ALICE, &COLLECTION, &[ids[0], ids[0]], recipient()),
            Err(BridgeError::DuplicateAsset { asset: ids[0] })
        );
        assert_eq!(
            d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()),
            Err(BridgeError::TooManyAssets { count: 3, max: 2 })
        );
    }

    #[test]
    fn unregistered_collection_rejected() {
        let mut d = LocalDeployment::new(LocalDeploymentOptions::default()).unwrap();
        let ids = d
            .collection_with_holder(COLLECTION, OwnerAccessor::Absent, &ALICE, 1)
            .unwrap();
        assert_eq!(
            d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()),
            Err(BridgeError::TokenNotRegistered { collection: COLLECTION })
        );
    }

    #[test]
    fn deposit_is_all_or_nothing() {
        let (mut d, ids) = setup(2);
        // Hand the second asset to Bob, who never approved the controller.
        d.controller
            .ledger_mut()
            .transfer_from(&ALICE, &COLLECTION, &ALICE, &BOB, &ids[1])
            .unwrap();
        let err = d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap_err();
        assert!(matches!(err, BridgeError::Ledger(LedgerError::NotOwnerNorApproved { .. })));
        assert_eq!(d.controller.ledger().owner_of(&COLLECTION, &ids[0]).unwrap(), ALICE);
        assert!(d.controller.port().pending_outbound().is_empty());
    }

    #[test]
    fn deposit_without_approval_fails() {
        let (mut d, ids) = setup(1);
        let bridge = d.controller.address();
        d.controller
            .ledger_mut()
            .set_approval_for_all(&ALICE, &COLLECTION, &bridge, false)
            .unwrap();
        let err = d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap_err();
        assert!(matches!(err, BridgeError::Ledger(LedgerError::NotOwnerNorApproved { .. })));
    }

    #[test]
    fn deposit_rolls_back_when_port_rejects() {
        let options = LocalDeploymentOptions {
            port: PortConfig {
                max_payload_len: 5,
                ..PortConfig::default()
            },
            ..LocalDeploymentOptions::default()
        };
        let (mut d, ids) = setup_with(options, 1);
        let err = d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap_err();
        assert!(matches!(err, BridgeError::Port(PortError::PayloadTooLarge { .. })));
        assert_eq!(d.controller.ledger().owner_of(&COLLECTION, &ids[0]).unwrap(), ALICE);
    }

    #[test]
    fn revoked_controller_cannot_deposit() {
        let (mut d, ids) = setup(1);
        let bridge = d.controller.address();
        d.controller.escrow().revoke_withdrawer(&d.admin, &bridge).unwrap();
        let err = d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap_err();
        assert!(matches!(err, BridgeError::Ledger(LedgerError::ReceiverRejected { .. })));
    }

    #[test]
    fn revoked_controller_cannot_release() {
        let (mut d, ids) = setup(1);
        d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        d.bridge_back(&COLLECTION, &ids, &BOB).unwrap();
        let bridge = d.controller.address();
        d.controller.escrow().revoke_withdrawer(&d.admin, &bridge).unwrap();
        assert!(!d.controller.is_withdrawable(&COLLECTION, &ids, &BOB));
        let err = d.controller.withdraw(&COLLECTION, &ids, &BOB).unwrap_err();
        assert!(err.is_unauthorized());
        d.controller.escrow().grant_withdrawer(&d.admin, bridge).unwrap();
        d.controller.withdraw(&COLLECTION, &ids, &BOB).unwrap();
    }

    #[test]
    fn cancel_round_trip_returns_assets() {
        let (mut d, ids) = setup(2);
        let receipt = d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        let request = d
            .controller
            .initiate_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), receipt.nonce)
            .unwrap();
        assert_eq!(request.commitment, receipt.commitment);
        assert!(matches!(
            d.controller.deposit_status(&ALICE, &COLLECTION, &ids, recipient(), 0),
            Some(DepositStatus::CancelRequested { .. })
        ));
        d.controller
            .complete_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0, &ALICE)
            .unwrap();
        assert_eq!(d.controller.ledger().assets_of(&COLLECTION, &ALICE), ids);
        assert_eq!(
            d.controller.deposit_status(&ALICE, &COLLECTION, &ids, recipient(), 0),
            Some(DepositStatus::Cancelled)
        );
        assert!(d.controller.cancellation_request(&receipt.commitment).is_none());
        assert!(matches!(
            d.relay_deposit(&receipt.message_hash),
            Err(BridgeError::Port(PortError::NotFound { .. }))
        ));
    }

    #[test]
    fn cancel_with_wrong_fields_is_not_depositor() {
        let (mut d, ids) = setup(2);
        d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        let c = &mut d.controller;
        assert_eq!(
            c.initiate_cancel_deposit(&BOB, &COLLECTION, &ids, recipient(), 0),
            Err(BridgeError::NotDepositor)
        );
        assert_eq!(
            c.initiate_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 1),
            Err(BridgeError::NotDepositor)
        );
        assert_eq!(
            c.initiate_cancel_deposit(&ALICE, &COLLECTION, &ids[..1], recipient(), 0),
            Err(BridgeError::NotDepositor)
        );
        assert_eq!(
            c.initiate_cancel_deposit(&ALICE, &BOB, &ids, recipient(), 0),
            Err(BridgeError::NotDepositor)
        );
        assert_eq!(
            c.initiate_cancel_deposit(&ALICE, &COLLECTION, &ids, Felt::from(1u64), 0),
            Err(BridgeError::NotDepositor)
        );
    }

    #[test]
    fn complete_without_initiate_fails() {
        let (mut d, ids) = setup(1);
        d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        assert_eq!(
            d.controller
                .complete_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0, &ALICE),
            Err(BridgeError::CancellationNotRequested)
        );
    }

    #[test]
    fn complete_respects_port_delay() {
        let options = LocalDeploymentOptions {
            port: PortConfig {
                cancellation_delay_secs: 600,
                ..PortConfig::default()
            },
            ..LocalDeploymentOptions::default()
        };
        let (mut d, ids) = setup_with(options, 1);
        d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        d.controller
            .initiate_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0)
            .unwrap();
        let err = d
            .controller
            .complete_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0, &ALICE)
            .unwrap_err();
        assert!(matches!(err, BridgeError::CancellationNotAllowedYet { .. }));
        d.clock.advance(600);
        d.controller
            .complete_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0, &ALICE)
            .unwrap();
    }

    #[test]
    fn reinitiate_rearms() {
        let (mut d, ids) = setup(1);
        d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        let first = d
            .controller
            .initiate_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0)
            .unwrap();
        d.clock.advance(30);
        let second = d
            .controller
            .initiate_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0)
            .unwrap();
        assert_eq!(second.requested_at.epoch_secs(), first.requested_at.epoch_secs() + 30);
    }

    #[test]
    fn cancel_after_remote_consumption_fails() {
        let (mut d, ids) = setup(1);
        let receipt = d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        d.relay_deposit(&receipt.message_hash).unwrap();
        assert_eq!(
            d.controller
                .initiate_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0),
            Err(BridgeError::NoMessageToCancel)
        );
        assert_eq!(
            d.controller.deposit_status(&ALICE, &COLLECTION, &ids, recipient(), 0),
            Some(DepositStatus::Consumed)
        );
    }

    #[test]
    fn remote_consumption_wins_over_pending_cancel() {
        let (mut d, ids) = setup(1);
        let receipt = d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        d.controller
            .initiate_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0)
            .unwrap();
        d.relay_deposit(&receipt.message_hash).unwrap();
        assert_eq!(
            d.controller
                .complete_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0, &ALICE),
            Err(BridgeError::NoMessageToCancel)
        );
        let escrow = escrow_address(&d);
        assert_eq!(d.controller.ledger().owner_of(&COLLECTION, &ids[0]).unwrap(), escrow);
    }

    #[test]
    fn withdraw_releases_once() {
        let (mut d, ids) = setup(10);
        d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        d.bridge_back(&COLLECTION, &ids, &BOB).unwrap();
        assert!(d.controller.is_withdrawable(&COLLECTION, &ids, &BOB));
        d.controller.withdraw(&COLLECTION, &ids, &BOB).unwrap();
        assert_eq!(d.controller.ledger().assets_of(&COLLECTION, &BOB), ids);
        assert_eq!(
            d.controller.withdraw(&COLLECTION, &ids, &BOB),
            Err(BridgeError::InvalidMessage)
        );
        assert!(!d.controller.is_withdrawable(&COLLECTION, &ids, &BOB));
    }

    #[test]
    fn withdraw_subset_superset_or_wrong_claimant_fails() {
        let (mut d, ids) = setup(3);
        d.controller.deposit(&ALICE, &COLLECTION, &ids[..2], recipient()).unwrap();
        d.bridge_back(&COLLECTION, &ids[..2], &BOB).unwrap();
        for (subset, claimant) in [(&ids[..1], BOB), (&ids[..3], BOB), (&ids[..2], ALICE)] {
            assert!(!d.controller.is_withdrawable(&COLLECTION, subset, &claimant));
            assert_eq!(
                d.controller.withdraw(&COLLECTION, subset, &claimant),
                Err(BridgeError::InvalidMessage)
            );
        }
        d.controller.withdraw(&COLLECTION, &ids[..2], &BOB).unwrap();
    }

    #[test]
    fn withdraw_empty_list() {
        let (mut d, _) = setup(1);
        assert_eq!(
            d.controller.withdraw(&COLLECTION, &[], &BOB),
            Err(BridgeError::EmptyList)
        );
    }

    #[test]
    fn withdraw_with_repeated_asset_releases_nothing() {
        let (mut d, ids) = setup(1);
        d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        let repeated = [ids[0], ids[0]];
        d.bridge_back(&COLLECTION, &repeated, &BOB).unwrap();
        let message = d.controller.inbound_message(&COLLECTION, &repeated, &BOB).unwrap();

        assert!(!d.controller.is_withdrawable(&COLLECTION, &repeated, &BOB));
        assert_eq!(
            d.controller.withdraw(&COLLECTION, &repeated, &BOB),
            Err(BridgeError::DuplicateAsset { asset: ids[0] })
        );
        let escrow = escrow_address(&d);
        assert_eq!(d.controller.ledger().owner_of(&COLLECTION, &ids[0]).unwrap(), escrow);
        assert_eq!(d.controller.port().inbound_pending(&message), 1);
    }

    #[test]
    fn lost_rollback_is_reported() {
        let cause = BridgeError::Port(PortError::PayloadTooLarge { len: 9, max: 5 });
        assert_eq!(rollback_outcome(cause.clone(), Ok(())), cause);
        let lost = rollback_outcome(cause.clone(), Err(BridgeError::InvalidMessage));
        assert_eq!(
            lost,
            BridgeError::RollbackFailed {
                cause: Box::new(cause),
                rollback: Box::new(BridgeError::InvalidMessage),
            }
        );
        assert!(lost.to_string().contains("rollback failed"));
    }

    #[test]
    fn withdraw_of_unescrowed_asset_keeps_message() {
        let (mut d, ids) = setup(1);
        d.bridge_back(&COLLECTION, &ids, &BOB).unwrap();
        let err = d.controller.withdraw(&COLLECTION, &ids, &BOB).unwrap_err();
        assert!(matches!(err, BridgeError::Ledger(LedgerError::ApproveNotAuthorized { .. })));
        d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        d.controller.withdraw(&COLLECTION, &ids, &BOB).unwrap();
    }

    #[test]
    fn withdraw_after_cancel_is_invalid() {
        let (mut d, ids) = setup(1);
        d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        d.controller
            .initiate_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0)
            .unwrap();
        d.controller
            .complete_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0, &ALICE)
            .unwrap();
        assert_eq!(
            d.controller.withdraw(&COLLECTION, &ids, &ALICE),
            Err(BridgeError::InvalidMessage)
        );
    }

    #[test]
    fn direct_transfer_to_controller_rejected() {
        let (mut d, ids) = setup(1);
        let bridge = d.controller.address();
        let err = d
            .controller
            .ledger_mut()
            .safe_transfer_from(&ALICE, &COLLECTION, &ALICE, &bridge, &ids[0])
            .unwrap_err();
        assert_eq!(err, LedgerError::ReceiverRejected { to: bridge });
    }

    #[test]
    fn events_carry_the_tuple() {
        let (mut d, ids) = setup(1);
        d.controller.drain_events();
        d.controller.deposit(&ALICE, &COLLECTION, &ids, recipient()).unwrap();
        d.controller
            .initiate_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0)
            .unwrap();
        d.controller
            .complete_cancel_deposit(&ALICE, &COLLECTION, &ids, recipient(), 0, &BOB)
            .unwrap();
        let kinds: Vec<_> = d.controller.events().iter().map(BridgeEvent::kind).collect();
        assert_eq!(kinds, vec!["deposit", "deposit_cancel_initiated", "deposit_cancelled"]);
        match &d.controller.events()[2] {
            BridgeEvent::DepositCancelled { return_to, asset_ids, .. } => {
                assert_eq!(*return_to, BOB);
                assert_eq!(asset_ids, &ids);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn registry_required() {
        let options = LocalDeploymentOptions::default();
        let ledger = xnft_ledger::InMemoryLedger::new();
        let port = xnft_messaging::InMemoryMessagingPort::with_system_clock(PortConfig::default());
        let escrow = Escrow::new(options.escrow, options.admin);
        let mut controller = BridgeController::new(options.bridge, ledger, port, escrow);
        assert_eq!(
            controller.deposit(&ALICE, &COLLECTION, &[AssetId::from(1u64)], recipient()),
            Err(BridgeError::RegistryNotSet)
        );
        let err = controller
            .set_bridge_registry(TokenRegistry::new(xnft_registry::BridgePair {
                local: BOB,
                remote: Felt::from(1u64),
            }))
            .unwrap_err();
        assert!(matches!(err, BridgeError::RegistryMismatch { .. }));
    }
}
