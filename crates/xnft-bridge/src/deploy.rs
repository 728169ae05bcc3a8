//! # Local Deployment
//!
//! Wires an in-memory ledger, an in-memory port on a [`ManualClock`], an
//! escrow, a registry and a controller together the way a real deployment
//! is wired:
//!
//! 1. The escrow's receiver hook is registered under its address.
//! 2. The controller's address is registered with a reject-all hook, so a
//!    direct receiver-checked transfer to it fails.
//! 3. The admin grants the controller `Withdrawer` on the escrow.
//! 4. A registry naming the controller as its local bridge is attached.
//!
//! Also carries the remote-side helpers used by tests and the simulator.

use std::sync::Arc;

use xnft_core::{Address, AssetId, Felt, ManualClock, TransferPayload};
use xnft_escrow::Escrow;
use xnft_ledger::{AssetLedger, InMemoryLedger, LedgerError, OwnerAccessor, RejectAll};
use xnft_messaging::{InMemoryMessagingPort, MessageHash, OutboundMessage, PortConfig};
use xnft_registry::{BridgePair, TokenRegistry};

use crate::config::BridgeConfig;
use crate::controller::BridgeController;
use crate::error::BridgeError;

/// The controller type of a [`LocalDeployment`].
pub type LocalController = BridgeController<InMemoryLedger, InMemoryMessagingPort>;

/// Addresses and tunables for a [`LocalDeployment`].
#[derive(Debug, Clone)]
pub struct LocalDeploymentOptions {
    /// Controller configuration. Its `address` is the controller address.
    pub bridge: BridgeConfig,
    /// Port configuration.
    pub port: PortConfig,
    /// Escrow admin.
    pub admin: Address,
    /// Escrow address.
    pub escrow: Address,
    /// Remote bridge contract.
    pub remote_bridge: Felt,
}

impl Default for LocalDeploymentOptions {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig {
                address: Address::repeat_byte(0xb1),
                ..BridgeConfig::default()
            },
            port: PortConfig::default(),
            admin: Address::repeat_byte(0xad),
            escrow: Address::repeat_byte(0xe5),
            remote_bridge: Felt::from(0x0b1d_9e00_u64),
        }
    }
}

/// A fully wired in-memory deployment.
pub struct LocalDeployment {
    /// The controller, owning the ledger and the port.
    pub controller: LocalController,
    /// The port's clock.
    pub clock: ManualClock,
    /// The escrow admin.
    pub admin: Address,
}

impl LocalDeployment {
    /// Wire a deployment.
    pub fn new(options: LocalDeploymentOptions) -> Result<Self, BridgeError> {
        let bridge_address = options.bridge.address;
        let clock = ManualClock::at_epoch();

        let escrow = Escrow::new(options.escrow, options.admin);
        let mut ledger = InMemoryLedger::new();
        ledger.register_receiver(options.escrow, escrow.receiver());
        ledger.register_receiver(bridge_address, Arc::new(RejectAll));
        escrow.grant_withdrawer(&options.admin, bridge_address)?;

        let port = InMemoryMessagingPort::new(options.port, Arc::new(clock.clone()));
        let mut controller = BridgeController::new(options.bridge, ledger, port, escrow);
        controller.set_bridge_registry(TokenRegistry::new(BridgePair {
            local: bridge_address,
            remote: options.remote_bridge,
        }))?;

        Ok(Self {
            controller,
            clock,
            admin: options.admin,
        })
    }

    /// Deploy a collection, mint `count` assets to `holder`, and make the
    /// controller an operator for `holder`.
    pub fn collection_with_holder(
        &mut self,
        collection: Address,
        accessor: OwnerAccessor,
        holder: &Address,
        count: u64,
    ) -> Result<Vec<AssetId>, LedgerError> {
        let bridge = self.controller.address();
        let ledger = self.controller.ledger_mut();
        ledger.create_collection(collection, accessor);
        let ids = ledger.mint_batch(&collection, holder, count)?;
        ledger.set_approval_for_all(holder, &collection, &bridge, true)?;
        Ok(ids)
    }

    /// Have the remote bridge handle a deposit message.
    pub fn relay_deposit(&mut self, hash: &MessageHash) -> Result<OutboundMessage, BridgeError> {
        Ok(self.controller.port_mut().consume_on_remote(hash)?)
    }

    /// Have the remote bridge send back a withdrawal message for
    /// `asset_ids` of `collection`, naming `claimant`.
    pub fn bridge_back(
        &mut self,
        collection: &Address,
        asset_ids: &[AssetId],
        claimant: &Address,
    ) -> Result<MessageHash, BridgeError> {
        let registry = self.controller.registry().ok_or(BridgeError::RegistryNotSet)?;
        let remote_collection = registry.get_remote_token(collection);
        let remote_bridge = registry.standard_token_bridge().remote;
        let payload =
            TransferPayload::withdrawal(remote_collection, claimant, collection, asset_ids).encode();
        let to = self.controller.address();
        Ok(self
            .controller
            .port_mut()
            .send_from_remote(remote_bridge, to, payload)?)
    }
}
