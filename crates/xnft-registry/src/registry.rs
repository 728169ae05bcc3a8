//! # Token Registry
//!
//! Holds the `local collection → remote collection` table and the standard
//! bridge pair. Lookups of unmapped collections return [`Felt::ZERO`]
//! rather than an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xnft_core::{Address, Felt, OwnerDirectory, OwnerProbe};

use crate::error::RegistryError;

/// The bridge contracts on either side of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgePair {
    /// The local bridge controller.
    pub local: Address,
    /// The remote bridge contract.
    pub remote: Felt,
}

/// Emitted on every successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A new mapping was written.
    TokenRegistered {
        /// Account that registered it.
        caller: Address,
        /// The local collection.
        collection: Address,
        /// Its remote counterpart.
        remote: Felt,
    },
}

/// The registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRegistry {
    standard_bridge: BridgePair,
    mappings: BTreeMap<Address, Felt>,
    #[serde(skip)]
    events: Vec<RegistryEvent>,
}

impl TokenRegistry {
    /// An empty registry for the given bridge pair.
    pub fn new(standard_bridge: BridgePair) -> Self {
        Self {
            standard_bridge,
            mappings: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// The standard bridge pair this registry serves.
    pub fn standard_token_bridge(&self) -> BridgePair {
        self.standard_bridge
    }

    /// Map `collection` to `remote`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Unauthorized`] if the ownership check fails.
    /// - [`RegistryError::InvalidRemoteToken`] if `remote` is zero.
    /// - [`RegistryError::AlreadyRegistered`] if any mapping exists, even
    ///   an identical one.
    pub fn register_token(
        &mut self,
        directory: &dyn OwnerDirectory,
        caller: &Address,
        collection: Address,
        remote: Felt,
    ) -> Result<(), RegistryError> {
        authorize(directory, caller, &collection)?;
        if remote.is_zero() {
            return Err(RegistryError::InvalidRemoteToken { collection });
        }
        if let Some(existing) = self.mappings.get(&collection) {
            return Err(RegistryError::AlreadyRegistered {
                collection,
                existing: *existing,
            });
        }
        self.mappings.insert(collection, remote);
        tracing::info!(%caller, %collection, %remote, "token registered");
        self.events.push(RegistryEvent::TokenRegistered {
            caller: *caller,
            collection,
            remote,
        });
        Ok(())
    }

    /// The remote counterpart of `collection`, or zero when unmapped.
    pub fn get_remote_token(&self, collection: &Address) -> Felt {
        self.mappings.get(collection).copied().unwrap_or(Felt::ZERO)
    }

    /// Whether `collection` is mapped.
    pub fn is_registered(&self, collection: &Address) -> bool {
        self.mappings.contains_key(collection)
    }

    /// Events emitted so far.
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// Take and clear the event log.
    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }
}

fn authorize(
    directory: &dyn OwnerDirectory,
    caller: &Address,
    collection: &Address,
) -> Result<(), RegistryError> {
    match directory.probe_owner(collection) {
        OwnerProbe::HasOwner(owner) if owner == *caller => Ok(()),
        OwnerProbe::HasOwner(_) => Err(RegistryError::Unauthorized {
            caller: *caller,
            collection: *collection,
            reason: "caller is not the collection owner",
        }),
        OwnerProbe::NoOwner => {
            tracing::debug!(%caller, %collection, "collection exposes no owner, registration is open");
            Ok(())
        }
        OwnerProbe::ProbeFailed => Err(RegistryError::Unauthorized {
            caller: *caller,
            collection: *collection,
            reason: "owner probe failed",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xnft_ledger::{InMemoryLedger, OwnerAccessor};

    const COLLECTION: Address = Address::repeat_byte(0xc0);
    const OWNER: Address = Address::repeat_byte(0x0a);
    const STRANGER: Address = Address::repeat_byte(0x5e);

    fn pair() -> BridgePair {
        BridgePair {
            local: Address::repeat_byte(0xb1),
            remote: Felt::from(0xb2u64),
        }
    }

    fn ledger(accessor: OwnerAccessor) -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new();
        ledger.create_collection(COLLECTION, accessor);
        ledger
    }

    #[test]
    fn owner_can_register() {
        let ledger = ledger(OwnerAccessor::Ownable(OWNER));
        let mut registry = TokenRegistry::new(pair());
        registry
            .register_token(&ledger, &OWNER, COLLECTION, Felt::from(42u64))
            .unwrap();
        assert_eq!(registry.get_remote_token(&COLLECTION), Felt::from(42u64));
        assert_eq!(registry.events().len(), 1);
    }

    #[test]
    fn stranger_cannot_register_owned_collection() {
        let ledger = ledger(OwnerAccessor::Ownable(OWNER));
        let mut registry = TokenRegistry::new(pair());
        let err = registry
            .register_token(&ledger, &STRANGER, COLLECTION, Felt::from(42u64))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));
        assert!(!registry.is_registered(&COLLECTION));
    }

    #[test]
    fn ownerless_collection_is_open() {
        for accessor in [OwnerAccessor::Absent, OwnerAccessor::SilentFallback] {
            let ledger = ledger(accessor);
            let mut registry = TokenRegistry::new(pair());
            registry
                .register_token(&ledger, &STRANGER, COLLECTION, Felt::from(42u64))
                .unwrap();
        }
    }

    #[test]
    fn failed_probe_is_unauthorized() {
        let ledger = ledger(OwnerAccessor::Reverting);
        let mut registry = TokenRegistry::new(pair());
        let err = registry
            .register_token(&ledger, &OWNER, COLLECTION, Felt::from(42u64))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Unauthorized {
                reason: "owner probe failed",
                ..
            }
        ));
    }

    #[test]
    fn second_registration_fails_even_when_identical() {
        let ledger = ledger(OwnerAccessor::Ownable(OWNER));
        let mut registry = TokenRegistry::new(pair());
        registry
            .register_token(&ledger, &OWNER, COLLECTION, Felt::from(42u64))
            .unwrap();
        for remote in [Felt::from(42u64), Felt::from(43u64)] {
            let err = registry
                .register_token(&ledger, &OWNER, COLLECTION, remote)
                .unwrap_err();
            assert_eq!(
                err,
                RegistryError::AlreadyRegistered {
                    collection: COLLECTION,
                    existing: Felt::from(42u64)
                }
            );
        }
        assert_eq!(registry.get_remote_token(&COLLECTION), Felt::from(42u64));
    }

    #[test]
    fn zero_remote_rejected() {
        let ledger = ledger(OwnerAccessor::Ownable(OWNER));
        let mut registry = TokenRegistry::new(pair());
        assert!(matches!(
            registry.register_token(&ledger, &OWNER, COLLECTION, Felt::ZERO),
            Err(RegistryError::InvalidRemoteToken { .. })
        ));
    }

    #[test]
    fn unmapped_lookup_is_zero() {
        let registry = TokenRegistry::new(pair());
        assert_eq!(registry.get_remote_token(&COLLECTION), Felt::ZERO);
        assert_eq!(registry.standard_token_bridge(), pair());
    }

    #[test]
    fn drain_clears_events() {
        let ledger = ledger(OwnerAccessor::Absent);
        let mut registry = TokenRegistry::new(pair());
        registry
            .register_token(&ledger, &OWNER, COLLECTION, Felt::from(1u64))
            .unwrap();
        let drained = registry.drain_events();
        assert_eq!(drained.len(), 1);
        assert!(registry.events().is_empty());
        let json = serde_json::to_value(&drained[0]).unwrap();
        assert_eq!(json["event"], "token_registered");
    }
}
