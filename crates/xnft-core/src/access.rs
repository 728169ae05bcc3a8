//! # Access Control
//!
//! Two authorization mechanisms used by the bridge:
//!
//! - [`RoleStore`]: a per-contract map of accounts to [`Role`]s. The escrow
//!   uses it to decide who may pull custody back out (`Withdrawer`) and who
//!   may change the role assignment (`Admin`). Grants and revocations take
//!   effect on the very next check.
//!
//! - [`OwnerDirectory`]: discovery of a collection's administrative owner.
//!   The registry asks it before accepting a mapping. The lookup answers
//!   with an [`OwnerProbe`], which keeps "no owner accessor" apart from
//!   "the accessor failed" so callers never have to guess.
//!
//! ## Trust Boundary
//!
//! A collection that reports [`OwnerProbe::NoOwner`] may be registered by
//! any caller. A collection that reports an owner can only be registered
//! by that owner, and [`OwnerProbe::ProbeFailed`] authorizes nobody.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Address;

// ─── Role ────────────────────────────────────────────────────────────

/// Roles granted on a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May grant and revoke every role.
    Admin,
    /// May approve escrowed assets out of custody.
    Withdrawer,
}

impl Role {
    /// String form of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Withdrawer => "withdrawer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The account lacks the role required for the operation.
    #[error("account {account} is missing role {role}")]
    MissingRole {
        /// The caller.
        account: Address,
        /// The role that was required.
        role: Role,
    },
}

// ─── RoleStore ───────────────────────────────────────────────────────

/// Role assignments for one contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleStore {
    grants: BTreeMap<Role, BTreeSet<Address>>,
}

/// A role store that several components observe at once.
pub type SharedRoleStore = Arc<RwLock<RoleStore>>;

impl RoleStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with `admin` holding [`Role::Admin`].
    pub fn with_admin(admin: Address) -> Self {
        let mut store = Self::new();
        store.grant(Role::Admin, admin);
        store
    }

    /// Wrap into a shared handle.
    pub fn into_shared(self) -> SharedRoleStore {
        Arc::new(RwLock::new(self))
    }

    /// Grant `role` to `account`. Returns `false` if already held.
    pub fn grant(&mut self, role: Role, account: Address) -> bool {
        self.grants.entry(role).or_default().insert(account)
    }

    /// Revoke `role` from `account`. Returns `false` if not held.
    pub fn revoke(&mut self, role: Role, account: &Address) -> bool {
        self.grants
            .get_mut(&role)
            .map(|holders| holders.remove(account))
            .unwrap_or(false)
    }

    /// Whether `account` holds `role`.
    pub fn has(&self, role: Role, account: &Address) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|holders| holders.contains(account))
    }

    /// Require that `account` holds `role`.
    pub fn authorize(&self, role: Role, account: &Address) -> Result<(), AccessError> {
        if self.has(role, account) {
            Ok(())
        } else {
            Err(AccessError::MissingRole {
                account: *account,
                role,
            })
        }
    }

    /// Every account holding `role`, in address order.
    pub fn holders(&self, role: Role) -> Vec<Address> {
        self.grants
            .get(&role)
            .map(|holders| holders.iter().copied().collect())
            .unwrap_or_default()
    }
}

// ─── Ownership Discovery ─────────────────────────────────────────────

/// Result of asking a collection who administers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "owner", rename_all = "snake_case")]
pub enum OwnerProbe {
    /// The collection exposes an owner.
    HasOwner(Address),
    /// The collection has no owner accessor, or answers without data.
    NoOwner,
    /// The owner accessor exists but failed.
    ProbeFailed,
}

/// Anything that can report the administrative owner of a collection.
pub trait OwnerDirectory {
    /// Probe `collection` for its owner.
    fn probe_owner(&self, collection: &Address) -> OwnerProbe;
}
