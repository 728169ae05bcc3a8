//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the three kinds of value that cross the bridge.
//! These prevent accidental confusion between domains: a remote recipient
//! (`Felt`) cannot be passed where a local claimant (`Address`) is
//! expected, and a 256-bit `AssetId` cannot be placed in a payload without
//! being split first.
//!
//! ## Field Bound
//!
//! The remote domain's native word is an element of the prime field
//! `P = 2^251 + 17·2^192 + 1`. [`Felt`] constructors reject any value
//! `>= P`, so every `Felt` in the system is a value the remote side can
//! represent.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// The remote field modulus `2^251 + 17·2^192 + 1`, as little-endian limbs.
pub const FELT_MODULUS: U256 = U256([1, 0, 0, 0x0800_0000_0000_0011]);

/// Big-endian 32-byte encoding of a `U256`.
pub(crate) fn u256_to_be_bytes(value: &U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, limb) in value.0.iter().rev().enumerate() {
        out[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_be_bytes());
    }
    out
}

/// Parse a `U256` from `0x`-prefixed hex or plain decimal.
pub(crate) fn parse_u256(input: &str) -> Result<U256, CoreError> {
    let trimmed = input.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex_digits) if !hex_digits.is_empty() => U256::from_str_radix(hex_digits, 16)
            .map_err(|e| format!("{e:?}")),
        Some(_) => Err("empty hex literal".to_string()),
        None if trimmed.is_empty() => Err("empty input".to_string()),
        None => U256::from_dec_str(trimmed).map_err(|e| format!("{e:?}")),
    };
    parsed.map_err(|reason| CoreError::InvalidInteger {
        input: input.to_string(),
        reason,
    })
}

// ─── Address ─────────────────────────────────────────────────────────

/// A 20-byte account or contract address on the local domain.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Wrap raw address bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// An address whose every byte is `byte`. Handy for fixtures.
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; 20])
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The address as an unsigned integer.
    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Recover an address from an integer, rejecting values wider than 160 bits.
    pub fn from_u256(value: &U256) -> Option<Self> {
        if value.bits() > 160 {
            return None;
        }
        let bytes = u256_to_be_bytes(value);
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes[12..]);
        Some(Self(out))
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| CoreError::InvalidAddress {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        let array: [u8; 20] = bytes.try_into().map_err(|v: Vec<u8>| CoreError::InvalidAddress {
            input: s.to_string(),
            reason: format!("expected 20 bytes, got {}", v.len()),
        })?;
        Ok(Self(array))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─── Felt ────────────────────────────────────────────────────────────

/// A remote-domain field element, always strictly below [`FELT_MODULUS`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Felt(U256);

impl Felt {
    /// The zero element. Used as "absent" by the token registry.
    pub const ZERO: Felt = Felt(U256([0, 0, 0, 0]));

    /// Create a field element, rejecting values at or above the modulus.
    pub fn new(value: U256) -> Result<Self, CoreError> {
        if value >= FELT_MODULUS {
            return Err(CoreError::FeltOutOfRange {
                value: format!("{value:#x}"),
            });
        }
        Ok(Self(value))
    }

    /// Any 128-bit value is a valid field element.
    pub fn from_u128(value: u128) -> Self {
        Self(U256::from(value))
    }

    /// Embed a local address. A 160-bit value always fits the field.
    pub fn from_address(address: &Address) -> Self {
        Self(address.to_u256())
    }

    /// The underlying integer.
    pub fn value(&self) -> U256 {
        self.0
    }

    /// Whether this is the zero element.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Interpret the element as a local address, if it fits in 160 bits.
    pub fn to_address(&self) -> Option<Address> {
        Address::from_u256(&self.0)
    }

    /// Big-endian 32-byte word.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        u256_to_be_bytes(&self.0)
    }
}

impl From<u64> for Felt {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl FromStr for Felt {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(parse_u256(s)?)
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Debug for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Felt({self})")
    }
}

impl Serialize for Felt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Felt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─── AssetId ─────────────────────────────────────────────────────────

/// A 256-bit identifier of one asset within a collection.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetId(U256);

impl AssetId {
    /// Wrap a 256-bit value.
    pub const fn new(value: U256) -> Self {
        Self(value)
    }

    /// The underlying integer.
    pub fn value(&self) -> U256 {
        self.0
    }

    /// Big-endian 32-byte word.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        u256_to_be_bytes(&self.0)
    }
}

impl From<u64> for AssetId {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for AssetId {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl FromStr for AssetId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u256(s).map(Self)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.0)
    }
}

impl Serialize for AssetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
