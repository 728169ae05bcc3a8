//! # Word Digests
//!
//! Message hashes and deposit commitments are SHA-256 digests over a
//! sequence of fixed-width 32-byte words. Each digest begins with a domain
//! tag so that an outbound-message hash can never collide with an inbound
//! one or with a commitment over the same words.
//!
//! Words are fed big-endian. Integers and addresses are left-padded to 32
//! bytes, so the hashed byte stream is a fixed function of the values and
//! never of their textual form.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::identity::{u256_to_be_bytes, Address, AssetId, Felt};
use primitive_types::U256;

/// A 32-byte SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest32([u8; 32]);

impl Digest32 {
    /// Wrap raw digest bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest32({})", self.to_hex())
    }
}

impl Serialize for Digest32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(digits).map_err(serde::de::Error::custom)?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("digest must be 32 bytes"))?;
        Ok(Self(array))
    }
}

/// Incremental SHA-256 over 32-byte words, opened with a domain tag.
pub struct WordHasher {
    inner: Sha256,
}

impl WordHasher {
    /// Start a digest under `domain`. The tag is length-prefixed.
    pub fn new(domain: &str) -> Self {
        let mut inner = Sha256::new();
        inner.update((domain.len() as u64).to_be_bytes());
        inner.update(domain.as_bytes());
        Self { inner }
    }

    /// Feed one raw word.
    pub fn word(&mut self, word: &[u8; 32]) -> &mut Self {
        self.inner.update(word);
        self
    }

    /// Feed a field element.
    pub fn felt(&mut self, value: &Felt) -> &mut Self {
        self.word(&value.to_be_bytes())
    }

    /// Feed a local address, left-padded to a full word.
    pub fn address(&mut self, value: &Address) -> &mut Self {
        self.word(&u256_to_be_bytes(&value.to_u256()))
    }

    /// Feed a full 256-bit asset id.
    pub fn asset(&mut self, value: &AssetId) -> &mut Self {
        self.word(&value.to_be_bytes())
    }

    /// Feed an unsigned integer as a word.
    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.word(&u256_to_be_bytes(&U256::from(value)))
    }

    /// Finish and return the digest.
    pub fn finish(&mut self) -> Digest32 {
        let hash = std::mem::take(&mut self.inner).finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        Digest32(bytes)
    }
}
