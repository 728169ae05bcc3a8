//! # Split/Join Codec and Transfer Payload Layout
//!
//! Asset identifiers are 256-bit integers, but the remote domain's word is a
//! ~252-bit field element. Every asset id therefore crosses the bridge as a
//! `(low, high)` pair of 128-bit limbs:
//!
//! ```text
//! low  = id mod 2^128
//! high = id >> 128
//! id   = high · 2^128 + low
//! ```
//!
//! Both limbs always fit the field, and `join(split(id)) == id` for every
//! 256-bit value.
//!
//! ## Payload Layout
//!
//! The same layout is used in both directions:
//!
//! ```text
//! [ head_collection, counterparty, other_collection, 2·n, low_0, high_0, …, low_{n-1}, high_{n-1} ]
//! ```
//!
//! Outbound (deposit) messages carry the remote collection, the remote
//! recipient and the local collection. Inbound (withdrawal) messages carry
//! the remote collection, the local claimant and the local collection.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::identity::{Address, AssetId, Felt};

/// Width of one limb.
pub const LIMB_BITS: usize = 128;

/// Number of header words before the limb pairs.
const HEADER_WORDS: usize = 4;

/// An asset identifier split into two 128-bit limbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAssetId {
    /// Lower 128 bits.
    pub low: Felt,
    /// Upper 128 bits.
    pub high: Felt,
}

/// Split a 256-bit asset id into `(low, high)` limbs.
pub fn split_asset_id(id: &AssetId) -> SplitAssetId {
    let value = id.value();
    SplitAssetId {
        low: Felt::from_u128(value.low_u128()),
        high: Felt::from_u128((value >> LIMB_BITS).low_u128()),
    }
}

/// Reassemble an asset id from its limbs.
///
/// # Errors
///
/// Returns [`CodecError::LimbOutOfRange`] if either limb is 2^128 or larger.
pub fn join_asset_id(low: &Felt, high: &Felt) -> Result<AssetId, CodecError> {
    check_limb("low", low)?;
    check_limb("high", high)?;
    Ok(AssetId::new((high.value() << LIMB_BITS) | low.value()))
}

fn check_limb(limb: &'static str, value: &Felt) -> Result<(), CodecError> {
    if value.value().bits() > LIMB_BITS {
        return Err(CodecError::LimbOutOfRange {
            limb,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// The structured form of a bridge message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    /// First header word: always the remote-domain collection.
    pub head_collection: Felt,
    /// Second header word: remote recipient (outbound) or local claimant (inbound).
    pub counterparty: Felt,
    /// Third header word: the local collection address.
    pub other_collection: Felt,
    /// The assets carried, in message order.
    pub asset_ids: Vec<AssetId>,
}

impl TransferPayload {
    /// Body of an outbound deposit message.
    pub fn deposit(
        remote_collection: Felt,
        remote_recipient: Felt,
        local_collection: &Address,
        asset_ids: &[AssetId],
    ) -> Self {
        Self {
            head_collection: remote_collection,
            counterparty: remote_recipient,
            other_collection: Felt::from_address(local_collection),
            asset_ids: asset_ids.to_vec(),
        }
    }

    /// Body of an inbound withdrawal message.
    pub fn withdrawal(
        remote_collection: Felt,
        claimant: &Address,
        local_collection: &Address,
        asset_ids: &[AssetId],
    ) -> Self {
        Self {
            head_collection: remote_collection,
            counterparty: Felt::from_address(claimant),
            other_collection: Felt::from_address(local_collection),
            asset_ids: asset_ids.to_vec(),
        }
    }

    /// Encode into the word sequence carried by the messaging port.
    pub fn encode(&self) -> Vec<Felt> {
        let mut words = Vec::with_capacity(HEADER_WORDS + 2 * self.asset_ids.len());
        words.push(self.head_collection);
        words.push(self.counterparty);
        words.push(self.other_collection);
        words.push(Felt::from(2 * self.asset_ids.len() as u64));
        for id in &self.asset_ids {
            let split = split_asset_id(id);
            words.push(split.low);
            words.push(split.high);
        }
        words
    }

    /// Decode a word sequence.
    ///
    /// # Errors
    ///
    /// - [`CodecError::PayloadTooShort`] if the header is incomplete.
    /// - [`CodecError::LengthMismatch`] if the length word is not exactly
    ///   the number of limb words that follow.
    /// - [`CodecError::LimbOutOfRange`] if a limb exceeds 128 bits.
    pub fn decode(words: &[Felt]) -> Result<Self, CodecError> {
        if words.len() < HEADER_WORDS {
            return Err(CodecError::PayloadTooShort {
                len: words.len(),
                min: HEADER_WORDS,
            });
        }
        let limbs = &words[HEADER_WORDS..];
        let declared = words[3].value();
        if declared != U256::from(limbs.len()) || limbs.len() % 2 != 0 {
            return Err(CodecError::LengthMismatch {
                declared: words[3].to_string(),
                actual: limbs.len(),
            });
        }
        let asset_ids = limbs
            .chunks_exact(2)
            .map(|pair| join_asset_id(&pair[0], &pair[1]))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            head_collection: words[0],
            counterparty: words[1],
            other_collection: words[2],
            asset_ids,
        })
    }

    /// The local collection named by the third header word.
    pub fn local_collection(&self) -> Result<Address, CodecError> {
        self.other_collection
            .to_address()
            .ok_or_else(|| CodecError::NotAnAddress {
                index: 2,
                value: self.other_collection.to_string(),
            })
    }

    /// The second header word read as a local claimant.
    pub fn claimant(&self) -> Result<Address, CodecError> {
        self.counterparty
            .to_address()
            .ok_or_else(|| CodecError::NotAnAddress {
                index: 1,
                value: self.counterparty.to_string(),
            })
    }
}
