//! Core Types for the C3 Feed Reader
//!
//! Ledger-side data handed to the locator by the indexing collaborator:
//! asset identities, asset bundles, outputs and their raw datums.

use core::fmt;
use std::collections::BTreeMap;

use serde::Deserialize;

use crate::constants::{ledger, tokens};
use crate::errors::{FeedError, FeedResult};

/// Type alias for public key hashes (node operators, platform signatories)
pub type PubKeyHash = Vec<u8>;

// ============ Asset Identity ============

/// Minting policy hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolicyId([u8; ledger::POLICY_ID_LEN]);

impl PolicyId {
    pub const fn new(bytes: [u8; ledger::POLICY_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a policy id from its 56-character hex form
    pub fn from_hex(value: &str) -> FeedResult<Self> {
        let bytes = hex::decode(value.trim()).map_err(|e| FeedError::InvalidInput {
            param: "policy_id",
            reason: e.to_string(),
        })?;
        let bytes: [u8; ledger::POLICY_ID_LEN] =
            bytes.try_into().map_err(|b: Vec<u8>| FeedError::InvalidInput {
                param: "policy_id",
                reason: format!("expected {} bytes, got {}", ledger::POLICY_ID_LEN, b.len()),
            })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Asset name under a policy (0 to 32 bytes)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    pub fn new(bytes: impl Into<Vec<u8>>) -> FeedResult<Self> {
        let bytes = bytes.into();
        if bytes.len() > ledger::MAX_ASSET_NAME_LEN {
            return Err(FeedError::InvalidInput {
                param: "asset_name",
                reason: format!(
                    "{} bytes exceeds the {} byte limit",
                    bytes.len(),
                    ledger::MAX_ASSET_NAME_LEN
                ),
            });
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(value: &str) -> FeedResult<Self> {
        let bytes = hex::decode(value).map_err(|e| FeedError::InvalidInput {
            param: "asset_name",
            reason: e.to_string(),
        })?;
        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match core::str::from_utf8(&self.0) {
            Ok(text) if text.chars().all(|c| c.is_ascii_graphic()) => f.write_str(text),
            _ => f.write_str(&self.to_hex()),
        }
    }
}

/// Identity of a native asset: (policy id, asset name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetFingerprint {
    pub policy_id: PolicyId,
    pub asset_name: AssetName,
}

impl AssetFingerprint {
    pub fn new(policy_id: PolicyId, asset_name: AssetName) -> Self {
        Self {
            policy_id,
            asset_name,
        }
    }

    /// Fingerprint of the feed NFT of a network
    pub fn oracle_feed(policy_id: PolicyId) -> Self {
        Self::new(policy_id, AssetName(tokens::ORACLE_FEED.to_vec()))
    }

    /// Fingerprint of the aggregate-state NFT of a network
    pub fn aggregate_state(policy_id: PolicyId) -> Self {
        Self::new(policy_id, AssetName(tokens::AGG_STATE.to_vec()))
    }

    /// Parse a concatenated `policy_hex ++ name_hex` unit
    pub fn from_unit(unit: &str) -> FeedResult<Self> {
        let split = ledger::POLICY_ID_LEN * 2;
        if unit.len() < split || !unit.is_char_boundary(split) {
            return Err(FeedError::InvalidInput {
                param: "unit",
                reason: format!("'{unit}' is shorter than a policy id"),
            });
        }
        let (policy, name) = unit.split_at(split);
        Ok(Self::new(PolicyId::from_hex(policy)?, AssetName::from_hex(name)?))
    }
}

impl fmt::Display for AssetFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.policy_id, self.asset_name)
    }
}

// ============ Asset Bundle ============

/// Native assets held by an output (lovelace excluded)
///
/// Zero quantities are never stored, so two bundles holding the same
/// positive quantities compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetBundle(BTreeMap<PolicyId, BTreeMap<AssetName, u64>>);

impl AssetBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle holding a single asset
    pub fn singleton(fingerprint: &AssetFingerprint, quantity: u64) -> Self {
        let mut bundle = Self::new();
        bundle.insert(fingerprint.clone(), quantity);
        bundle
    }

    /// Add `quantity` of an asset
    pub fn insert(&mut self, fingerprint: AssetFingerprint, quantity: u64) {
        if quantity == 0 {
            return;
        }
        let held = self
            .0
            .entry(fingerprint.policy_id)
            .or_default()
            .entry(fingerprint.asset_name)
            .or_insert(0);
        *held = held.saturating_add(quantity);
    }

    /// Quantity held of an asset (0 if absent)
    pub fn quantity_of(&self, fingerprint: &AssetFingerprint) -> u64 {
        self.0
            .get(&fingerprint.policy_id)
            .and_then(|names| names.get(&fingerprint.asset_name))
            .copied()
            .unwrap_or(0)
    }

    /// True if every asset of `other` is held here in at least the same quantity
    pub fn contains(&self, other: &AssetBundle) -> bool {
        other.iter().all(|(policy_id, asset_name, quantity)| {
            self.0
                .get(policy_id)
                .and_then(|names| names.get(asset_name))
                .is_some_and(|held| *held >= quantity)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct assets
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PolicyId, &AssetName, u64)> {
        self.0.iter().flat_map(|(policy_id, names)| {
            names
                .iter()
                .map(move |(asset_name, quantity)| (policy_id, asset_name, *quantity))
        })
    }
}

impl FromIterator<(AssetFingerprint, u64)> for AssetBundle {
    fn from_iter<I: IntoIterator<Item = (AssetFingerprint, u64)>>(iter: I) -> Self {
        let mut bundle = Self::new();
        for (fingerprint, quantity) in iter {
            bundle.insert(fingerprint, quantity);
        }
        bundle
    }
}

// ============ Outputs ============

/// Opaque datum bytes (CBOR encoded Plutus data)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDatum(Vec<u8>);

impl RawDatum {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_hex(value: &str) -> FeedResult<Self> {
        hex::decode(value.trim())
            .map(Self)
            .map_err(|e| FeedError::InvalidInput {
                param: "datum",
                reason: e.to_string(),
            })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl From<Vec<u8>> for RawDatum {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// An unspent output as returned by the indexing collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutput {
    /// Hash of the producing transaction (hex)
    pub tx_hash: String,
    /// Index within the producing transaction
    pub output_index: u32,
    /// Bech32 address holding the output
    pub address: String,
    /// Lovelace held
    pub coin: u64,
    /// Native assets held
    pub assets: AssetBundle,
    /// Attached datum, already resolved inline
    pub datum: Option<RawDatum>,
}

impl ChainOutput {
    /// Datum of the output, or `MissingDatum`
    pub fn datum(&self) -> FeedResult<&RawDatum> {
        self.datum.as_ref().ok_or_else(|| FeedError::MissingDatum {
            tx_hash: self.tx_hash.clone(),
            output_index: self.output_index,
        })
    }

    /// `tx_hash#index` reference
    pub fn output_ref(&self) -> String {
        format!("{}#{}", self.tx_hash, self.output_index)
    }
}

// ============ Match Policies ============

/// How an output's bundle is compared with a fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Bundle is exactly `{fingerprint: 1}`
    Exact,
    /// Bundle holds the fingerprint, possibly alongside other assets
    Superset,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::Superset => f.write_str("superset"),
        }
    }
}

/// What the locator does when several outputs match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UniquenessPolicy {
    /// Trust the one-mint-per-NFT invariant and take the first match
    #[default]
    AssumeUnique,
    /// Fail with `AmbiguousMatch` on a second match
    VerifyUnique,
}
