//! C3 Feed Common Library
//!
//! Reads Charli3 (C3) oracle networks on Cardano. Each network publishes two
//! outputs at its address, each marked by an NFT minted under the network's
//! minting policy:
//!
//! - **`OracleFeed`**: the latest aggregated price with its creation and
//!   expiry times
//! - **`AggState`**: the aggregation settings (node list, thresholds, reward
//!   split, platform multisig)
//!
//! This crate holds the chain-independent half of a reader:
//!
//! - **Locator**: picks the output holding a given NFT
//! - **Plutus codec**: CBOR Plutus data to typed records and back
//! - **Datums**: the oracle records with their display accessors
//!
//! Fetching outputs from an indexer lives in the `c3-network-feed` crate.

pub mod constants;
pub mod datums;
pub mod errors;
pub mod locator;
pub mod plutus;
pub mod types;
pub mod units;


pub use datums::{
    decode_price, decode_settings, AggDatum, AggState, GenericData, NodeFeePrice, OraclePlatform,
    OracleSettings, PriceData,
};
pub use errors::{FeedError, FeedResult, MalformedReason};
pub use locator::{locate, locate_aggregate_output, locate_feed_output};
pub use plutus::{decode, encode, DataKind, PlutusData, PlutusRecord};
pub use types::*;
