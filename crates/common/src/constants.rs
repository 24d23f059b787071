//! Protocol Constants
//!
//! Fixed values of the C3 oracle deployment and of the Plutus data encoding.
//! None of these are configurable: an on-chain schema change requires a new
//! release of this crate.

/// Token names minted under a network's minting policy
pub mod tokens {
    /// NFT marking the output that carries the published price feed
    pub const ORACLE_FEED: &[u8] = b"OracleFeed";
    /// NFT marking the output that carries the aggregation state and settings
    pub const AGG_STATE: &[u8] = b"AggState";
    /// Quantity each oracle NFT is minted with
    pub const NFT_QUANTITY: u64 = 1;
}

/// Ledger limits
pub mod ledger {
    /// Minting policy hash length (blake2b-224)
    pub const POLICY_ID_LEN: usize = 28;
    /// Maximum asset name length
    pub const MAX_ASSET_NAME_LEN: usize = 32;
    /// Blockfrost/Kupo unit for the native coin
    pub const LOVELACE_UNIT: &str = "lovelace";
}

/// CBOR layout of Plutus data
pub mod plutus {
    /// Tag of constructor alternative 0 (alternatives 0..=6 are 121..=127)
    pub const CONSTR_TAG_BASE: u64 = 121;
    /// Last compact tag for the first seven alternatives
    pub const CONSTR_TAG_BASE_END: u64 = 127;
    /// Tag of constructor alternative 7 (alternatives 7..=127 are 1280..=1400)
    pub const CONSTR_TAG_EXT_BASE: u64 = 1280;
    /// Last tag of the extended compact range
    pub const CONSTR_TAG_EXT_END: u64 = 1400;
    /// First alternative encoded in the extended range
    pub const CONSTR_EXT_FIRST_ALT: u64 = 7;
    /// Last alternative with a compact tag
    pub const CONSTR_EXT_LAST_ALT: u64 = 127;
    /// General constructor form: tag 102 over `[alternative, fields]`
    pub const CONSTR_TAG_GENERAL: u64 = 102;
    /// Positive big integer
    pub const BIGNUM_POS_TAG: u64 = 2;
    /// Negative big integer
    pub const BIGNUM_NEG_TAG: u64 = 3;
    /// Byte strings longer than this are written as indefinite chunks
    pub const BYTES_CHUNK_SIZE: usize = 64;
}

/// Constructor tags and arities of the oracle datums
pub mod schema {
    /// Feed datum wrapper (`GenericData`)
    pub const GENERIC_DATA_TAG: u64 = 0;
    pub const GENERIC_DATA_ARITY: usize = 1;

    /// Price snapshot (`PriceData`, a CIP oracle price map)
    pub const PRICE_DATA_TAG: u64 = 2;
    pub const PRICE_DATA_ARITY: usize = 1;

    /// Keys of the price map
    pub const PRICE_KEY: i128 = 0;
    pub const TIMESTAMP_KEY: i128 = 1;
    pub const EXPIRY_KEY: i128 = 2;

    /// Aggregate-state datum (`AggDatum`)
    pub const AGG_DATUM_TAG: u64 = 2;
    pub const AGG_DATUM_ARITY: usize = 1;

    /// Aggregate state (`AggState`)
    pub const AGG_STATE_TAG: u64 = 0;
    pub const AGG_STATE_ARITY: usize = 1;

    /// Aggregation settings (`OracleSettings`)
    pub const ORACLE_SETTINGS_TAG: u64 = 0;
    pub const ORACLE_SETTINGS_ARITY: usize = 11;

    /// Reward split (`NodeFeePrice`)
    pub const NODE_FEE_PRICE_TAG: u64 = 0;
    pub const NODE_FEE_PRICE_ARITY: usize = 3;

    /// Platform signatory policy (`OraclePlatform`)
    pub const ORACLE_PLATFORM_TAG: u64 = 0;
    pub const ORACLE_PLATFORM_ARITY: usize = 2;
}

/// Unit scaling applied by the derived accessors
pub mod units {
    /// Prices are fixed point with 6 decimals
    pub const PRICE_PRECISION: i64 = 1_000_000;
    /// Timestamps and durations are in milliseconds
    pub const MILLIS_PER_SECOND: i64 = 1_000;
    pub const MILLIS_PER_MINUTE: i64 = 60_000;
    /// Percentages are stored multiplied by 100 (250 = 2.5%)
    pub const BASIS_POINTS_PER_PERCENT: i64 = 100;
    /// Display format of calendar times (UTC)
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
}
