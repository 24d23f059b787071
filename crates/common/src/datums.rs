//! Oracle Datums
//!
//! Typed records carried by the two oracle outputs:
//!
//! ```text
//! feed output      GenericData(0) { PriceData(2) { {0: price, 1: timestamp, 2: expiry} } }
//! aggregate output AggDatum(2) { AggState(0) { OracleSettings(0) { ...11 fields } } }
//!                      OracleSettings.node_fee_price = NodeFeePrice(0) { node, aggregate, platform }
//!                      OracleSettings.platform       = OraclePlatform(0) { pkhs, threshold }
//! ```
//!
//! Every record checks its constructor tag and field count before reading a
//! field. A mismatch anywhere fails the whole decode.

use chrono::{DateTime, Utc};

use crate::constants::schema::*;
use crate::errors::FeedResult;
use crate::plutus::{decode, Fields, PlutusData, PlutusRecord};
use crate::types::{ChainOutput, PubKeyHash};
use crate::units;

// ============ Feed Datum ============

/// One oracle price observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceData {
    /// Price, 6-decimal fixed point
    pub price: i64,
    /// Creation time, ms since the Unix epoch
    pub timestamp: i64,
    /// Expiry time, ms since the Unix epoch
    pub expiry: i64,
}

impl PriceData {
    pub fn new(price: i64, timestamp: i64, expiry: i64) -> Self {
        Self {
            price,
            timestamp,
            expiry,
        }
    }

    /// Price in display units (USD per unit of the quoted asset)
    pub fn price_display(&self) -> f64 {
        units::fixed_point_to_f64(self.price)
    }

    pub fn created_at(&self) -> FeedResult<DateTime<Utc>> {
        units::millis_to_datetime(self.timestamp)
    }

    pub fn expires_at(&self) -> FeedResult<DateTime<Utc>> {
        units::millis_to_datetime(self.expiry)
    }

    /// Lifetime of the observation in ms
    pub fn validity(&self) -> i64 {
        self.expiry.saturating_sub(self.timestamp)
    }
}

impl PlutusRecord for PriceData {
    const NAME: &'static str = "PriceData";
    const CONSTR_TAG: u64 = PRICE_DATA_TAG;
    const ARITY: usize = PRICE_DATA_ARITY;

    fn decode_fields(fields: &mut Fields<'_>) -> FeedResult<Self> {
        let [price, timestamp, expiry] =
            fields.integer_map([PRICE_KEY, TIMESTAMP_KEY, EXPIRY_KEY])?;
        Ok(Self::new(price, timestamp, expiry))
    }

    fn encode_fields(&self) -> Vec<PlutusData> {
        let entry = |key: i128, value: i64| {
            (PlutusData::Integer(key), PlutusData::Integer(i128::from(value)))
        };
        vec![PlutusData::Map(vec![
            entry(PRICE_KEY, self.price),
            entry(TIMESTAMP_KEY, self.timestamp),
            entry(EXPIRY_KEY, self.expiry),
        ])]
    }
}

/// Datum of the feed output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericData {
    pub price_data: PriceData,
}

impl PlutusRecord for GenericData {
    const NAME: &'static str = "GenericData";
    const CONSTR_TAG: u64 = GENERIC_DATA_TAG;
    const ARITY: usize = GENERIC_DATA_ARITY;

    fn decode_fields(fields: &mut Fields<'_>) -> FeedResult<Self> {
        Ok(Self {
            price_data: fields.record()?,
        })
    }

    fn encode_fields(&self) -> Vec<PlutusData> {
        vec![self.price_data.to_plutus()]
    }
}

// ============ Aggregate-State Datum ============

/// Reward split of one aggregation, in C3 token units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeFeePrice {
    pub node_fee: i64,
    pub aggregate_fee: i64,
    pub platform_fee: i64,
}

impl NodeFeePrice {
    /// (node, aggregate, platform), unscaled
    pub fn rewards(&self) -> (i64, i64, i64) {
        (self.node_fee, self.aggregate_fee, self.platform_fee)
    }
}

impl PlutusRecord for NodeFeePrice {
    const NAME: &'static str = "NodeFeePrice";
    const CONSTR_TAG: u64 = NODE_FEE_PRICE_TAG;
    const ARITY: usize = NODE_FEE_PRICE_ARITY;

    fn decode_fields(fields: &mut Fields<'_>) -> FeedResult<Self> {
        Ok(Self {
            node_fee: fields.integer()?,
            aggregate_fee: fields.integer()?,
            platform_fee: fields.integer()?,
        })
    }

    fn encode_fields(&self) -> Vec<PlutusData> {
        [self.node_fee, self.aggregate_fee, self.platform_fee]
            .into_iter()
            .map(|fee| PlutusData::Integer(i128::from(fee)))
            .collect()
    }
}

/// Platform multisig policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OraclePlatform {
    /// Signatory key hashes, in on-chain order
    pub pmultisig_pkhs: Vec<PubKeyHash>,
    /// Minimum number of signatories
    pub pmultisig_threshold: i64,
}

impl OraclePlatform {
    /// (signatories, threshold), verbatim
    pub fn signatories(&self) -> (&[PubKeyHash], i64) {
        (&self.pmultisig_pkhs, self.pmultisig_threshold)
    }
}

impl PlutusRecord for OraclePlatform {
    const NAME: &'static str = "OraclePlatform";
    const CONSTR_TAG: u64 = ORACLE_PLATFORM_TAG;
    const ARITY: usize = ORACLE_PLATFORM_ARITY;

    fn decode_fields(fields: &mut Fields<'_>) -> FeedResult<Self> {
        Ok(Self {
            pmultisig_pkhs: fields.bytes_list()?,
            pmultisig_threshold: fields.integer()?,
        })
    }

    fn encode_fields(&self) -> Vec<PlutusData> {
        vec![
            bytes_list(&self.pmultisig_pkhs),
            PlutusData::Integer(i128::from(self.pmultisig_threshold)),
        ]
    }
}

/// Aggregation policy of a C3 network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleSettings {
    /// Authorized node operators, in on-chain order
    pub node_list: Vec<PubKeyHash>,
    /// Share of nodes that must have updated, percent x100
    pub updated_nodes: i64,
    /// Max age of a node update usable for aggregation, ms
    pub updated_node_time: i64,
    /// Min time between aggregations, ms
    pub aggregate_time: i64,
    /// Change against the last aggregate that forces a new one, percent x100
    pub aggregate_change: i64,
    /// Minimum C3 deposit when recharging the reward pool
    pub minimum_deposit: i64,
    /// Validity window of an aggregate transaction, ms
    pub aggregate_valid_range: i64,
    pub node_fee_price: NodeFeePrice,
    /// IQR consensus multiplier
    pub iqr_multiplier: i64,
    /// Divergence consensus threshold, percent x100
    pub divergence: i64,
    pub platform: OraclePlatform,
}

impl OracleSettings {
    pub fn node_count(&self) -> usize {
        self.node_list.len()
    }

    pub fn updated_nodes_percent(&self) -> f64 {
        units::basis_points_to_percent(self.updated_nodes)
    }

    pub fn updated_node_time_minutes(&self) -> f64 {
        units::millis_to_minutes(self.updated_node_time)
    }

    pub fn aggregate_time_minutes(&self) -> f64 {
        units::millis_to_minutes(self.aggregate_time)
    }

    pub fn aggregate_change_percent(&self) -> f64 {
        units::basis_points_to_percent(self.aggregate_change)
    }

    pub fn aggregate_valid_range_minutes(&self) -> f64 {
        units::millis_to_minutes(self.aggregate_valid_range)
    }

    pub fn divergence_percent(&self) -> f64 {
        units::basis_points_to_percent(self.divergence)
    }

    pub fn price_rewards(&self) -> (i64, i64, i64) {
        self.node_fee_price.rewards()
    }

    pub fn platform_signatories(&self) -> (&[PubKeyHash], i64) {
        self.platform.signatories()
    }
}

impl PlutusRecord for OracleSettings {
    const NAME: &'static str = "OracleSettings";
    const CONSTR_TAG: u64 = ORACLE_SETTINGS_TAG;
    const ARITY: usize = ORACLE_SETTINGS_ARITY;

    fn decode_fields(fields: &mut Fields<'_>) -> FeedResult<Self> {
        Ok(Self {
            node_list: fields.bytes_list()?,
            updated_nodes: fields.integer()?,
            updated_node_time: fields.integer()?,
            aggregate_time: fields.integer()?,
            aggregate_change: fields.integer()?,
            minimum_deposit: fields.integer()?,
            aggregate_valid_range: fields.integer()?,
            node_fee_price: fields.record()?,
            iqr_multiplier: fields.integer()?,
            divergence: fields.integer()?,
            platform: fields.record()?,
        })
    }

    fn encode_fields(&self) -> Vec<PlutusData> {
        let int = |value: i64| PlutusData::Integer(i128::from(value));
        vec![
            bytes_list(&self.node_list),
            int(self.updated_nodes),
            int(self.updated_node_time),
            int(self.aggregate_time),
            int(self.aggregate_change),
            int(self.minimum_deposit),
            int(self.aggregate_valid_range),
            self.node_fee_price.to_plutus(),
            int(self.iqr_multiplier),
            int(self.divergence),
            self.platform.to_plutus(),
        ]
    }
}

/// Aggregation state wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggState {
    pub settings: OracleSettings,
}

impl PlutusRecord for AggState {
    const NAME: &'static str = "AggState";
    const CONSTR_TAG: u64 = AGG_STATE_TAG;
    const ARITY: usize = AGG_STATE_ARITY;

    fn decode_fields(fields: &mut Fields<'_>) -> FeedResult<Self> {
        Ok(Self {
            settings: fields.record()?,
        })
    }

    fn encode_fields(&self) -> Vec<PlutusData> {
        vec![self.settings.to_plutus()]
    }
}

/// Datum of the aggregate-state output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggDatum {
    pub state: AggState,
}

impl PlutusRecord for AggDatum {
    const NAME: &'static str = "AggDatum";
    const CONSTR_TAG: u64 = AGG_DATUM_TAG;
    const ARITY: usize = AGG_DATUM_ARITY;

    fn decode_fields(fields: &mut Fields<'_>) -> FeedResult<Self> {
        Ok(Self {
            state: fields.record()?,
        })
    }

    fn encode_fields(&self) -> Vec<PlutusData> {
        vec![self.state.to_plutus()]
    }
}

fn bytes_list(items: &[PubKeyHash]) -> PlutusData {
    PlutusData::List(items.iter().cloned().map(PlutusData::Bytes).collect())
}

// ============ Output Decoding ============

/// Price snapshot carried by a feed output
pub fn decode_price(output: &ChainOutput) -> FeedResult<PriceData> {
    Ok(decode::<GenericData>(output.datum()?)?.price_data)
}

/// Aggregation settings carried by an aggregate-state output
pub fn decode_settings(output: &ChainOutput) -> FeedResult<OracleSettings> {
    Ok(decode::<AggDatum>(output.datum()?)?.state.settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{FeedError, MalformedReason};
    use crate::plutus::{encode, DataKind};
    use crate::types::RawDatum;

    fn sample_settings() -> OracleSettings {
        OracleSettings {
            node_list: vec![vec![0x11; 28], vec![0x22; 28], vec![0x33; 28]],
            updated_nodes: 6_667,
            updated_node_time: 3_600_000,
            aggregate_time: 1_800_000,
            aggregate_change: 250,
            minimum_deposit: 500_000_000,
            aggregate_valid_range: 300_000,
            node_fee_price: NodeFeePrice {
                node_fee: 1_000_000,
                aggregate_fee: 2_500_000,
                platform_fee: 500_000,
            },
            iqr_multiplier: 3,
            divergence: 150,
            platform: OraclePlatform {
                pmultisig_pkhs: vec![vec![0xcc; 28], vec![0xaa; 28], vec![0xbb; 28]],
                pmultisig_threshold: 2,
            },
        }
    }

    fn agg_datum(settings: OracleSettings) -> RawDatum {
        encode(&AggDatum {
            state: AggState { settings },
        })
    }

    #[test]
    fn test_price_data_round_trip() {
        let price = PriceData::new(1_500_000, 1_700_000_000_000, 1_700_003_600_000);
        let raw = encode(&GenericData { price_data: price });

        let decoded = decode::<GenericData>(&raw).unwrap();
        assert_eq!(decoded.price_data, price);
        assert_eq!(decoded.price_data.price_display(), 1.5);
        assert_eq!(decoded.price_data.validity(), 3_600_000);
    }

    #[test]
    fn test_price_data_wire_layout() {
        let raw = encode(&GenericData {
            price_data: PriceData::new(1, 2, 3),
        });
        // 121([_ 123([_ {0: 1, 1: 2, 2: 3}])])
        assert_eq!(raw.to_hex(), "d8799fd87b9fa3000101020203ffff");
    }

    #[test]
    fn test_decodes_definite_length_datum() {
        // same value written with definite-length arrays
        let raw = RawDatum::from_hex("d87981d87b81a3000101020203").unwrap();
        let decoded = decode::<GenericData>(&raw).unwrap();
        assert_eq!(decoded.price_data, PriceData::new(1, 2, 3));
    }

    #[test]
    fn test_wrong_outer_tag_fails() {
        // AggDatum-shaped wrapper (tag 2) where GenericData (tag 0) is expected
        let data = PlutusData::constr(2, vec![PriceData::new(1, 2, 3).to_plutus()]);
        let raw = RawDatum::new(data.to_cbor());

        let err = decode::<GenericData>(&raw).unwrap_err();
        assert_eq!(
            err,
            FeedError::malformed(
                "GenericData",
                MalformedReason::UnexpectedTag {
                    expected: 0,
                    found: 2
                }
            )
        );
    }

    #[test]
    fn test_wrong_inner_tag_fails() {
        let inner = PlutusData::constr(0, PriceData::new(1, 2, 3).encode_fields());
        let raw = RawDatum::new(PlutusData::constr(0, vec![inner]).to_cbor());

        assert!(matches!(
            decode::<GenericData>(&raw),
            Err(FeedError::MalformedDatum {
                record: "PriceData",
                reason: MalformedReason::UnexpectedTag { expected: 2, found: 0 }
            })
        ));
    }

    #[test]
    fn test_price_map_missing_key_fails() {
        let map = PlutusData::Map(vec![
            (PlutusData::Integer(0), PlutusData::Integer(1_000_000)),
            (PlutusData::Integer(1), PlutusData::Integer(1_700_000_000_000)),
        ]);
        let data = PlutusData::constr(0, vec![PlutusData::constr(2, vec![map])]);

        let err = decode::<GenericData>(&RawDatum::new(data.to_cbor())).unwrap_err();
        assert_eq!(
            err,
            FeedError::malformed("PriceData", MalformedReason::MissingKey { key: 2 })
        );
    }

    #[test]
    fn test_price_map_extra_keys_ignored() {
        let map = PlutusData::Map(vec![
            (PlutusData::Integer(0), PlutusData::Integer(2_000_000)),
            (PlutusData::Integer(1), PlutusData::Integer(1_700_000_000_000)),
            (PlutusData::Integer(2), PlutusData::Integer(1_700_003_600_000)),
            (PlutusData::Integer(3), PlutusData::Integer(6)),
        ]);
        let data = PlutusData::constr(0, vec![PlutusData::constr(2, vec![map])]);

        let decoded = decode::<GenericData>(&RawDatum::new(data.to_cbor())).unwrap();
        assert_eq!(
            decoded.price_data,
            PriceData::new(2_000_000, 1_700_000_000_000, 1_700_003_600_000)
        );
        assert_eq!(decoded.price_data.price_display(), 2.0);
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = sample_settings();
        let decoded = decode::<AggDatum>(&agg_datum(settings.clone())).unwrap();
        assert_eq!(decoded.state.settings, settings);
    }

    #[test]
    fn test_settings_short_arity_fails() {
        let mut fields = sample_settings().encode_fields();
        fields.pop();
        let settings = PlutusData::constr(0, fields);
        let data = PlutusData::constr(2, vec![PlutusData::constr(0, vec![settings])]);

        let err = decode::<AggDatum>(&RawDatum::new(data.to_cbor())).unwrap_err();
        assert_eq!(
            err,
            FeedError::malformed(
                "OracleSettings",
                MalformedReason::UnexpectedArity {
                    expected: 11,
                    found: 10
                }
            )
        );
    }

    #[test]
    fn test_nested_platform_arity_fails() {
        let mut fields = sample_settings().encode_fields();
        fields[10] = PlutusData::constr(0, vec![PlutusData::List(vec![])]);
        let data = PlutusData::constr(
            2,
            vec![PlutusData::constr(0, vec![PlutusData::constr(0, fields)])],
        );

        assert!(matches!(
            decode::<AggDatum>(&RawDatum::new(data.to_cbor())),
            Err(FeedError::MalformedDatum {
                record: "OraclePlatform",
                reason: MalformedReason::UnexpectedArity { expected: 2, found: 1 }
            })
        ));
    }

    #[test]
    fn test_node_list_must_hold_bytes() {
        let mut fields = sample_settings().encode_fields();
        fields[0] = PlutusData::List(vec![PlutusData::Integer(1)]);
        let data = PlutusData::constr(
            2,
            vec![PlutusData::constr(0, vec![PlutusData::constr(0, fields)])],
        );

        assert!(matches!(
            decode::<AggDatum>(&RawDatum::new(data.to_cbor())),
            Err(FeedError::MalformedDatum {
                record: "OracleSettings",
                reason: MalformedReason::UnexpectedKind {
                    expected: DataKind::Bytes,
                    found: DataKind::Integer
                }
            })
        ));
    }

    #[test]
    fn test_signatory_order_preserved() {
        let settings = decode::<AggDatum>(&agg_datum(sample_settings()))
            .unwrap()
            .state
            .settings;
        let (signatories, threshold) = settings.platform_signatories();

        assert_eq!(
            signatories,
            &[vec![0xcc; 28], vec![0xaa; 28], vec![0xbb; 28]][..]
        );
        assert_eq!(threshold, 2);
    }

    #[test]
    fn test_settings_accessors() {
        let settings = sample_settings();
        assert_eq!(settings.node_count(), 3);
        assert_eq!(settings.updated_nodes_percent(), 66.67);
        assert_eq!(settings.updated_node_time_minutes(), 60.0);
        assert_eq!(settings.aggregate_time_minutes(), 30.0);
        assert_eq!(settings.aggregate_change_percent(), 2.5);
        assert_eq!(settings.aggregate_valid_range_minutes(), 5.0);
        assert_eq!(settings.divergence_percent(), 1.5);
        assert_eq!(settings.price_rewards(), (1_000_000, 2_500_000, 500_000));
    }

    #[test]
    fn test_decode_from_output() {
        let output = ChainOutput {
            tx_hash: "ab".repeat(32),
            output_index: 0,
            address: "addr_test1".into(),
            coin: 2_000_000,
            assets: Default::default(),
            datum: Some(agg_datum(sample_settings())),
        };
        assert_eq!(decode_settings(&output).unwrap(), sample_settings());

        // the aggregate datum is not a feed datum
        assert!(matches!(
            decode_price(&output),
            Err(FeedError::MalformedDatum { record: "GenericData", .. })
        ));

        let bare = ChainOutput { datum: None, ..output };
        assert!(matches!(decode_price(&bare), Err(FeedError::MissingDatum { .. })));
    }
}
