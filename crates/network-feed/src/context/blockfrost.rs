//! Blockfrost chain context
//!
//! `GET {base}/addresses/{address}/utxos?page=N` pages through the outputs,
//! 100 at a time, until a short page. Datums attached by hash are fetched
//! from `GET {base}/scripts/datum/{hash}/cbor`.

use c3_common::constants::ledger::LOVELACE_UNIT;
use c3_common::{AssetBundle, AssetFingerprint, ChainOutput, RawDatum};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{http_client, ChainContext};
use crate::config::BlockfrostConfig;
use crate::error::{ReaderError, ReaderResult};

const SERVICE: &str = "blockfrost";

/// Outputs per page returned by Blockfrost
pub const PAGE_SIZE: usize = 100;

/// One entry of the address UTxO listing
#[derive(Debug, Clone, Deserialize)]
pub struct BlockfrostUtxo {
    pub tx_hash: String,
    pub output_index: u32,
    pub address: String,
    pub amount: Vec<BlockfrostAmount>,
    #[serde(default)]
    pub data_hash: Option<String>,
    #[serde(default)]
    pub inline_datum: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockfrostAmount {
    /// `lovelace` or `policy_hex ++ name_hex`
    pub unit: String,
    /// Decimal string
    pub quantity: String,
}

#[derive(Debug, Deserialize)]
struct DatumCbor {
    cbor: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct BlockfrostContext {
    client: Client,
    base_url: String,
    project_id: String,
}

impl BlockfrostContext {
    pub fn new(config: &BlockfrostConfig) -> ReaderResult<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: config.base_url.clone(),
            project_id: config.project_id.clone(),
        })
    }

    /// GET a JSON document; `None` on 404
    fn get<T: DeserializeOwned>(&self, path: &str) -> ReaderResult<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "blockfrost request");

        let response = self
            .client
            .get(&url)
            .header("project_id", &self.project_id)
            .send()?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json()?)),
            status => Err(status_error(url, status, response)),
        }
    }

    fn utxo_page(&self, address: &str, page: usize) -> ReaderResult<Vec<BlockfrostUtxo>> {
        let path = format!("/addresses/{address}/utxos?page={page}&count={PAGE_SIZE}");
        Ok(self.get(&path)?.unwrap_or_default())
    }

    fn datum_by_hash(&self, hash: &str) -> ReaderResult<Option<RawDatum>> {
        let body: Option<DatumCbor> = self.get(&format!("/scripts/datum/{hash}/cbor"))?;
        body.map(|body| RawDatum::from_hex(&body.cbor).map_err(ReaderError::from))
            .transpose()
    }
}

impl ChainContext for BlockfrostContext {
    fn outputs_at(&self, address: &str) -> ReaderResult<Vec<ChainOutput>> {
        let mut utxos = Vec::new();
        for page in 1.. {
            let batch = self.utxo_page(address, page)?;
            let last = batch.len() < PAGE_SIZE;
            utxos.extend(batch);
            if last {
                break;
            }
        }
        tracing::debug!(address, count = utxos.len(), "blockfrost utxos listed");

        // Hash-only datums are fetched for every output, matching or not
        let mut lookups = 0usize;
        let outputs = utxos
            .into_iter()
            .map(|utxo| {
                into_output(utxo, |hash| {
                    lookups += 1;
                    self.datum_by_hash(hash)
                })
            })
            .collect::<ReaderResult<Vec<_>>>()?;
        tracing::debug!(address, datum_lookups = lookups, "blockfrost datums resolved");
        Ok(outputs)
    }
}

fn status_error(url: String, status: StatusCode, response: Response) -> ReaderError {
    let message = response
        .json::<ErrorBody>()
        .map(|body| body.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown error").to_string());
    ReaderError::Status {
        service: SERVICE,
        status: status.as_u16(),
        url,
        message,
    }
}

fn parse_quantity(value: &str) -> ReaderResult<u64> {
    value
        .parse()
        .map_err(|_| ReaderError::invalid_response(SERVICE, format!("bad quantity '{value}'")))
}

/// Convert a listing entry, resolving a hash-only datum through `resolve`
pub fn into_output<F>(utxo: BlockfrostUtxo, mut resolve: F) -> ReaderResult<ChainOutput>
where
    F: FnMut(&str) -> ReaderResult<Option<RawDatum>>,
{
    let mut coin = 0u64;
    let mut assets = AssetBundle::new();
    for amount in &utxo.amount {
        let quantity = parse_quantity(&amount.quantity)?;
        if amount.unit == LOVELACE_UNIT {
            coin = coin.saturating_add(quantity);
        } else {
            assets.insert(AssetFingerprint::from_unit(&amount.unit)?, quantity);
        }
    }

    let datum = match (&utxo.inline_datum, &utxo.data_hash) {
        (Some(inline), _) => Some(RawDatum::from_hex(inline)?),
        (None, Some(hash)) => resolve(hash)?,
        (None, None) => None,
    };

    Ok(ChainOutput {
        tx_hash: utxo.tx_hash,
        output_index: utxo.output_index,
        address: utxo.address,
        coin,
        assets,
        datum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use c3_common::PolicyId;

    const POLICY: &str = "886dcb2363e160c944e63cf544ce6f6265b22ef7c4e2478dd975078e";

    fn listing() -> Vec<BlockfrostUtxo> {
        let body = format!(
            r#"[
              {{
                "address": "addr_test1wz",
                "tx_hash": "6f2c1ac4",
                "tx_index": 1,
                "output_index": 1,
                "amount": [
                  {{ "unit": "lovelace", "quantity": "2000000" }},
                  {{ "unit": "{POLICY}4f7261636c6546656564", "quantity": "1" }}
                ],
                "block": "b1",
                "data_hash": "aa11",
                "inline_datum": "d87980",
                "reference_script_hash": null
              }},
              {{
                "address": "addr_test1wz",
                "tx_hash": "7a01",
                "tx_index": 0,
                "output_index": 0,
                "amount": [{{ "unit": "lovelace", "quantity": "1500000" }}],
                "block": "b2",
                "data_hash": "bb22",
                "inline_datum": null,
                "reference_script_hash": null
              }},
              {{
                "address": "addr_test1wz",
                "tx_hash": "7a02",
                "tx_index": 0,
                "output_index": 3,
                "amount": [{{ "unit": "lovelace", "quantity": "1000000" }}],
                "block": "b3",
                "data_hash": null,
                "inline_datum": null,
                "reference_script_hash": null
              }}
            ]"#
        );
        serde_json::from_str(&body).unwrap()
    }

    #[test]
    fn test_inline_datum_and_assets() {
        let utxo = listing().remove(0);
        let output = into_output(utxo, |_| panic!("inline datum needs no lookup")).unwrap();

        let policy = PolicyId::from_hex(POLICY).unwrap();
        assert_eq!(output.tx_hash, "6f2c1ac4");
        assert_eq!(output.output_index, 1);
        assert_eq!(output.coin, 2_000_000);
        assert_eq!(
            output.assets,
            AssetBundle::singleton(&AssetFingerprint::oracle_feed(policy), 1)
        );
        assert_eq!(output.datum, Some(RawDatum::from_hex("d87980").unwrap()));
    }

    #[test]
    fn test_hash_datum_is_resolved() {
        let utxo = listing().remove(1);
        let mut lookups = Vec::new();
        let output = into_output(utxo, |hash| {
            lookups.push(hash.to_string());
            Ok(Some(RawDatum::from_hex("d87a80").unwrap()))
        })
        .unwrap();

        assert_eq!(lookups, ["bb22"]);
        assert!(output.assets.is_empty());
        assert_eq!(output.datum, Some(RawDatum::from_hex("d87a80").unwrap()));
    }

    #[test]
    fn test_output_without_datum() {
        let utxo = listing().remove(2);
        let output = into_output(utxo, |_| panic!("no datum to resolve")).unwrap();
        assert_eq!(output.datum, None);
        assert_eq!(output.coin, 1_000_000);
    }

    #[test]
    fn test_bad_quantity_rejected() {
        let mut utxo = listing().remove(2);
        utxo.amount[0].quantity = "-5".into();
        let err = into_output(utxo, |_| Ok(None)).unwrap_err();
        assert!(matches!(err, ReaderError::InvalidResponse { service: "blockfrost", .. }));
    }

    #[test]
    fn test_bad_unit_rejected() {
        let mut utxo = listing().remove(2);
        utxo.amount.push(BlockfrostAmount {
            unit: "abcd".into(),
            quantity: "1".into(),
        });
        assert!(matches!(
            into_output(utxo, |_| Ok(None)),
            Err(ReaderError::Feed(_))
        ));
    }
}
