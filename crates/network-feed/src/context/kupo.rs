//! Kupo chain context
//!
//! Outputs come from `GET {kupo}/matches/{address}?unspent`. Kupo only
//! reports datum hashes, inline or not, so every datum is fetched from
//! `GET {kupo}/datums/{hash}`.

use std::collections::BTreeMap;

use c3_common::{AssetBundle, AssetFingerprint, AssetName, ChainOutput, PolicyId, RawDatum};
use reqwest::blocking::Client;
use serde::Deserialize;

use super::{http_client, ChainContext};
use crate::config::KupoConfig;
use crate::error::{ReaderError, ReaderResult};

const SERVICE: &str = "kupo";

/// One entry of the matches listing
#[derive(Debug, Clone, Deserialize)]
pub struct KupoMatch {
    pub transaction_id: String,
    pub output_index: u32,
    pub address: String,
    pub value: KupoValue,
    #[serde(default)]
    pub datum_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KupoValue {
    pub coins: u64,
    /// Keyed `policy_hex.name_hex`, or bare `policy_hex` for the empty name
    #[serde(default)]
    pub assets: BTreeMap<String, u64>,
}

#[derive(Debug, Deserialize)]
struct KupoDatum {
    datum: String,
}

pub struct KupoContext {
    client: Client,
    url: String,
}

impl KupoContext {
    pub fn new(config: &KupoConfig) -> ReaderResult<Self> {
        Ok(Self {
            client: http_client()?,
            url: config.url.clone(),
        })
    }

    fn get(&self, url: &str) -> ReaderResult<reqwest::blocking::Response> {
        tracing::debug!(%url, "kupo request");
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReaderError::Status {
                service: SERVICE,
                status: status.as_u16(),
                url: url.to_string(),
                message: response.text().unwrap_or_default(),
            });
        }
        Ok(response)
    }

    fn datum_by_hash(&self, hash: &str) -> ReaderResult<Option<RawDatum>> {
        let body: Option<KupoDatum> = self.get(&format!("{}/datums/{hash}", self.url))?.json()?;
        body.map(|body| RawDatum::from_hex(&body.datum).map_err(ReaderError::from))
            .transpose()
    }
}

impl ChainContext for KupoContext {
    fn outputs_at(&self, address: &str) -> ReaderResult<Vec<ChainOutput>> {
        let matches: Vec<KupoMatch> = self
            .get(&format!("{}/matches/{address}?unspent", self.url))?
            .json()?;
        tracing::debug!(address, count = matches.len(), "kupo matches listed");

        let mut lookups = 0usize;
        let outputs = matches
            .into_iter()
            .map(|m| {
                into_output(m, |hash| {
                    lookups += 1;
                    self.datum_by_hash(hash)
                })
            })
            .collect::<ReaderResult<Vec<_>>>()?;
        tracing::debug!(address, datum_lookups = lookups, "kupo datums resolved");
        Ok(outputs)
    }
}

/// Parse a `policy_hex[.name_hex]` asset key
pub fn parse_asset_key(key: &str) -> ReaderResult<AssetFingerprint> {
    let (policy, name) = key.split_once('.').unwrap_or((key, ""));
    Ok(AssetFingerprint::new(
        PolicyId::from_hex(policy)?,
        AssetName::from_hex(name)?,
    ))
}

/// Convert a match, resolving its datum through `resolve`
pub fn into_output<F>(entry: KupoMatch, mut resolve: F) -> ReaderResult<ChainOutput>
where
    F: FnMut(&str) -> ReaderResult<Option<RawDatum>>,
{
    let mut assets = AssetBundle::new();
    for (key, quantity) in &entry.value.assets {
        assets.insert(parse_asset_key(key)?, *quantity);
    }

    let datum = match &entry.datum_hash {
        Some(hash) => resolve(hash)?,
        None => None,
    };

    Ok(ChainOutput {
        tx_hash: entry.transaction_id,
        output_index: entry.output_index,
        address: entry.address,
        coin: entry.value.coins,
        assets,
        datum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = "886dcb2363e160c944e63cf544ce6f6265b22ef7c4e2478dd975078e";

    fn matches() -> Vec<KupoMatch> {
        let body = format!(
            r#"[
              {{
                "transaction_index": 4,
                "transaction_id": "c0ffee",
                "output_index": 2,
                "address": "addr_test1wz",
                "value": {{
                  "coins": 3000000,
                  "assets": {{
                    "{POLICY}.4167675374617465": 1,
                    "{POLICY}": 7
                  }}
                }},
                "datum_hash": "d1",
                "datum_type": "inline",
                "script_hash": null,
                "created_at": {{ "slot_no": 100, "header_hash": "h" }},
                "spent_at": null
              }},
              {{
                "transaction_index": 0,
                "transaction_id": "beef",
                "output_index": 0,
                "address": "addr_test1wz",
                "value": {{ "coins": 1000000 }},
                "datum_hash": null,
                "script_hash": null,
                "created_at": {{ "slot_no": 101, "header_hash": "h" }},
                "spent_at": null
              }}
            ]"#
        );
        serde_json::from_str(&body).unwrap()
    }

    #[test]
    fn test_asset_keys() {
        let policy = PolicyId::from_hex(POLICY).unwrap();

        let agg = parse_asset_key(&format!("{POLICY}.4167675374617465")).unwrap();
        assert_eq!(agg, AssetFingerprint::aggregate_state(policy));

        let bare = parse_asset_key(POLICY).unwrap();
        assert!(bare.asset_name.as_bytes().is_empty());

        assert!(parse_asset_key("nothex.00").is_err());
    }

    #[test]
    fn test_match_with_datum() {
        let entry = matches().remove(0);
        let output = into_output(entry, |hash| {
            assert_eq!(hash, "d1");
            Ok(Some(RawDatum::from_hex("d87980").unwrap()))
        })
        .unwrap();

        let policy = PolicyId::from_hex(POLICY).unwrap();
        assert_eq!(output.tx_hash, "c0ffee");
        assert_eq!(output.output_index, 2);
        assert_eq!(output.coin, 3_000_000);
        assert_eq!(output.assets.len(), 2);
        assert_eq!(output.assets.quantity_of(&AssetFingerprint::aggregate_state(policy)), 1);
        assert_eq!(output.datum, Some(RawDatum::from_hex("d87980").unwrap()));
    }

    #[test]
    fn test_match_without_datum() {
        let entry = matches().remove(1);
        let output = into_output(entry, |_| panic!("no datum hash")).unwrap();
        assert!(output.assets.is_empty());
        assert_eq!(output.datum, None);
    }

    #[test]
    fn test_unknown_datum_hash_stays_empty() {
        let entry = matches().remove(0);
        let output = into_output(entry, |_| Ok(None)).unwrap();
        assert_eq!(output.datum, None);
    }
}
