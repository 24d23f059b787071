//! Reader configuration
//!
//! Two YAML files drive a read:
//!
//! - `config.yaml`: credentials of the indexing services
//! - `{environment}-c3-networks.yaml`: address and minting policy of each
//!   token pair deployed in that environment
//!
//! Both are loaded once by the binary and turned into explicit values
//! (`ServiceConfig`, `ReaderConfig`) handed to the contexts and the reader.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use c3_common::{AssetFingerprint, PolicyId, UniquenessPolicy};
use clap::ValueEnum;
use serde::Deserialize;

use crate::error::{ReaderError, ReaderResult};

/// Default file holding service credentials
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Suffix of the per-environment network registry file
pub const NETWORKS_FILE_SUFFIX: &str = "c3-networks.yaml";

// ============ Environments and Services ============

/// Cardano network the C3 feeds are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Preprod,
    Mainnet,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preprod => "preprod",
            Self::Mainnet => "mainnet",
        }
    }

    /// Public Blockfrost endpoint of the environment
    pub fn blockfrost_url(&self) -> &'static str {
        match self {
            Self::Preprod => "https://cardano-preprod.blockfrost.io/api/v0",
            Self::Mainnet => "https://cardano-mainnet.blockfrost.io/api/v0",
        }
    }

    /// Registry file name, e.g. `preprod-c3-networks.yaml`
    pub fn networks_file(&self) -> String {
        format!("{}-{}", self.as_str(), NETWORKS_FILE_SUFFIX)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indexing service used to list the outputs at an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Service {
    Blockfrost,
    Kupo,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blockfrost => "blockfrost",
            Self::Kupo => "kupo",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Service Credentials ============

/// Contents of `config.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub blockfrost: Option<BlockfrostSection>,
    #[serde(default)]
    pub kupo: Option<KupoSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockfrostSection {
    pub project_id: Option<String>,
    /// Overrides the environment's public endpoint
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KupoSection {
    pub url: Option<String>,
}

/// Resolved Blockfrost settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockfrostConfig {
    pub project_id: String,
    pub base_url: String,
}

/// Resolved Kupo settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KupoConfig {
    pub url: String,
}

impl ServiceConfig {
    pub fn from_file(path: impl AsRef<Path>) -> ReaderResult<Self> {
        let content = read_file(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> ReaderResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Option<Self> = serde_yaml::from_str(content)?;
        Ok(config.unwrap_or_default())
    }

    pub fn blockfrost(&self, environment: Environment) -> ReaderResult<BlockfrostConfig> {
        let section = self.blockfrost.as_ref().ok_or_else(|| incomplete(Service::Blockfrost))?;
        let project_id = non_empty(section.project_id.as_deref())
            .ok_or_else(|| incomplete(Service::Blockfrost))?;
        let base_url = non_empty(section.base_url.as_deref())
            .unwrap_or_else(|| environment.blockfrost_url());

        Ok(BlockfrostConfig {
            project_id: project_id.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn kupo(&self) -> ReaderResult<KupoConfig> {
        let url = self
            .kupo
            .as_ref()
            .and_then(|section| non_empty(section.url.as_deref()))
            .ok_or_else(|| incomplete(Service::Kupo))?;

        Ok(KupoConfig {
            url: url.trim_end_matches('/').to_string(),
        })
    }
}

fn incomplete(service: Service) -> ReaderError {
    ReaderError::config(format!("context for {service} not found or is incomplete"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ============ Network Registry ============

/// One token pair entry of `{environment}-c3-networks.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkEntry {
    pub address: Option<String>,
    #[serde(rename = "minting-policy")]
    pub minting_policy: Option<String>,
    /// `assume-unique` (default) or `verify-unique` for the aggregate-state NFT
    #[serde(default, rename = "aggregate-uniqueness")]
    pub aggregate_uniqueness: Option<UniquenessPolicy>,
}

/// Token pairs deployed in one environment, keyed by pair name (`ADA-USD`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct NetworkRegistry(BTreeMap<String, NetworkEntry>);

impl NetworkRegistry {
    /// Load `{dir}/{environment}-c3-networks.yaml`
    pub fn load(dir: impl AsRef<Path>, environment: Environment) -> ReaderResult<Self> {
        let path: PathBuf = dir.as_ref().join(environment.networks_file());
        Self::from_yaml(&read_file(&path)?)
    }

    pub fn from_yaml(content: &str) -> ReaderResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let registry: Option<Self> = serde_yaml::from_str(content)?;
        Ok(registry.unwrap_or_default())
    }

    pub fn token_pairs(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Reader configuration of a token pair
    pub fn network(&self, token_pair: &str) -> ReaderResult<ReaderConfig> {
        let not_found =
            || ReaderError::config(format!("token pair {token_pair} not found in the network"));

        let entry = self.0.get(token_pair).ok_or_else(not_found)?;
        let address = non_empty(entry.address.as_deref()).ok_or_else(not_found)?;
        let policy = non_empty(entry.minting_policy.as_deref()).ok_or_else(not_found)?;

        Ok(ReaderConfig::new(address, PolicyId::from_hex(policy)?)
            .with_aggregate_uniqueness(entry.aggregate_uniqueness.unwrap_or_default()))
    }
}

// ============ Reader Configuration ============

/// Everything the reader needs to know about one C3 network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Bech32 address holding the network's outputs
    pub address: String,
    /// Policy the network's NFTs are minted under
    pub minting_policy: PolicyId,
    /// Policy applied when several outputs hold the aggregate-state NFT
    pub aggregate_uniqueness: UniquenessPolicy,
}

impl ReaderConfig {
    pub fn new(address: impl Into<String>, minting_policy: PolicyId) -> Self {
        Self {
            address: address.into(),
            minting_policy,
            aggregate_uniqueness: UniquenessPolicy::default(),
        }
    }

    pub fn with_aggregate_uniqueness(mut self, uniqueness: UniquenessPolicy) -> Self {
        self.aggregate_uniqueness = uniqueness;
        self
    }

    pub fn feed_fingerprint(&self) -> AssetFingerprint {
        AssetFingerprint::oracle_feed(self.minting_policy)
    }

    pub fn aggregate_fingerprint(&self) -> AssetFingerprint {
        AssetFingerprint::aggregate_state(self.minting_policy)
    }
}

fn read_file(path: &Path) -> ReaderResult<String> {
    std::fs::read_to_string(path).map_err(|source| ReaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = "886dcb2363e160c944e63cf544ce6f6265b22ef7c4e2478dd975078e";

    #[test]
    fn test_blockfrost_defaults_to_environment_url() {
        let config = ServiceConfig::from_yaml("blockfrost:\n  project_id: preprodABC\n").unwrap();

        let blockfrost = config.blockfrost(Environment::Preprod).unwrap();
        assert_eq!(blockfrost.project_id, "preprodABC");
        assert_eq!(blockfrost.base_url, "https://cardano-preprod.blockfrost.io/api/v0");

        let mainnet = config.blockfrost(Environment::Mainnet).unwrap();
        assert_eq!(mainnet.base_url, "https://cardano-mainnet.blockfrost.io/api/v0");
    }

    #[test]
    fn test_blockfrost_base_url_override() {
        let yaml = "blockfrost:\n  project_id: p\n  base_url: http://localhost:3000/api/v0/\n";
        let config = ServiceConfig::from_yaml(yaml).unwrap();

        let blockfrost = config.blockfrost(Environment::Mainnet).unwrap();
        assert_eq!(blockfrost.base_url, "http://localhost:3000/api/v0");
    }

    #[test]
    fn test_incomplete_service_sections() {
        let config = ServiceConfig::from_yaml("blockfrost:\n  base_url: http://x\n").unwrap();
        let err = config.blockfrost(Environment::Preprod).unwrap_err();
        assert!(err.to_string().contains("blockfrost not found or is incomplete"));

        let err = config.kupo().unwrap_err();
        assert!(err.to_string().contains("kupo not found or is incomplete"));

        assert!(ServiceConfig::from_yaml("").unwrap().kupo().is_err());
    }

    #[test]
    fn test_kupo_url() {
        let config = ServiceConfig::from_yaml("kupo:\n  url: http://localhost:1442/\n").unwrap();
        assert_eq!(config.kupo().unwrap().url, "http://localhost:1442");
    }

    #[test]
    fn test_registry_lookup() {
        let yaml = format!(
            "ADA-USD:\n  address: addr_test1wz\n  minting-policy: {POLICY}\n\
             SHEN-USD:\n  address: addr_test1wq\n"
        );
        let registry = NetworkRegistry::from_yaml(&yaml).unwrap();
        assert_eq!(registry.token_pairs().collect::<Vec<_>>(), ["ADA-USD", "SHEN-USD"]);

        let config = registry.network("ADA-USD").unwrap();
        assert_eq!(config.address, "addr_test1wz");
        assert_eq!(config.minting_policy.to_hex(), POLICY);
        assert_eq!(config.aggregate_uniqueness, UniquenessPolicy::AssumeUnique);
        assert_eq!(
            config.feed_fingerprint().to_string(),
            format!("{POLICY}.OracleFeed")
        );

        // missing minting policy
        assert!(matches!(registry.network("SHEN-USD"), Err(ReaderError::Config(_))));
        // unknown pair
        let err = registry.network("BTC-USD").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: token pair BTC-USD not found in the network"
        );
    }

    #[test]
    fn test_registry_aggregate_uniqueness() {
        let yaml = format!(
            "ADA-USD:\n  address: addr_test1wz\n  minting-policy: {POLICY}\n  \
             aggregate-uniqueness: verify-unique\n"
        );
        let registry = NetworkRegistry::from_yaml(&yaml).unwrap();
        let config = registry.network("ADA-USD").unwrap();
        assert_eq!(config.aggregate_uniqueness, UniquenessPolicy::VerifyUnique);

        let yaml = format!(
            "ADA-USD:\n  address: a\n  minting-policy: {POLICY}\n  aggregate-uniqueness: sometimes\n"
        );
        assert!(matches!(NetworkRegistry::from_yaml(&yaml), Err(ReaderError::Yaml(_))));
    }

    #[test]
    fn test_registry_rejects_bad_policy() {
        let registry =
            NetworkRegistry::from_yaml("ADA-USD:\n  address: a\n  minting-policy: abcd\n").unwrap();
        assert!(matches!(registry.network("ADA-USD"), Err(ReaderError::Feed(_))));
    }

    #[test]
    fn test_registry_file_name() {
        assert_eq!(Environment::Preprod.networks_file(), "preprod-c3-networks.yaml");
        assert_eq!(Environment::Mainnet.networks_file(), "mainnet-c3-networks.yaml");

        let err = NetworkRegistry::load("/nonexistent", Environment::Preprod).unwrap_err();
        assert!(matches!(err, ReaderError::Io { .. }));
    }
}
