//! Chain contexts
//!
//! A chain context lists the unspent outputs at an address, each with its
//! native assets and its datum already resolved to bytes. The reader only
//! ever talks to this trait; the concrete indexer is picked at startup.

use c3_common::ChainOutput;

use crate::error::ReaderResult;

#[cfg(feature = "blockfrost")]
pub mod blockfrost;
#[cfg(feature = "kupo")]
pub mod kupo;

#[cfg(feature = "blockfrost")]
pub use blockfrost::BlockfrostContext;
#[cfg(feature = "kupo")]
pub use kupo::KupoContext;

/// Request timeout applied by the HTTP backends
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Source of unspent outputs
pub trait ChainContext {
    /// Every unspent output at `address`, in the indexer's order
    fn outputs_at(&self, address: &str) -> ReaderResult<Vec<ChainOutput>>;
}

impl<C: ChainContext + ?Sized> ChainContext for Box<C> {
    fn outputs_at(&self, address: &str) -> ReaderResult<Vec<ChainOutput>> {
        (**self).outputs_at(address)
    }
}

impl<C: ChainContext + ?Sized> ChainContext for &C {
    fn outputs_at(&self, address: &str) -> ReaderResult<Vec<ChainOutput>> {
        (**self).outputs_at(address)
    }
}

#[cfg(any(feature = "blockfrost", feature = "kupo"))]
pub(crate) fn http_client() -> ReaderResult<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(concat!("c3-network-feed/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Fixed output sets keyed by address
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryContext {
    outputs: std::collections::HashMap<String, Vec<ChainOutput>>,
}

#[cfg(test)]
impl MemoryContext {
    pub(crate) fn with_outputs(address: &str, outputs: Vec<ChainOutput>) -> Self {
        let mut context = Self::default();
        context.outputs.insert(address.to_string(), outputs);
        context
    }
}

#[cfg(test)]
impl ChainContext for MemoryContext {
    fn outputs_at(&self, address: &str) -> ReaderResult<Vec<ChainOutput>> {
        Ok(self.outputs.get(address).cloned().unwrap_or_default())
    }
}
