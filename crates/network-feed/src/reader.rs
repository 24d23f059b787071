//! C3 network information reader
//!
//! One reader per network (address + minting policy). Every call queries the
//! chain context afresh; nothing is cached between calls.

use c3_common::{
    decode_price, decode_settings, locate_aggregate_output, locate_feed_output, ChainOutput,
    OracleSettings, PriceData, PubKeyHash,
};

use crate::config::ReaderConfig;
use crate::context::ChainContext;
use crate::error::ReaderResult;

pub struct NetworkInfoReader<C> {
    config: ReaderConfig,
    context: C,
}

impl<C: ChainContext> NetworkInfoReader<C> {
    pub fn new(config: ReaderConfig, context: C) -> Self {
        Self { config, context }
    }

    pub fn network_address(&self) -> &str {
        &self.config.address
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    fn outputs(&self) -> ReaderResult<Vec<ChainOutput>> {
        let outputs = self.context.outputs_at(&self.config.address)?;
        tracing::debug!(
            address = %self.config.address,
            count = outputs.len(),
            "outputs fetched"
        );
        Ok(outputs)
    }

    /// Output holding exactly the `OracleFeed` NFT
    pub fn feed_output(&self) -> ReaderResult<ChainOutput> {
        let outputs = self.outputs()?;
        let output = locate_feed_output(&outputs, &self.config.feed_fingerprint())?;
        tracing::debug!(output = %output.output_ref(), "feed output located");
        Ok(output.clone())
    }

    /// Output holding the `AggState` NFT among other assets
    pub fn aggregate_state_output(&self) -> ReaderResult<ChainOutput> {
        let outputs = self.outputs()?;
        let output = locate_aggregate_output(
            &outputs,
            &self.config.aggregate_fingerprint(),
            self.config.aggregate_uniqueness,
        )?;
        tracing::debug!(output = %output.output_ref(), "aggregate state output located");
        Ok(output.clone())
    }

    /// Latest published price
    pub fn price_data(&self) -> ReaderResult<PriceData> {
        let price = decode_price(&self.feed_output()?)?;
        tracing::debug!(
            price = price.price,
            timestamp = price.timestamp,
            expiry = price.expiry,
            "feed decoded"
        );
        Ok(price)
    }

    /// Exchange rate, 6-decimal fixed point
    pub fn oracle_exchange_rate(&self) -> ReaderResult<i64> {
        Ok(self.price_data()?.price)
    }

    /// Creation time of the feed, ms since the Unix epoch
    pub fn network_timestamp(&self) -> ReaderResult<i64> {
        Ok(self.price_data()?.timestamp)
    }

    /// Expiry time of the feed, ms since the Unix epoch
    pub fn network_expiration(&self) -> ReaderResult<i64> {
        Ok(self.price_data()?.expiry)
    }

    /// Aggregation settings of the network
    pub fn network_configuration(&self) -> ReaderResult<OracleSettings> {
        let settings = decode_settings(&self.aggregate_state_output()?)?;
        tracing::debug!(nodes = settings.node_count(), "settings decoded");
        Ok(settings)
    }

    /// (node, aggregate, platform) reward split
    pub fn price_rewards(&self, settings: &OracleSettings) -> (i64, i64, i64) {
        settings.price_rewards()
    }

    /// (signatory key hashes, minimum signatories)
    pub fn platform_signatories<'s>(&self, settings: &'s OracleSettings) -> (&'s [PubKeyHash], i64) {
        settings.platform_signatories()
    }
}
