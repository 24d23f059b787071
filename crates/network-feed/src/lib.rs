//! C3 Network Feed Reader
//!
//! Reads the price feed and the aggregation settings of a Charli3 oracle
//! network on Cardano. The chain-independent work (locating the oracle
//! outputs, decoding their datums) is done by `c3-common`; this crate adds:
//!
//! - **Chain contexts**: Blockfrost and Kupo clients listing the outputs at
//!   an address
//! - **Configuration**: service credentials and per-environment network
//!   registries loaded from YAML
//! - **Reader**: `NetworkInfoReader`, one per network
//! - **Reports**: the console renderings printed by the `c3-network-feed`
//!   binary

pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod reader;


pub use config::{Environment, NetworkRegistry, ReaderConfig, Service, ServiceConfig};
pub use context::ChainContext;
pub use error::{ReaderError, ReaderResult};
pub use reader::NetworkInfoReader;
