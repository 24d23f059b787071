//! `c3-network-feed`: print a C3 network's feed or its configuration

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use c3_common::UniquenessPolicy;
use c3_network_feed::config::DEFAULT_CONFIG_FILE;
use c3_network_feed::display::{configuration_report, feed_report};
use c3_network_feed::{
    ChainContext, Environment, NetworkInfoReader, NetworkRegistry, Service, ServiceConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Latest price with its creation and expiration times
    Feed,
    /// Aggregation settings of the network
    Configuration,
}

#[derive(Parser, Debug)]
#[command(name = "c3-network-feed")]
#[command(about = "Charli3 Network feed reader", version)]
struct Cli {
    /// Token pair of the data feed
    #[arg(default_value = "ADA-USD")]
    token_pair: String,

    /// Environment to read from
    #[arg(value_enum, default_value_t = Environment::Preprod)]
    environment: Environment,

    #[arg(long, value_enum, default_value_t = Action::Feed)]
    action: Action,

    /// Service used to read blockchain information
    #[arg(long, value_enum, default_value_t = Service::Blockfrost)]
    service: Service,

    /// Service credentials file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Directory holding the `{environment}-c3-networks.yaml` registries
    #[arg(long, default_value = ".")]
    networks_dir: PathBuf,

    /// Fail instead of taking the first output when several hold the
    /// aggregate-state NFT
    #[arg(long)]
    verify_unique: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let registry = NetworkRegistry::load(&cli.networks_dir, cli.environment)
        .with_context(|| format!("loading the {} network registry", cli.environment))?;
    let mut network = registry.network(&cli.token_pair)?;
    if cli.verify_unique {
        network = network.with_aggregate_uniqueness(UniquenessPolicy::VerifyUnique);
    }

    let services = ServiceConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let context = connect(&services, cli.service, cli.environment)?;

    tracing::info!(
        token_pair = %cli.token_pair,
        environment = %cli.environment,
        service = %cli.service,
        address = %network.address,
        "reading C3 network"
    );
    let reader = NetworkInfoReader::new(network, context);

    match cli.action {
        Action::Feed => {
            let price = reader
                .price_data()
                .with_context(|| format!("reading the {} feed", cli.token_pair))?;
            println!("{}", feed_report(reader.network_address(), &cli.token_pair, &price)?);
        }
        Action::Configuration => {
            let settings = reader
                .network_configuration()
                .with_context(|| format!("reading the {} configuration", cli.token_pair))?;
            println!(
                "{}",
                configuration_report(reader.network_address(), &cli.token_pair, &settings)
            );
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn connect(
    services: &ServiceConfig,
    service: Service,
    environment: Environment,
) -> Result<Box<dyn ChainContext>> {
    match service {
        #[cfg(feature = "blockfrost")]
        Service::Blockfrost => {
            let config = services.blockfrost(environment)?;
            Ok(Box::new(c3_network_feed::context::BlockfrostContext::new(&config)?))
        }
        #[cfg(feature = "kupo")]
        Service::Kupo => {
            let config = services.kupo()?;
            Ok(Box::new(c3_network_feed::context::KupoContext::new(&config)?))
        }
        #[allow(unreachable_patterns)]
        other => bail!("{other} support was not compiled into this binary"),
    }
}
