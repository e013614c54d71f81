//! fundrop-minter - batch submitter for the mint.fun fundrop season1 drop
//!
//! One sequential pass over a shuffled wallet list: gate on gas price, fetch
//! a mint authorization through a rotating proxy, submit the mint
//! transaction, and append the outcome to a dated CSV file.

use anyhow::{Context, Result};
use ethers::types::Address;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod chain;
mod config;
mod error;
mod report;
mod scheduler;
mod tx;

use api::{MintFunApi, SignatureFetcher};
use chain::ChainProvider;
use config::Settings;
use report::CsvRecorder;
use scheduler::Scheduler;
use tx::MintSubmitter;

const MINT_ENDPOINT: &str = "https://mint.fun/api/mintfun/fundrop/season1/mint";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("Starting fundrop minter v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;

    let keys = config::load_lines(&settings.inputs.private_keys_path)?;
    let proxies = config::load_lines(&settings.inputs.proxies_path)?;
    info!("Loaded {} wallets and {} proxies", keys.len(), proxies.len());

    if keys.is_empty() {
        anyhow::bail!("No private keys to process");
    }
    if proxies.is_empty() {
        warn!("No proxies configured, mint API requests will go out directly");
    }

    let rpc_urls = config::load_rpc_urls(&settings.chain.rpc_map_path, &settings.chain.name)?;
    let mint_function = config::load_mint_function(&settings.chain.abi_path)?;
    let contract_address: Address = settings
        .chain
        .contract_address
        .parse()
        .with_context(|| "Invalid contract address")?;

    let provider = Arc::new(ChainProvider::new(settings.chain.chain_id, &rpc_urls)?);
    info!(
        "Chain {} connection initialized ({} RPC endpoints)",
        settings.chain.name,
        rpc_urls.len()
    );

    let api = MintFunApi::new(
        MINT_ENDPOINT,
        Duration::from_secs(settings.minter.request_timeout_secs),
    );
    let fetcher = SignatureFetcher::new(
        api,
        settings.minter.api_max_retries,
        Duration::from_millis(settings.minter.api_retry_delay_ms),
    );

    let submitter = MintSubmitter::new(
        provider.clone(),
        fetcher,
        mint_function,
        contract_address,
        Duration::from_secs(settings.minter.confirm_timeout_secs),
    );

    let recorder = CsvRecorder::new(settings.output.dir.clone());
    let scheduler = Scheduler::new(settings.minter.clone(), recorder);

    scheduler
        .run(&submitter, provider.as_ref(), keys, &proxies)
        .await?;

    info!("fundrop minter finished");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fundrop_minter=debug,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
