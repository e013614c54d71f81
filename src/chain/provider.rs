//! Chain provider with multi-RPC support and automatic failover

use crate::error::{MinterError, MinterResult};
use crate::tx::FeeSource;

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::utils::format_units;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Multi-provider wrapper with automatic failover for read calls
pub struct ChainProvider {
    /// Chain ID used for transaction signing
    chain_id: u64,
    /// HTTP providers (multiple for failover)
    http_providers: Vec<Provider<Http>>,
    /// Current active provider index
    current_provider: AtomicUsize,
}

impl ChainProvider {
    /// Create a new chain provider from the configured RPC URLs
    pub fn new(chain_id: u64, rpc_urls: &[String]) -> MinterResult<Self> {
        let mut http_providers = Vec::new();

        for url in rpc_urls {
            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    let provider = provider.interval(Duration::from_secs(2));
                    http_providers.push(provider);
                    debug!("Added HTTP provider for chain {}: {}", chain_id, url);
                }
                Err(e) => {
                    warn!("Failed to create provider for {}: {}", url, e);
                }
            }
        }

        if http_providers.is_empty() {
            return Err(MinterError::Chain(format!(
                "No valid RPC providers for chain {}",
                chain_id
            )));
        }

        Ok(Self {
            chain_id,
            http_providers,
            current_provider: AtomicUsize::new(0),
        })
    }

    /// Get the active HTTP provider
    pub fn http(&self) -> &Provider<Http> {
        let idx = self.current_provider.load(Ordering::Relaxed);
        &self.http_providers[idx % self.http_providers.len()]
    }

    /// Switch to next available provider
    pub fn failover(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.http_providers.len();
        self.current_provider.store(next, Ordering::Relaxed);
        warn!("Chain {} failover to provider {}", self.chain_id, next);
    }

    /// Get current gas price in gwei with failover
    pub async fn gas_price_gwei(&self) -> MinterResult<f64> {
        for _ in 0..self.http_providers.len() {
            match self.http().get_gas_price().await {
                Ok(price) => {
                    let gwei: f64 = format_units(price, "gwei")
                        .map_err(|e| MinterError::GasEstimation(e.to_string()))?
                        .parse()
                        .map_err(|e| {
                            MinterError::GasEstimation(format!("Bad gwei value: {}", e))
                        })?;
                    return Ok(gwei);
                }
                Err(e) => {
                    warn!(
                        "Failed to get gas price from chain {}: {}",
                        self.chain_id, e
                    );
                    self.failover();
                }
            }
        }

        Err(MinterError::Chain("All providers failed".to_string()))
    }

    /// Get the raw gas price in wei
    pub async fn gas_price(&self) -> MinterResult<U256> {
        self.http()
            .get_gas_price()
            .await
            .map_err(|e| MinterError::GasEstimation(e.to_string()))
    }

    /// Get the current transaction count (nonce) for an address
    pub async fn get_nonce(&self, address: Address) -> MinterResult<U256> {
        self.http()
            .get_transaction_count(address, None)
            .await
            .map_err(|e| MinterError::Chain(e.to_string()))
    }

    /// Estimate gas for a transaction
    pub async fn estimate_gas(&self, tx: &TypedTransaction) -> MinterResult<U256> {
        self.http()
            .estimate_gas(tx, None)
            .await
            .map_err(|e| MinterError::GasEstimation(e.to_string()))
    }

    /// Broadcast a raw signed transaction and wait for its receipt
    pub async fn send_and_confirm(
        &self,
        raw: Bytes,
        confirm_timeout: Duration,
    ) -> MinterResult<TransactionReceipt> {
        let pending = self
            .http()
            .send_raw_transaction(raw)
            .await
            .map_err(|e| MinterError::Chain(e.to_string()))?;

        let tx_hash = pending.tx_hash();
        info!("Waiting for transaction {:?}", tx_hash);

        let receipt = timeout(confirm_timeout, pending)
            .await
            .map_err(|_| MinterError::Timeout {
                operation: format!("confirmation of {:?}", tx_hash),
            })?
            .map_err(|e| MinterError::Chain(e.to_string()))?
            .ok_or(MinterError::TxDropped {
                tx_hash: format!("{:?}", tx_hash),
            })?;

        Ok(receipt)
    }

    /// Get chain ID
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl FeeSource for ChainProvider {
    async fn fee_gwei(&self) -> MinterResult<f64> {
        self.gas_price_gwei().await
    }
}
