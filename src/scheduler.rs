//! Scheduler - a single sequential pass over the shuffled account list
//!
//! Per account: optional fee gate, one mint attempt, one recorded row, then a
//! randomized pause. A failing account never aborts the batch.

use crate::config::MinterConfig;
use crate::error::MinterResult;
use crate::report::{CsvRecorder, MintRecord, MintStatus};
use crate::tx::{FeeGate, FeeSource, MintOutcome, MintSubmit};

use ethers::signers::{LocalWallet, Signer};
use ethers::utils::to_checksum;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use tracing::{error, info, warn};

/// Drives the per-account pipeline
pub struct Scheduler {
    config: MinterConfig,
    fee_gate: FeeGate,
    recorder: CsvRecorder,
}

impl Scheduler {
    pub fn new(config: MinterConfig, recorder: CsvRecorder) -> Self {
        let fee_gate = FeeGate::new(
            config.max_fee_gwei,
            Duration::from_secs(config.fee_poll_interval_secs),
            Duration::from_secs(config.fee_wait_timeout_secs),
        );
        Self {
            config,
            fee_gate,
            recorder,
        }
    }

    /// Run one pass: shuffle the keys, then process each account in order.
    /// Every key yields exactly one recorded row.
    pub async fn run<M, F>(
        &self,
        submitter: &M,
        fees: &F,
        mut keys: Vec<String>,
        proxies: &[String],
    ) -> MinterResult<()>
    where
        M: MintSubmit,
        F: FeeSource,
    {
        {
            let mut rng = rand::thread_rng();
            keys.shuffle(&mut rng);
        }

        info!("Starting batch of {} wallets", keys.len());

        for (index, key) in keys.iter().enumerate() {
            let (address, status) = self.process_account(submitter, fees, key, proxies).await;
            self.recorder
                .record(&MintRecord::new(address, key.clone(), &status))?;

            if index + 1 < keys.len() {
                self.sleep_between_accounts().await;
            }
        }

        info!("Batch complete");
        Ok(())
    }

    async fn process_account<M, F>(
        &self,
        submitter: &M,
        fees: &F,
        key: &str,
        proxies: &[String],
    ) -> (String, MintStatus)
    where
        M: MintSubmit,
        F: FeeSource,
    {
        let address = match key.trim().parse::<LocalWallet>() {
            Ok(wallet) => to_checksum(&wallet.address(), None),
            Err(e) => {
                warn!("Skipping unparseable private key: {}", e);
                return (
                    String::new(),
                    MintStatus::FailedWithReason(format!("invalid private key: {}", e)),
                );
            }
        };

        let proxy = {
            let mut rng = rand::thread_rng();
            proxies.choose(&mut rng).cloned()
        };

        if self.config.check_fee {
            if let Err(e) = self.fee_gate.wait_until_acceptable(fees).await {
                error!("Fee gate gave up for {}: {}", address, e);
                return (address, MintStatus::FailedWithReason(e.to_string()));
            }
        }

        info!("Started work with wallet {}", address);

        match submitter.submit(key, proxy.as_deref()).await {
            Ok(MintOutcome::Minted { .. }) => (address, MintStatus::Success),
            Ok(MintOutcome::Reverted { .. }) => (address, MintStatus::Failed),
            Err(e) => {
                error!("Mint failed for {}: {}", address, e);
                (address, MintStatus::FailedWithReason(e.to_string()))
            }
        }
    }

    async fn sleep_between_accounts(&self) {
        let delay = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.config.sleep_from_secs..=self.config.sleep_to_secs)
        };
        info!("Sleeping {}s before next wallet", delay);
        tokio::time::sleep(Duration::from_secs(delay)).await;
    }
}
