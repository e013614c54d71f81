//! Fee gating: hold submission until the network gas price is acceptable

use crate::error::{MinterError, MinterResult};

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Source of the current network fee price, in gwei
#[async_trait]
pub trait FeeSource: Send + Sync {
    async fn fee_gwei(&self) -> MinterResult<f64>;
}

/// Blocks until the gas price drops under a configured ceiling
pub struct FeeGate {
    /// Ceiling in gwei
    ceiling_gwei: f64,
    /// Interval between polls
    poll_interval: Duration,
    /// Upper bound on total wait time
    max_wait: Duration,
}

impl FeeGate {
    pub fn new(ceiling_gwei: f64, poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            ceiling_gwei,
            poll_interval,
            max_wait,
        }
    }

    /// Poll the fee source until the price is at or under the ceiling.
    ///
    /// Returns immediately when the first reading is acceptable. A failed
    /// fee query is treated as "above ceiling" rather than compared, so the
    /// gate fails closed. Gives up with a timeout error once the total wait
    /// exceeds the configured bound.
    pub async fn wait_until_acceptable(&self, source: &dyn FeeSource) -> MinterResult<()> {
        let deadline = Instant::now() + self.max_wait;
        info!("Checking gas price, ceiling {} gwei", self.ceiling_gwei);

        loop {
            match source.fee_gwei().await {
                Ok(fee) if fee <= self.ceiling_gwei => {
                    info!(
                        "Gas price is acceptable: {:.2} <= {} gwei",
                        fee, self.ceiling_gwei
                    );
                    return Ok(());
                }
                Ok(fee) => {
                    info!(
                        "Gas price too high: {:.2} > {} gwei",
                        fee, self.ceiling_gwei
                    );
                }
                Err(e) => {
                    warn!("Fee query failed, treating as above ceiling: {}", e);
                }
            }

            if Instant::now() + self.poll_interval > deadline {
                return Err(MinterError::Timeout {
                    operation: "gas price below ceiling".to_string(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Fee source that replays a scripted sequence of readings
    struct ScriptedFees {
        readings: Mutex<VecDeque<MinterResult<f64>>>,
        polls: AtomicUsize,
    }

    impl ScriptedFees {
        fn new(readings: Vec<MinterResult<f64>>) -> Self {
            Self {
                readings: Mutex::new(readings.into()),
                polls: AtomicUsize::new(0),
            }
        }

        fn poll_count(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeeSource for ScriptedFees {
        async fn fee_gwei(&self) -> MinterResult<f64> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.readings
                .lock()
                .await
                .pop_front()
                .expect("fee source polled more times than scripted")
        }
    }

    fn gate(ceiling: f64) -> FeeGate {
        FeeGate::new(ceiling, Duration::from_millis(5), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn returns_immediately_when_fee_under_ceiling() {
        let fees = ScriptedFees::new(vec![Ok(15.0)]);
        gate(20.0).wait_until_acceptable(&fees).await.unwrap();
        assert_eq!(fees.poll_count(), 1);
    }

    #[tokio::test]
    async fn fee_equal_to_ceiling_is_acceptable() {
        let fees = ScriptedFees::new(vec![Ok(20.0)]);
        gate(20.0).wait_until_acceptable(&fees).await.unwrap();
        assert_eq!(fees.poll_count(), 1);
    }

    #[tokio::test]
    async fn sleeps_once_then_returns_when_fee_drops() {
        let fees = ScriptedFees::new(vec![Ok(25.0), Ok(15.0)]);
        gate(20.0).wait_until_acceptable(&fees).await.unwrap();
        assert_eq!(fees.poll_count(), 2);
    }

    #[tokio::test]
    async fn failed_query_is_retried_not_compared() {
        let fees = ScriptedFees::new(vec![
            Err(MinterError::Chain("rpc down".to_string())),
            Ok(15.0),
        ]);
        gate(20.0).wait_until_acceptable(&fees).await.unwrap();
        assert_eq!(fees.poll_count(), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_wait() {
        let fees = ScriptedFees::new((0..50).map(|_| Ok(25.0)).collect());
        let gate = FeeGate::new(20.0, Duration::from_millis(5), Duration::from_millis(20));
        let err = gate.wait_until_acceptable(&fees).await.unwrap_err();
        assert!(matches!(err, MinterError::Timeout { .. }));
    }
}
