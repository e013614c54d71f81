//! Error types for the fundrop minter

use thiserror::Error;

/// Main error type for the minter
#[derive(Error, Debug)]
pub enum MinterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Mint API returned status {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Malformed mint API response: {0}")]
    ApiResponse(String),

    #[error("Signature fetch failed after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Gas estimation error: {0}")]
    GasEstimation(String),

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Transaction {tx_hash} dropped from the mempool")]
    TxDropped { tx_hash: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl MinterError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MinterError::Network(_)
                | MinterError::ApiStatus { .. }
                | MinterError::ApiResponse(_)
                | MinterError::Timeout { .. }
        )
    }
}

impl From<reqwest::Error> for MinterError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MinterError::Timeout {
                operation: "mint API request".to_string(),
            }
        } else {
            MinterError::Network(e.to_string())
        }
    }
}

/// Result type for minter operations
pub type MinterResult<T> = Result<T, MinterError>;
