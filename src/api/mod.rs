//! Mint API client - fetches mint authorization signatures
//!
//! Each request goes out through the proxy chosen for the account, with a
//! User-Agent drawn at random from a small pool, and a hard request timeout
//! so a dead proxy cannot hang the batch.

use crate::error::{MinterError, MinterResult};

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Proxy};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

/// User-Agent pool rotated per request
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.0.0",
];

#[derive(Debug, Deserialize)]
struct MintSignatureResponse {
    signature: String,
}

/// Single-attempt mint API call
#[async_trait]
pub trait MintApi: Send + Sync {
    async fn request_signature(&self, address: &str, proxy: Option<&str>)
        -> MinterResult<String>;
}

/// HTTP client for the mint.fun fundrop endpoint
pub struct MintFunApi {
    endpoint: String,
    request_timeout: Duration,
}

impl MintFunApi {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            request_timeout,
        }
    }
}

#[async_trait]
impl MintApi for MintFunApi {
    async fn request_signature(
        &self,
        address: &str,
        proxy: Option<&str>,
    ) -> MinterResult<String> {
        let user_agent = USER_AGENTS[rand::thread_rng().gen_range(0..USER_AGENTS.len())];

        let mut builder = Client::builder().timeout(self.request_timeout);
        if let Some(proxy) = proxy {
            builder = builder.proxy(Proxy::all(proxy)?);
        }
        let client = builder.build()?;

        let url = format!("{}?address={}", self.endpoint, address);
        let response = client.get(&url).header(USER_AGENT, user_agent).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MinterError::ApiStatus {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let payload: MintSignatureResponse = response
            .json()
            .await
            .map_err(|e| MinterError::ApiResponse(e.to_string()))?;

        if payload.signature.trim().is_empty() {
            return Err(MinterError::ApiResponse(
                "empty signature field".to_string(),
            ));
        }

        Ok(payload.signature)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}

/// Bounded-retry wrapper around a [`MintApi`]
pub struct SignatureFetcher<A: MintApi> {
    api: A,
    max_retries: u32,
    retry_delay: Duration,
}

impl<A: MintApi> SignatureFetcher<A> {
    pub fn new(api: A, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            api,
            max_retries,
            retry_delay,
        }
    }

    /// Fetch the mint authorization for an address, retrying transient
    /// failures up to the configured budget.
    pub async fn fetch_authorization(
        &self,
        address: &str,
        proxy: Option<&str>,
    ) -> MinterResult<String> {
        let mut attempts = 0;

        while attempts < self.max_retries {
            attempts += 1;

            match self.api.request_signature(address, proxy).await {
                Ok(signature) => {
                    info!(
                        "Got mint signature for {} (attempt {}/{})",
                        address, attempts, self.max_retries
                    );
                    return Ok(signature);
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        "Mint API attempt {}/{} failed for {}: {}",
                        attempts, self.max_retries, address, e
                    );
                }
                Err(e) => return Err(e),
            }

            if attempts < self.max_retries {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(MinterError::ExhaustedRetries { attempts })
    }
}
