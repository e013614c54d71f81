//! Mint transaction submitter
//!
//! One on-chain attempt per account per pass: derive the wallet, fetch the
//! mint authorization, encode the call, estimate gas, sign, broadcast, and
//! wait for the receipt. Retry policy lives in the layers around this one.

use crate::api::{MintApi, SignatureFetcher};
use crate::chain::ChainProvider;
use crate::error::{MinterError, MinterResult};

use async_trait::async_trait;
use ethers::abi::{Function, Token};
use ethers::prelude::*;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::utils::to_checksum;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a single mined mint transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintOutcome {
    /// Receipt status 1
    Minted { tx_hash: H256 },
    /// Receipt status 0
    Reverted { tx_hash: H256 },
}

/// Submits one mint transaction for a private key
#[async_trait]
pub trait MintSubmit: Send + Sync {
    async fn submit(&self, key: &str, proxy: Option<&str>) -> MinterResult<MintOutcome>;
}

/// Builds, signs, and broadcasts mint transactions
pub struct MintSubmitter<A: MintApi> {
    provider: Arc<ChainProvider>,
    fetcher: SignatureFetcher<A>,
    mint_function: Function,
    contract_address: Address,
    confirm_timeout: Duration,
}

impl<A: MintApi> MintSubmitter<A> {
    pub fn new(
        provider: Arc<ChainProvider>,
        fetcher: SignatureFetcher<A>,
        mint_function: Function,
        contract_address: Address,
        confirm_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            fetcher,
            mint_function,
            contract_address,
            confirm_timeout,
        }
    }
}

#[async_trait]
impl<A: MintApi> MintSubmit for MintSubmitter<A> {
    async fn submit(&self, key: &str, proxy: Option<&str>) -> MinterResult<MintOutcome> {
        let wallet: LocalWallet = key
            .trim()
            .parse()
            .map_err(|e| MinterError::Wallet(format!("Invalid private key: {}", e)))?;
        let wallet = wallet.with_chain_id(self.provider.chain_id());
        let address = wallet.address();
        let checksum = to_checksum(&address, None);

        let signature = self.fetcher.fetch_authorization(&checksum, proxy).await?;
        let calldata = encode_mint_call(&self.mint_function, &signature)?;

        let nonce = self.provider.get_nonce(address).await?;
        let gas_price = self.provider.gas_price().await?;

        let request = TransactionRequest::new()
            .from(address)
            .to(self.contract_address)
            .data(calldata)
            .nonce(nonce)
            .gas_price(gas_price);
        let mut tx: TypedTransaction = request.into();
        tx.set_chain_id(self.provider.chain_id());

        let gas_limit = self.provider.estimate_gas(&tx).await?;
        tx.set_gas(gas_limit);

        let sig = wallet
            .sign_transaction(&tx)
            .await
            .map_err(|e| MinterError::Wallet(e.to_string()))?;
        let raw = tx.rlp_signed(&sig);

        let receipt = self
            .provider
            .send_and_confirm(raw, self.confirm_timeout)
            .await?;
        let tx_hash = receipt.transaction_hash;

        if receipt.status == Some(U64::from(1)) {
            info!("{} | Successfully minted, tx {:?}", checksum, tx_hash);
            Ok(MintOutcome::Minted { tx_hash })
        } else {
            warn!("{} | Mint transaction reverted, tx {:?}", checksum, tx_hash);
            Ok(MintOutcome::Reverted { tx_hash })
        }
    }
}

/// Encode the season1 mint call: ids `[4]`, amounts `[1]`, quantity `1`,
/// plus the authorization signature bytes.
fn encode_mint_call(function: &Function, signature_hex: &str) -> MinterResult<Bytes> {
    let signature = hex::decode(signature_hex.trim_start_matches("0x"))
        .map_err(|e| MinterError::ApiResponse(format!("Signature is not hex: {}", e)))?;

    let tokens = [
        Token::Array(vec![Token::Uint(U256::from(4u64))]),
        Token::Array(vec![Token::Uint(U256::from(1u64))]),
        Token::Uint(U256::from(1u64)),
        Token::Bytes(signature),
    ];

    let data = function
        .encode_input(&tokens)
        .map_err(|e| MinterError::Chain(format!("Failed to encode mint call: {}", e)))?;

    Ok(data.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::utils::id;

    fn mint_function() -> Function {
        serde_json::from_str(
            r#"{
                "inputs": [
                    {"internalType": "uint256[]", "name": "ids", "type": "uint256[]"},
                    {"internalType": "uint256[]", "name": "amounts", "type": "uint256[]"},
                    {"internalType": "uint256", "name": "quantity", "type": "uint256"},
                    {"internalType": "bytes", "name": "signature", "type": "bytes"}
                ],
                "name": "mint",
                "outputs": [],
                "stateMutability": "nonpayable",
                "type": "function"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn mint_calldata_has_expected_selector_and_args() {
        let function = mint_function();
        let data = encode_mint_call(&function, "0xdeadbeef").unwrap();

        let selector = id("mint(uint256[],uint256[],uint256,bytes)");
        assert_eq!(&data[..4], selector.as_slice());

        let tokens = function.decode_input(&data[4..]).unwrap();
        assert_eq!(
            tokens[0],
            Token::Array(vec![Token::Uint(U256::from(4u64))])
        );
        assert_eq!(
            tokens[1],
            Token::Array(vec![Token::Uint(U256::from(1u64))])
        );
        assert_eq!(tokens[2], Token::Uint(U256::from(1u64)));
        assert_eq!(tokens[3], Token::Bytes(vec![0xde, 0xad, 0xbe, 0xef]));
    }

    #[test]
    fn signature_without_prefix_is_accepted() {
        let data = encode_mint_call(&mint_function(), "deadbeef").unwrap();
        let tokens = mint_function().decode_input(&data[4..]).unwrap();
        assert_eq!(tokens[3], Token::Bytes(vec![0xde, 0xad, 0xbe, 0xef]));
    }

    #[test]
    fn non_hex_signature_is_rejected() {
        let err = encode_mint_call(&mint_function(), "0xzzzz").unwrap_err();
        assert!(matches!(err, MinterError::ApiResponse(_)));
    }
}
