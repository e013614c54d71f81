//! Configuration management for the fundrop minter
//!
//! Loads configuration from TOML files with environment variable substitution,
//! plus the four input files the batch needs: private keys, proxies, the RPC
//! endpoint map, and the contract ABI.

use anyhow::{Context, Result};
use ethers::abi::{Abi, Function};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub minter: MinterConfig,
    pub chain: ChainConfig,
    pub inputs: InputsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinterConfig {
    /// Skip the fee gate entirely when false
    pub check_fee: bool,
    /// Gas price ceiling in gwei
    pub max_fee_gwei: f64,
    /// Interval between fee polls
    pub fee_poll_interval_secs: u64,
    /// Upper bound on total time spent waiting for an acceptable fee
    pub fee_wait_timeout_secs: u64,
    /// Signature fetch attempt budget
    pub api_max_retries: u32,
    /// Delay between signature fetch attempts
    pub api_retry_delay_ms: u64,
    /// Per-request timeout for the mint API
    pub request_timeout_secs: u64,
    /// How long to wait for a transaction receipt
    pub confirm_timeout_secs: u64,
    /// Inter-account sleep bounds, inclusive
    pub sleep_from_secs: u64,
    pub sleep_to_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_map_path: PathBuf,
    pub contract_address: String,
    pub abi_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputsConfig {
    pub private_keys_path: PathBuf,
    pub proxies_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> Result<Self> {
        let config_path = env::var("FUNDROP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::parse(&config_str)
    }

    /// Parse settings from a TOML string
    pub fn parse(config_str: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.minter.api_max_retries == 0 {
            anyhow::bail!("api_max_retries must be at least 1");
        }
        if self.minter.sleep_from_secs > self.minter.sleep_to_secs {
            anyhow::bail!(
                "sleep_from_secs ({}) must not exceed sleep_to_secs ({})",
                self.minter.sleep_from_secs,
                self.minter.sleep_to_secs
            );
        }
        if self.chain.contract_address.is_empty() {
            anyhow::bail!("Contract address must be configured");
        }
        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

/// Load a newline-delimited input file, skipping blank lines
pub fn load_lines(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {:?}", path))?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

#[derive(Debug, Deserialize)]
struct RpcEndpoints {
    rpc: Vec<String>,
}

/// Load the RPC URLs for a chain from the JSON endpoint map
pub fn load_rpc_urls(path: &Path, chain_name: &str) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read RPC map: {:?}", path))?;

    let map: HashMap<String, RpcEndpoints> =
        serde_json::from_str(&contents).with_context(|| "Failed to parse RPC map")?;

    let entry = map
        .get(chain_name)
        .with_context(|| format!("Chain {} not present in RPC map", chain_name))?;

    if entry.rpc.is_empty() {
        anyhow::bail!("Chain {} has no RPC URLs configured", chain_name);
    }

    Ok(entry.rpc.clone())
}

/// Load the contract ABI and extract the mint function
pub fn load_mint_function(path: &Path) -> Result<Function> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ABI file: {:?}", path))?;

    let abi: Abi = serde_json::from_str(&contents).with_context(|| "Failed to parse ABI")?;

    abi.function("mint")
        .cloned()
        .with_context(|| "ABI has no mint function")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [minter]
        check_fee = true
        max_fee_gwei = 20.0
        fee_poll_interval_secs = 60
        fee_wait_timeout_secs = 3600
        api_max_retries = 3
        api_retry_delay_ms = 1000
        request_timeout_secs = 30
        confirm_timeout_secs = 300
        sleep_from_secs = 30
        sleep_to_secs = 90

        [chain]
        name = "ethereum"
        chain_id = 1
        rpc_map_path = "data/rpcs.json"
        contract_address = "0xfFFffffFB9059A7285849baFddf324e2c308c164"
        abi_path = "data/abi/mintfun_season1.json"

        [inputs]
        private_keys_path = "data/private_keys.txt"
        proxies_path = "data/proxy.txt"

        [output]
        dir = "."
    "#;

    #[test]
    fn test_parse_sample_config() {
        let settings = Settings::parse(SAMPLE).unwrap();
        assert!(settings.minter.check_fee);
        assert_eq!(settings.minter.max_fee_gwei, 20.0);
        assert_eq!(settings.minter.api_max_retries, 3);
        assert_eq!(settings.chain.chain_id, 1);
        assert_eq!(settings.chain.name, "ethereum");
    }

    #[test]
    fn test_inverted_sleep_range_rejected() {
        let bad = SAMPLE.replace("sleep_from_secs = 30", "sleep_from_secs = 120");
        assert!(Settings::parse(&bad).is_err());
    }

    #[test]
    fn test_zero_retry_budget_rejected() {
        let bad = SAMPLE.replace("api_max_retries = 3", "api_max_retries = 0");
        assert!(Settings::parse(&bad).is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_load_lines_skips_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0xaaa\n\n  0xbbb  \n").unwrap();
        let lines = load_lines(file.path()).unwrap();
        assert_eq!(lines, vec!["0xaaa", "0xbbb"]);
    }

    #[test]
    fn test_load_rpc_urls() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"ethereum": {{"rpc": ["https://eth.llamarpc.com"]}}}}"#
        )
        .unwrap();
        let urls = load_rpc_urls(file.path(), "ethereum").unwrap();
        assert_eq!(urls, vec!["https://eth.llamarpc.com"]);
        assert!(load_rpc_urls(file.path(), "base").is_err());
    }

    #[test]
    fn test_load_mint_function() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"inputs":[{{"internalType":"uint256[]","name":"ids","type":"uint256[]"}},{{"internalType":"uint256[]","name":"amounts","type":"uint256[]"}},{{"internalType":"uint256","name":"quantity","type":"uint256"}},{{"internalType":"bytes","name":"signature","type":"bytes"}}],"name":"mint","outputs":[],"stateMutability":"nonpayable","type":"function"}}]"#
        )
        .unwrap();
        let function = load_mint_function(file.path()).unwrap();
        assert_eq!(function.name, "mint");
        assert_eq!(function.inputs.len(), 4);
    }
}
