/// Analyzer configuration structures

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::constants::*;
use crate::core::{Address, TrackerError};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub chain: Chain,
    pub upstream: Upstream,
    pub analysis: Analysis,
    pub classification: Classification,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Chain {
    pub chain_id: u64,
    /// Chain slug used by the DEX price feed, e.g. "ethereum"
    pub dexscreener_chain: String,
    pub factory_address: Address,
    pub reference_asset_address: Address,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Upstream {
    pub explorer_base_url: String,
    pub dexscreener_base_url: String,
    pub api_key: String,
    pub request_timeout_secs: u64,
    /// Transfers requested per explorer page (most recent first)
    pub page_size: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Analysis {
    pub min_ranges: usize,
    /// Used only when an explorer record omits its token decimals
    pub default_decimals: u8,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Classification {
    pub mode: ClassificationMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMode {
    /// Compare transfer endpoints against the resolved pool address
    #[default]
    PoolAddress,
    /// Inspect each transaction receipt for swap events, falling back to the pool
    ReceiptLogs,
}

impl std::str::FromStr for ClassificationMode {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pool" | "pool_address" => Ok(ClassificationMode::PoolAddress),
            "logs" | "receipt_logs" => Ok(ClassificationMode::ReceiptLogs),
            other => Err(TrackerError::Config(format!(
                "unknown classification mode '{}', expected 'pool' or 'logs'",
                other
            ))),
        }
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self {
            chain_id: MAINNET_CHAIN_ID,
            dexscreener_chain: "ethereum".to_string(),
            factory_address: UNISWAP_V2_FACTORY.parse().unwrap_or_default(),
            reference_asset_address: WETH.parse().unwrap_or_default(),
        }
    }
}

impl Default for Upstream {
    fn default() -> Self {
        Self {
            explorer_base_url: "https://api.etherscan.io/v2/api".to_string(),
            dexscreener_base_url: "https://api.dexscreener.com/latest/dex".to_string(),
            api_key: String::new(),
            request_timeout_secs: 15,
            page_size: 100,
        }
    }
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            min_ranges: DEFAULT_MIN_RANGES,
            default_decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self, TrackerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TrackerError::Config(format!("cannot read {}: {}", path, e)))?;
        toml::from_str(&content)
            .map_err(|e| TrackerError::Config(format!("cannot parse {}: {}", path, e)))
    }

    /// File (if any) then environment overrides, then validation
    pub fn load(path: Option<&str>) -> Result<Self, TrackerError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), TrackerError> {
        if let Ok(api_key) = std::env::var("ETHERSCAN_API_KEY") {
            if !api_key.trim().is_empty() {
                self.upstream.api_key = api_key.trim().to_string();
            }
        }
        if let Ok(chain_id) = std::env::var("FERRET_CHAIN_ID") {
            self.chain.chain_id = chain_id
                .trim()
                .parse()
                .map_err(|_| TrackerError::Config(format!("FERRET_CHAIN_ID is not a number: {}", chain_id)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), TrackerError> {
        for (name, value) in [
            ("upstream.explorer_base_url", &self.upstream.explorer_base_url),
            ("upstream.dexscreener_base_url", &self.upstream.dexscreener_base_url),
        ] {
            Url::parse(value)
                .map_err(|e| TrackerError::Config(format!("{} is not a valid URL: {}", name, e)))?;
        }
        if self.upstream.request_timeout_secs == 0 {
            return Err(TrackerError::Config("upstream.request_timeout_secs must be positive".into()));
        }
        if self.upstream.page_size == 0 {
            return Err(TrackerError::Config("upstream.page_size must be positive".into()));
        }
        if self.analysis.min_ranges == 0 {
            return Err(TrackerError::Config("analysis.min_ranges must be at least 1".into()));
        }
        if self.chain.factory_address.is_zero() || self.chain.reference_asset_address.is_zero() {
            return Err(TrackerError::Config("factory and reference asset addresses must be set".into()));
        }
        Ok(())
    }
}
