/// DexScreener API client for current price and volume of a pair or token

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::core::{PairInfo, TrackerError, TrackerResult};

const SERVICE: &str = "dexscreener";
const CACHE_DURATION_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct DexScreenerResponse {
    #[serde(rename = "schemaVersion")]
    pub schema_version: Option<String>,
    pub pairs: Option<Vec<TokenPair>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "chainId")]
    pub chain_id: String,
    #[serde(rename = "dexId")]
    pub dex_id: String,
    #[serde(rename = "pairAddress")]
    pub pair_address: String,
    #[serde(rename = "baseToken")]
    pub base_token: BaseToken,
    #[serde(rename = "priceUsd")]
    pub price_usd: Option<String>,
    pub volume: Option<Volume>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaseToken {
    pub address: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Volume {
    pub h24: Option<f64>,
}

impl From<TokenPair> for PairInfo {
    fn from(pair: TokenPair) -> Self {
        PairInfo {
            price_usd: pair.price_usd.as_deref().and_then(|p| p.parse().ok()),
            volume_24h: pair.volume.and_then(|v| v.h24),
            pair_address: pair.pair_address,
            base_token_symbol: pair.base_token.symbol,
            dex_id: pair.dex_id,
        }
    }
}

pub struct DexScreenerClient {
    client: Client,
    base_url: String,
    cache: Arc<Mutex<HashMap<String, (Option<PairInfo>, Instant)>>>,
}

impl DexScreenerClient {
    pub fn new(config: &Config) -> TrackerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.upstream.request_timeout_secs))
            .build()
            .map_err(|e| TrackerError::Config(format!("failed to create DexScreener HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.upstream.dexscreener_base_url.trim_end_matches('/').to_string(),
            cache: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// First pair listed for `address` on `chain_id`, `None` if the feed has none
    #[instrument(skip(self))]
    pub async fn fetch_pair_info(&self, chain_id: &str, address: &str) -> TrackerResult<Option<PairInfo>> {
        let key = format!("{}/{}", chain_id, address.to_lowercase());
        if let Some(cached) = self.get_cached(&key) {
            return Ok(cached);
        }

        let url = format!("{}/pairs/{}/{}", self.base_url, chain_id, address);
        debug!("🌐 Fetching pair info from DexScreener: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TrackerError::upstream(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(TrackerError::upstream(SERVICE, format!("HTTP {}", response.status())));
        }

        let data: DexScreenerResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::upstream(SERVICE, format!("failed to parse response: {}", e)))?;

        let info = first_pair(data);
        match &info {
            Some(pair) => info!(
                "📊 DexScreener data for {}: price {:?} USD, 24h volume {:?}",
                pair.base_token_symbol, pair.price_usd, pair.volume_24h
            ),
            None => warn!("⚠️ DexScreener has no pairs for {}", address),
        }

        self.cache_info(&key, info.clone());
        Ok(info)
    }

    fn get_cached(&self, key: &str) -> Option<Option<PairInfo>> {
        let cache = self.cache.lock().ok()?;
        match cache.get(key) {
            Some((info, fetched_at)) if fetched_at.elapsed().as_secs() < CACHE_DURATION_SECS => {
                debug!("💾 Using cached DexScreener data for {}", key);
                Some(info.clone())
            }
            _ => None,
        }
    }

    fn cache_info(&self, key: &str, info: Option<PairInfo>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key.to_string(), (info, Instant::now()));
        }
    }
}

fn first_pair(response: DexScreenerResponse) -> Option<PairInfo> {
    response
        .pairs
        .and_then(|pairs| pairs.into_iter().next())
        .map(PairInfo::from)
}
