/// Etherscan-compatible explorer client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::{ExplorerApi, TransactionReceipt};
use crate::config::Config;
use crate::core::dex_types::utils::parse_hex_quantity;
use crate::core::{Address, BlockTag, TrackerError, TrackerResult, TransferBatch, TransferEvent};

const SERVICE: &str = "etherscan";
const NO_TRANSACTIONS: &str = "No transactions found";

/// `module=account` style envelope
#[derive(Debug, Deserialize)]
struct AccountResponse {
    status: String,
    message: String,
    #[serde(default)]
    result: Value,
}

/// `module=proxy` JSON-RPC envelope
#[derive(Debug, Deserialize)]
struct ProxyResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    message: String,
}

/// A `tokentx` record exactly as the explorer sends it; every field is checked
/// before it becomes a [`TransferEvent`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenTransfer {
    pub block_number: Option<String>,
    pub time_stamp: Option<String>,
    pub hash: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub value: Option<String>,
    pub token_decimal: Option<String>,
}

fn required<'a>(field: &'a Option<String>, name: &str) -> TrackerResult<&'a str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| TrackerError::MalformedRecord(format!("missing field '{}'", name)))
}

fn numeric<T: std::str::FromStr>(field: &Option<String>, name: &str) -> TrackerResult<T> {
    let raw = required(field, name)?;
    raw.parse()
        .map_err(|_| TrackerError::MalformedRecord(format!("field '{}' is not a number: {}", name, raw)))
}

impl RawTokenTransfer {
    /// `default_decimals` only fills a missing `tokenDecimal`
    pub fn into_transfer(self, default_decimals: u8) -> TrackerResult<TransferEvent> {
        let token_decimals = match self.token_decimal.as_deref().map(str::trim) {
            None | Some("") => default_decimals,
            Some(_) => numeric(&self.token_decimal, "tokenDecimal")?,
        };

        Ok(TransferEvent {
            hash: required(&self.hash, "hash")?.to_lowercase(),
            block_number: numeric(&self.block_number, "blockNumber")?,
            from: required(&self.from, "from")?.parse()?,
            to: required(&self.to, "to")?.parse()?,
            amount: numeric(&self.value, "value")?,
            timestamp: numeric(&self.time_stamp, "timeStamp")?,
            token_decimals,
        })
    }
}

/// Validate a page of raw records, counting and dropping the bad ones
pub fn validate_transfers(records: Vec<RawTokenTransfer>, default_decimals: u8) -> TransferBatch {
    let mut batch = TransferBatch::default();
    for record in records {
        let hash = record.hash.clone().unwrap_or_default();
        match record.into_transfer(default_decimals) {
            Ok(transfer) => batch.transfers.push(transfer),
            Err(e) => {
                warn!("⚠️ Rejected transfer record {}: {}", hash, e);
                batch.rejected += 1;
            }
        }
    }
    batch
}

pub struct EtherscanClient {
    client: Client,
    base_url: String,
    api_key: String,
    chain_id: u64,
    page_size: u32,
    default_decimals: u8,
}

impl EtherscanClient {
    pub fn new(config: &Config) -> TrackerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.upstream.request_timeout_secs))
            .build()
            .map_err(|e| TrackerError::Config(format!("failed to create explorer HTTP client: {}", e)))?;

        if config.upstream.api_key.is_empty() {
            warn!("⚠️ No explorer API key configured (set ETHERSCAN_API_KEY); requests may be throttled");
        }

        Ok(Self {
            client,
            base_url: config.upstream.explorer_base_url.clone(),
            api_key: config.upstream.api_key.clone(),
            chain_id: config.chain.chain_id,
            page_size: config.upstream.page_size,
            default_decimals: config.analysis.default_decimals,
        })
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> TrackerResult<T> {
        let chain_id = self.chain_id.to_string();
        let mut query: Vec<(&str, &str)> = vec![("chainid", chain_id.as_str())];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        query.push(("apikey", self.api_key.as_str()));

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| TrackerError::upstream(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(TrackerError::upstream(SERVICE, format!("HTTP {}", response.status())));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TrackerError::upstream(SERVICE, format!("failed to decode response: {}", e)))
    }

    async fn proxy(&self, params: &[(&str, String)]) -> TrackerResult<Value> {
        let response: ProxyResponse = self.get(params).await?;
        if let Some(error) = response.error {
            return Err(TrackerError::upstream(
                SERVICE,
                format!("JSON-RPC error {}: {}", error.code, error.message),
            ));
        }
        Ok(response.result)
    }
}

#[async_trait]
impl ExplorerApi for EtherscanClient {
    #[instrument(skip(self, contract), fields(contract = %contract))]
    async fn fetch_token_transfers(&self, contract: &Address) -> TrackerResult<TransferBatch> {
        info!("🌐 Fetching token transfers for {}", contract);

        let response: AccountResponse = self
            .get(&[
                ("module", "account".to_string()),
                ("action", "tokentx".to_string()),
                ("contractaddress", contract.to_string()),
                ("page", "1".to_string()),
                ("offset", self.page_size.to_string()),
                ("sort", "desc".to_string()),
            ])
            .await?;

        if response.status != "1" {
            if response.message.starts_with(NO_TRANSACTIONS) {
                return Ok(TransferBatch::default());
            }
            return Err(TrackerError::upstream(
                SERVICE,
                format!("API error: {} ({})", response.message, response.result),
            ));
        }

        let records: Vec<RawTokenTransfer> = serde_json::from_value(response.result)
            .map_err(|e| TrackerError::upstream(SERVICE, format!("unexpected tokentx payload: {}", e)))?;
        let batch = validate_transfers(records, self.default_decimals);

        info!(
            "📄 Received {} transfers ({} rejected)",
            batch.transfers.len(),
            batch.rejected
        );
        Ok(batch)
    }

    #[instrument(skip(self, to, data), fields(to = %to))]
    async fn eth_call(&self, to: &Address, data: &str) -> TrackerResult<String> {
        let result = self
            .proxy(&[
                ("module", "proxy".to_string()),
                ("action", "eth_call".to_string()),
                ("to", to.to_string()),
                ("data", data.to_string()),
                ("tag", "latest".to_string()),
            ])
            .await?;

        match result.as_str() {
            Some(hex) if hex.starts_with("0x") => Ok(hex.to_string()),
            // rate-limit notices arrive as plain strings in `result`
            _ => Err(TrackerError::upstream(SERVICE, format!("unexpected eth_call result: {}", result))),
        }
    }

    #[instrument(skip(self))]
    async fn fetch_transaction_receipt(&self, tx_hash: &str) -> TrackerResult<TransactionReceipt> {
        let result = self
            .proxy(&[
                ("module", "proxy".to_string()),
                ("action", "eth_getTransactionReceipt".to_string()),
                ("txhash", tx_hash.to_string()),
            ])
            .await?;

        if result.is_null() {
            debug!("No receipt yet for {}", tx_hash);
            return Ok(TransactionReceipt::default());
        }

        serde_json::from_value(result)
            .map_err(|e| TrackerError::upstream(SERVICE, format!("malformed receipt for {}: {}", tx_hash, e)))
    }

    #[instrument(skip(self, holder, contract), fields(holder = %holder))]
    async fn fetch_token_balance(
        &self,
        holder: &Address,
        contract: &Address,
        block: BlockTag,
    ) -> TrackerResult<u128> {
        let response: AccountResponse = self
            .get(&[
                ("module", "account".to_string()),
                ("action", "tokenbalance".to_string()),
                ("contractaddress", contract.to_string()),
                ("address", holder.to_string()),
                ("tag", block.to_string()),
            ])
            .await?;

        if response.status != "1" {
            return Err(TrackerError::upstream(
                SERVICE,
                format!("API error: {} ({})", response.message, response.result),
            ));
        }

        let balance = match response.result.as_str() {
            Some(raw) if raw.starts_with("0x") => parse_hex_quantity(raw),
            Some(raw) => raw.parse().ok(),
            None => None,
        };
        balance.ok_or_else(|| TrackerError::upstream(SERVICE, format!("unexpected balance: {}", response.result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(value: &str, decimals: Option<&str>) -> RawTokenTransfer {
        RawTokenTransfer {
            block_number: Some("19000000".to_string()),
            time_stamp: Some("1709112600".to_string()),
            hash: Some("0xABC".to_string()),
            from: Some("0xA43fe16908251ee70EF74718545e4FE6C5cCEc9f".to_string()),
            to: Some("0x00000000000000000000000000000000000000aa".to_string()),
            value: Some(value.to_string()),
            token_decimal: decimals.map(str::to_string),
        }
    }

    #[test]
    fn test_tokentx_page_deserializes() {
        let body = r#"{
            "status": "1",
            "message": "OK",
            "result": [{
                "blockNumber": "19326553",
                "timeStamp": "1709112611",
                "hash": "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060",
                "from": "0xa43fe16908251ee70ef74718545e4fe6c5ccec9f",
                "to": "0x4b0e3d4e8c1f3e6cf3ae7c8e7d8f9b8a2c7d6e5f",
                "value": "1000000000000000000000",
                "contractAddress": "0x6982508145454ce325ddbe47a25d4ec3d2311933",
                "tokenName": "Pepe",
                "tokenSymbol": "PEPE",
                "tokenDecimal": "18"
            }]
        }"#;
        let response: AccountResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.status, "1");
        let records: Vec<RawTokenTransfer> = serde_json::from_value(response.result).unwrap();
        let batch = validate_transfers(records, 18);
        assert_eq!(batch.rejected, 0);
        let transfer = &batch.transfers[0];
        assert_eq!(transfer.amount, 1_000_000_000_000_000_000_000);
        assert_eq!(transfer.timestamp, 1709112611);
        assert_eq!(transfer.token_decimals, 18);
        assert_eq!(transfer.block_number, 19326553);
    }

    #[test]
    fn test_record_validation_rejects_bad_fields() {
        let records = vec![
            raw("100", Some("6")),
            raw("not-a-number", Some("6")),
            RawTokenTransfer {
                from: Some("0x123".to_string()),
                ..raw("1", Some("6"))
            },
            RawTokenTransfer {
                time_stamp: None,
                ..raw("1", Some("6"))
            },
        ];
        let batch = validate_transfers(records, 18);
        assert_eq!(batch.transfers.len(), 1);
        assert_eq!(batch.rejected, 3);
        assert_eq!(batch.transfers[0].token_decimals, 6);
        assert_eq!(batch.transfers[0].hash, "0xabc");
    }

    #[test]
    fn test_missing_decimals_uses_default() {
        let transfer = raw("5", None).into_transfer(9).unwrap();
        assert_eq!(transfer.token_decimals, 9);
        let transfer = raw("5", Some("")).into_transfer(12).unwrap();
        assert_eq!(transfer.token_decimals, 12);
    }

    #[test]
    fn test_proxy_error_envelope() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"execution reverted"}}"#;
        let response: ProxyResponse = serde_json::from_str(body).unwrap();
        assert!(response.result.is_null());
        assert_eq!(response.error.unwrap().message, "execution reverted");
    }

    #[test]
    fn test_receipt_logs_deserialize() {
        let body = r#"{
            "blockNumber": "0x1",
            "from": "0x00000000000000000000000000000000000000AA",
            "logs": [{
                "address": "0x6982508145454ce325ddbe47a25d4ec3d2311933",
                "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
                "data": "0x01"
            }]
        }"#;
        let receipt: TransactionReceipt = serde_json::from_str(body).unwrap();
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(
            receipt.from,
            Some("0x00000000000000000000000000000000000000aa".parse().unwrap())
        );
    }
}
