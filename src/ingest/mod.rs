/// Upstream blockchain-explorer access and on-chain data decoding

pub mod etherscan;
pub mod log_decoder;
pub mod pool_resolver;

pub use etherscan::EtherscanClient;
pub use log_decoder::{decode_swap_log, EventSignature, LogEntry, TransactionReceipt};
pub use pool_resolver::PoolResolver;

use async_trait::async_trait;

use crate::core::{Address, BlockTag, TrackerResult, TransferBatch};

/// Calls the analyzer needs from a blockchain explorer
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    /// Most recent token transfers for `contract`, newest first, one page
    async fn fetch_token_transfers(&self, contract: &Address) -> TrackerResult<TransferBatch>;

    /// Raw hex result of a read-only contract call at the latest block
    async fn eth_call(&self, to: &Address, data: &str) -> TrackerResult<String>;

    /// Sender and logs of a mined transaction
    async fn fetch_transaction_receipt(&self, tx_hash: &str) -> TrackerResult<TransactionReceipt>;

    async fn fetch_token_balance(
        &self,
        holder: &Address,
        contract: &Address,
        block: BlockTag,
    ) -> TrackerResult<u128>;
}
