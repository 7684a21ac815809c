/// Liquidity pool lookup through the AMM factory's `getPair`

use tracing::{debug, info, instrument, warn};

use super::ExplorerApi;
use crate::config::Chain;
use crate::core::constants::GET_PAIR_SELECTOR;
use crate::core::Address;

/// Call data for `getPair(a, b)` with the pair ordered the way the factory sorts tokens
pub fn get_pair_call_data(a: &Address, b: &Address) -> String {
    let (token0, token1) = if a <= b { (a, b) } else { (b, a) };
    format!("{}{}{}", GET_PAIR_SELECTOR, token0.to_word(), token1.to_word())
}

pub struct PoolResolver {
    factory: Address,
    reference_asset: Address,
}

impl PoolResolver {
    pub fn new(factory: Address, reference_asset: Address) -> Self {
        Self {
            factory,
            reference_asset,
        }
    }

    pub fn from_chain(chain: &Chain) -> Self {
        Self::new(chain.factory_address, chain.reference_asset_address)
    }

    /// Pool for `token` paired with the reference asset, `None` when unknown.
    ///
    /// Transport failures, empty results and the zero address all degrade to
    /// `None`; the caller decides how to warn.
    #[instrument(skip(self, explorer, token), fields(token = %token))]
    pub async fn resolve_pool_address<E: ExplorerApi + ?Sized>(
        &self,
        explorer: &E,
        token: &Address,
    ) -> Option<Address> {
        let data = get_pair_call_data(token, &self.reference_asset);
        debug!("getPair call data: {}", data);

        let result = match explorer.eth_call(&self.factory, &data).await {
            Ok(result) => result,
            Err(e) => {
                warn!("⚠️ Pool lookup failed for {}: {}", token.short(), e);
                return None;
            }
        };

        match Address::from_word(&result) {
            Ok(pool) if pool.is_zero() => {
                info!("No pool registered for {} against {}", token.short(), self.reference_asset.short());
                None
            }
            Ok(pool) => {
                info!("🏊 Resolved pool {} for token {}", pool, token.short());
                Some(pool)
            }
            Err(e) => {
                warn!("⚠️ Unexpected getPair result '{}': {}", result, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BlockTag, TrackerError, TrackerResult, TransferBatch};
    use crate::ingest::TransactionReceipt;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const TOKEN: &str = "0x6982508145454ce325ddbe47a25d4ec3d2311933";
    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
    const FACTORY: &str = "0x5c69bee701ef814a2b6a3edd4b1652cb9cc5aa6f";

    struct CallOnlyExplorer {
        reply: TrackerResult<String>,
        calls: Mutex<Vec<(Address, String)>>,
    }

    impl CallOnlyExplorer {
        fn replying(reply: TrackerResult<String>) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ExplorerApi for CallOnlyExplorer {
        async fn fetch_token_transfers(&self, _contract: &Address) -> TrackerResult<TransferBatch> {
            Ok(TransferBatch::default())
        }

        async fn eth_call(&self, to: &Address, data: &str) -> TrackerResult<String> {
            self.calls.lock().unwrap().push((*to, data.to_string()));
            match &self.reply {
                Ok(value) => Ok(value.clone()),
                Err(_) => Err(TrackerError::upstream("etherscan", "connection reset")),
            }
        }

        async fn fetch_transaction_receipt(&self, _tx_hash: &str) -> TrackerResult<TransactionReceipt> {
            Ok(TransactionReceipt::default())
        }

        async fn fetch_token_balance(&self, _holder: &Address, _contract: &Address, _block: BlockTag) -> TrackerResult<u128> {
            Ok(0)
        }
    }

    fn resolver() -> PoolResolver {
        PoolResolver::new(FACTORY.parse().unwrap(), WETH.parse().unwrap())
    }

    #[test]
    fn test_call_data_is_order_independent() {
        let a: Address = TOKEN.parse().unwrap();
        let b: Address = WETH.parse().unwrap();
        let forward = get_pair_call_data(&a, &b);
        assert_eq!(forward, get_pair_call_data(&b, &a));
        assert_eq!(forward.len(), 10 + 64 * 2);
        assert!(forward.starts_with("0xe6a43905"));
        // the smaller address goes first
        assert!(forward[10..74].ends_with(&TOKEN[2..]));
        assert!(forward[74..].ends_with(&WETH[2..]));
    }

    #[tokio::test]
    async fn test_resolves_pool_from_word() {
        let pool = "0xa43fe16908251ee70ef74718545e4fe6c5ccec9f";
        let word = format!("0x{:0>64}", &pool[2..]);
        let explorer = CallOnlyExplorer::replying(Ok(word));

        let resolved = resolver()
            .resolve_pool_address(&explorer, &TOKEN.parse().unwrap())
            .await;
        assert_eq!(resolved, Some(pool.parse().unwrap()));

        let calls = explorer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, FACTORY.parse::<Address>().unwrap());
    }

    #[tokio::test]
    async fn test_zero_address_means_no_pool() {
        let explorer = CallOnlyExplorer::replying(Ok(format!("0x{}", "0".repeat(64))));
        let resolved = resolver()
            .resolve_pool_address(&explorer, &TOKEN.parse().unwrap())
            .await;
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_to_none() {
        let explorer = CallOnlyExplorer::replying(Err(TrackerError::upstream("etherscan", "down")));
        let resolved = resolver()
            .resolve_pool_address(&explorer, &TOKEN.parse().unwrap())
            .await;
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_empty_result_degrades_to_none() {
        let explorer = CallOnlyExplorer::replying(Ok("0x".to_string()));
        let resolved = resolver()
            .resolve_pool_address(&explorer, &TOKEN.parse().unwrap())
            .await;
        assert_eq!(resolved, None);
    }
}
