/// One analysis pass: fetch, resolve the pool, classify, correlate

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, instrument, warn};

use crate::algo::classifier::{classify, classify_with_swap};
use crate::algo::correlator::{correlate, CorrelationReport};
use crate::config::{ClassificationMode, Config};
use crate::core::{
    Address, BlockTag, ClassifiedTransaction, EmptyReason, TimeRange, TrackerError, TrackerResult,
    TransferEvent,
};
use crate::ingest::{ExplorerApi, PoolResolver, TransactionReceipt};

/// Everything the CLI needs to render a correlation result
#[derive(Debug)]
pub struct AnalysisReport {
    pub token: Address,
    pub pool: Option<Address>,
    pub ranges: Vec<TimeRange>,
    pub transactions: Vec<ClassifiedTransaction>,
    /// Decimals reported on the newest transfer
    pub token_decimals: Option<u8>,
    pub correlation: CorrelationReport,
    /// Non-fatal problems met along the way, e.g. no pool
    pub warnings: Vec<TrackerError>,
    /// Upstream records dropped by field validation
    pub rejected_records: usize,
}

pub struct WalletAnalyzer<E: ExplorerApi> {
    explorer: E,
    resolver: PoolResolver,
    mode: ClassificationMode,
}

impl<E: ExplorerApi> WalletAnalyzer<E> {
    pub fn new(explorer: E, config: &Config) -> Self {
        Self {
            explorer,
            resolver: PoolResolver::from_chain(&config.chain),
            mode: config.classification.mode,
        }
    }

    pub fn with_mode(mut self, mode: ClassificationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn explorer(&self) -> &E {
        &self.explorer
    }

    #[instrument(skip(self, ranges), fields(ranges = ranges.len()))]
    pub async fn analyze(
        &self,
        token: &str,
        ranges: &[TimeRange],
        min_ranges: usize,
    ) -> TrackerResult<AnalysisReport> {
        // validated before any network traffic
        let token: Address = token.trim().parse()?;
        if ranges.is_empty() {
            return Err(TrackerError::EmptyResult(EmptyReason::NoRanges));
        }

        let batch = self.explorer.fetch_token_transfers(&token).await?;
        if batch.transfers.is_empty() {
            return Err(TrackerError::EmptyResult(EmptyReason::NoTransfers));
        }

        let mut warnings = Vec::new();
        let pool = self.resolver.resolve_pool_address(&self.explorer, &token).await;
        if pool.is_none() {
            warn!("⚠️ No pool for {}; falling back to plain TRANSFER classification", token);
            warnings.push(TrackerError::NoPoolResolved { token });
        }

        let transactions = match self.mode {
            ClassificationMode::PoolAddress => batch
                .transfers
                .iter()
                .filter_map(|transfer| classify(transfer, pool.as_ref()))
                .collect(),
            ClassificationMode::ReceiptLogs => {
                self.classify_from_receipts(&token, &batch.transfers, pool.as_ref(), &mut warnings)
                    .await
            }
        };
        info!(
            "🏷️ Classified {} of {} transfers",
            transactions.len(),
            batch.transfers.len()
        );

        let correlation = correlate(&transactions, ranges, min_ranges);
        if correlation.total_transactions() == 0 {
            return Err(TrackerError::EmptyResult(EmptyReason::NoTransactionsInRanges));
        }
        info!(
            "🔗 {} wallets active in at least {} ranges",
            correlation.active_wallets.len(),
            min_ranges
        );

        Ok(AnalysisReport {
            token,
            pool,
            ranges: ranges.to_vec(),
            transactions,
            token_decimals: batch.transfers.first().map(|t| t.token_decimals),
            correlation,
            warnings,
            rejected_records: batch.rejected,
        })
    }

    /// One receipt per transaction hash, fetched sequentially and reused for every
    /// transfer row of that transaction; a failed receipt falls back to the pool heuristic
    async fn classify_from_receipts(
        &self,
        token: &Address,
        transfers: &[TransferEvent],
        pool: Option<&Address>,
        warnings: &mut Vec<TrackerError>,
    ) -> Vec<ClassifiedTransaction> {
        let mut classified = Vec::with_capacity(transfers.len());
        let mut receipts: HashMap<String, Option<TransactionReceipt>> = HashMap::new();
        let mut failed_receipts = 0usize;

        for transfer in transfers {
            if !receipts.contains_key(&transfer.hash) {
                let receipt = match self.explorer.fetch_transaction_receipt(&transfer.hash).await {
                    Ok(receipt) => Some(receipt),
                    Err(e) => {
                        debug!("Receipt for {} unavailable: {}", transfer.hash, e);
                        failed_receipts += 1;
                        None
                    }
                };
                receipts.insert(transfer.hash.clone(), receipt);
            }

            let swap = receipts
                .get(&transfer.hash)
                .and_then(Option::as_ref)
                .and_then(|receipt| receipt.swap_direction(token));
            if let Some(tx) = classify_with_swap(transfer, pool, swap) {
                classified.push(tx);
            }
        }

        if failed_receipts > 0 {
            warn!("⚠️ {} receipts could not be fetched", failed_receipts);
            warnings.push(TrackerError::upstream(
                "etherscan",
                format!(
                    "{} of {} receipts unavailable; used pool heuristic for those",
                    failed_receipts,
                    receipts.len()
                ),
            ));
        }
        classified
    }

    /// Token balance of each qualifying wallet at `block`; lookups that fail are skipped
    pub async fn fetch_balances(&self, report: &AnalysisReport, block: BlockTag) -> BTreeMap<Address, u128> {
        let mut balances = BTreeMap::new();
        for wallet in report.correlation.active_wallets.keys() {
            match self.explorer.fetch_token_balance(wallet, &report.token, block).await {
                Ok(balance) => {
                    balances.insert(*wallet, balance);
                }
                Err(e) => warn!("⚠️ Balance lookup failed for {}: {}", wallet.short(), e),
            }
        }
        balances
    }
}
