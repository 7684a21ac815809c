/// Multi-window wallet correlation
///
/// Classified transactions are bucketed into every range that contains them
/// (ranges may overlap), then each wallet collects the indices of the ranges it
/// appeared in. Wallets seen in at least `min_ranges` ranges are reported as active.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::{Address, ClassifiedTransaction, TimeRange};

pub type WalletActivity = BTreeMap<Address, BTreeSet<usize>>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CorrelationReport {
    pub min_ranges: usize,
    /// One entry per range index, empty buckets included
    pub range_buckets: BTreeMap<usize, Vec<ClassifiedTransaction>>,
    /// Wallets meeting the threshold, with the ranges they were active in
    pub active_wallets: WalletActivity,
}

/// Per-range counts for the "nothing qualified" diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeDiagnostic {
    pub range_index: usize,
    pub transactions: usize,
    pub unique_wallets: usize,
}

impl CorrelationReport {
    pub fn total_transactions(&self) -> usize {
        self.range_buckets.values().map(Vec::len).sum()
    }

    pub fn has_active_wallets(&self) -> bool {
        !self.active_wallets.is_empty()
    }

    /// A wallet's transactions inside one range, in bucket order
    pub fn transactions_for<'a>(
        &'a self,
        wallet: &'a Address,
        range_index: usize,
    ) -> impl Iterator<Item = &'a ClassifiedTransaction> + 'a {
        self.range_buckets
            .get(&range_index)
            .into_iter()
            .flatten()
            .filter(move |tx| tx.wallet == *wallet)
    }

    pub fn range_diagnostics(&self) -> Vec<RangeDiagnostic> {
        self.range_buckets
            .iter()
            .map(|(&range_index, txs)| RangeDiagnostic {
                range_index,
                transactions: txs.len(),
                unique_wallets: txs.iter().map(|tx| &tx.wallet).collect::<BTreeSet<_>>().len(),
            })
            .collect()
    }
}

/// Linear scan of every transaction against every range
pub fn bucket_by_range(
    transactions: &[ClassifiedTransaction],
    ranges: &[TimeRange],
) -> BTreeMap<usize, Vec<ClassifiedTransaction>> {
    let mut buckets: BTreeMap<usize, Vec<ClassifiedTransaction>> =
        (0..ranges.len()).map(|index| (index, Vec::new())).collect();

    for tx in transactions {
        for (index, range) in ranges.iter().enumerate() {
            if range.contains(tx.timestamp) {
                if let Some(bucket) = buckets.get_mut(&index) {
                    bucket.push(tx.clone());
                }
            }
        }
    }
    buckets
}

/// Every wallet with the set of range indices it appears in
pub fn wallet_activity(buckets: &BTreeMap<usize, Vec<ClassifiedTransaction>>) -> WalletActivity {
    let mut activity = WalletActivity::new();
    for (&range_index, txs) in buckets {
        for tx in txs {
            activity.entry(tx.wallet).or_default().insert(range_index);
        }
    }
    activity
}

pub fn find_active_wallets(
    buckets: &BTreeMap<usize, Vec<ClassifiedTransaction>>,
    min_ranges: usize,
) -> WalletActivity {
    wallet_activity(buckets)
        .into_iter()
        .filter(|(_, ranges)| ranges.len() >= min_ranges)
        .collect()
}

pub fn correlate(
    transactions: &[ClassifiedTransaction],
    ranges: &[TimeRange],
    min_ranges: usize,
) -> CorrelationReport {
    let range_buckets = bucket_by_range(transactions, ranges);
    let active_wallets = find_active_wallets(&range_buckets, min_ranges);
    CorrelationReport {
        min_ranges,
        range_buckets,
        active_wallets,
    }
}
