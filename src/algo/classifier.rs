/// BUY / SELL / TRANSFER labelling of token transfers

use crate::core::dex_types::utils::scale_amount;
use crate::core::{Address, ClassifiedTransaction, SwapDirection, TransferEvent, TxType};

/// Label a transfer against the pool.
///
/// With a pool, tokens leaving it are a BUY by the recipient and tokens entering
/// it are a SELL by the sender; transfers that do not touch the pool return
/// `None`. Without a pool every transfer is a TRANSFER attributed to the recipient.
pub fn classify(transfer: &TransferEvent, pool: Option<&Address>) -> Option<ClassifiedTransaction> {
    let (tx_type, wallet) = match pool {
        Some(pool) if transfer.from == *pool => (TxType::Buy, transfer.to),
        Some(pool) if transfer.to == *pool => (TxType::Sell, transfer.from),
        Some(_) => return None,
        None => (TxType::Transfer, transfer.to),
    };

    Some(ClassifiedTransaction {
        wallet,
        tx_type,
        timestamp: transfer.timestamp,
        amount: transfer.scaled_amount(),
        hash: transfer.hash.clone(),
    })
}

/// Prefer a direction recovered from receipt logs, otherwise fall back to [`classify`].
///
/// A log-derived result is attributed to the wallet it names, the sender of the
/// transaction that emitted the receipt.
pub fn classify_with_swap(
    transfer: &TransferEvent,
    pool: Option<&Address>,
    swap: Option<SwapDirection>,
) -> Option<ClassifiedTransaction> {
    match swap {
        Some(swap) => Some(ClassifiedTransaction {
            wallet: swap.wallet,
            tx_type: swap.tx_type,
            timestamp: transfer.timestamp,
            amount: scale_amount(swap.amount, transfer.token_decimals),
            hash: transfer.hash.clone(),
        }),
        None => classify(transfer, pool),
    }
}

pub fn classify_all(transfers: &[TransferEvent], pool: Option<&Address>) -> Vec<ClassifiedTransaction> {
    transfers
        .iter()
        .filter_map(|transfer| classify(transfer, pool))
        .collect()
}
