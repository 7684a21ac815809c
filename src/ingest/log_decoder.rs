/// Receipt log decoding: known event signatures and swap-direction detection

use serde::Deserialize;
use tracing::debug;

use crate::core::dex_types::utils::parse_hex_quantity;
use crate::core::{Address, SwapDirection, TrackerError, TxType};

/// Event signatures recognised in receipt logs, keyed by topic 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSignature {
    /// `Transfer(address,address,uint256)`
    Transfer,
    /// Uniswap V2 `Swap(address,uint256,uint256,uint256,uint256,address)`
    SwapV2,
}

impl EventSignature {
    pub const ALL: [EventSignature; 2] = [EventSignature::Transfer, EventSignature::SwapV2];

    pub fn topic(&self) -> &'static str {
        match self {
            EventSignature::Transfer => {
                "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
            }
            EventSignature::SwapV2 => {
                "0xd78ad95fa46c994b6551d0da85fc275fe613ce37657fb8d5e3d130840159d822"
            }
        }
    }

    pub fn from_topic(topic: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|signature| signature.topic().eq_ignore_ascii_case(topic))
    }

    pub fn is_swap(&self) -> bool {
        matches!(self, EventSignature::SwapV2)
    }
}

/// One log entry from a transaction receipt
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEntry {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

impl LogEntry {
    pub fn signature(&self) -> Option<EventSignature> {
        self.topics.first().and_then(|topic| EventSignature::from_topic(topic))
    }
}

/// The parts of a transaction receipt the classifier needs
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionReceipt {
    /// Transaction sender; absent on some explorer responses
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl TransactionReceipt {
    /// Swap direction for the transaction sender, `None` without a sender or a swap
    pub fn swap_direction(&self, token: &Address) -> Option<SwapDirection> {
        let sender = self.from.as_ref()?;
        decode_swap_log(&self.logs, token, sender)
    }
}

/// A `Transfer` log decoded into endpoints and raw amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogTransfer {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: u128,
}

/// Decode a `Transfer` log; `None` for other events or malformed topics
pub fn decode_transfer_log(log: &LogEntry) -> Result<Option<LogTransfer>, TrackerError> {
    if log.signature() != Some(EventSignature::Transfer) {
        return Ok(None);
    }
    // ERC-721 transfers index the token id, ERC-20 ones carry it in data
    if log.topics.len() < 3 {
        return Ok(None);
    }
    let from = Address::from_word(&log.topics[1])?;
    let to = Address::from_word(&log.topics[2])?;
    let amount = parse_hex_quantity(&log.data).ok_or_else(|| {
        TrackerError::MalformedRecord(format!("transfer amount is not a hex quantity: {}", log.data))
    })?;

    Ok(Some(LogTransfer {
        token: log.address,
        from,
        to,
        amount,
    }))
}

/// Determine a swap direction for `initiator` from a transaction's logs.
///
/// Requires a recognised swap event somewhere in the receipt plus at least one
/// `Transfer` of `token`. The first such transfer that touches the initiator
/// decides: sent by it is a SELL, received by it is a BUY. Router-mediated
/// multi-hop swaps can be misread because only that first transfer counts.
pub fn decode_swap_log(
    logs: &[LogEntry],
    token: &Address,
    initiator: &Address,
) -> Option<SwapDirection> {
    let mut swap_found = false;
    let mut token_transfers = Vec::new();

    for log in logs {
        match log.signature() {
            Some(signature) if signature.is_swap() => swap_found = true,
            Some(EventSignature::Transfer) if log.address == *token => match decode_transfer_log(log) {
                Ok(Some(transfer)) => token_transfers.push(transfer),
                Ok(None) => {}
                Err(e) => debug!("Skipping undecodable transfer log: {}", e),
            },
            _ => {}
        }
    }

    if !swap_found || token_transfers.is_empty() {
        return None;
    }

    token_transfers.iter().find_map(|transfer| {
        let tx_type = if transfer.from == *initiator {
            TxType::Sell
        } else if transfer.to == *initiator {
            TxType::Buy
        } else {
            return None;
        };
        Some(SwapDirection {
            wallet: *initiator,
            tx_type,
            amount: transfer.amount,
        })
    })
}
