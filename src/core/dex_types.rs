use std::fmt;

use serde::{Deserialize, Serialize};

use super::address::Address;

/// Semantic direction of a token transfer relative to the liquidity pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxType {
    Buy,      // pool -> wallet
    Sell,     // wallet -> pool
    Transfer, // no pool known, direction unknown
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TxType::Buy => "BUY",
            TxType::Sell => "SELL",
            TxType::Transfer => "TRANSFER",
        };
        f.pad(label)
    }
}

/// One ERC-20 transfer as reported by the explorer, validated and immutable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub hash: String,
    pub block_number: u64,
    pub from: Address,
    pub to: Address,
    /// Raw on-chain amount, not scaled by decimals
    pub amount: u128,
    /// Unix seconds
    pub timestamp: i64,
    pub token_decimals: u8,
}

impl TransferEvent {
    pub fn scaled_amount(&self) -> f64 {
        utils::scale_amount(self.amount, self.token_decimals)
    }
}

/// Validated transfers plus a count of upstream records that failed validation
#[derive(Debug, Clone, Default)]
pub struct TransferBatch {
    pub transfers: Vec<TransferEvent>,
    pub rejected: usize,
}

/// Transfer labelled with a direction and the wallet it is attributed to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedTransaction {
    pub wallet: Address,
    pub tx_type: TxType,
    pub timestamp: i64,
    /// Amount scaled by the transfer's own decimals
    pub amount: f64,
    pub hash: String,
}

/// Direction recovered from a transaction receipt, attributed to the transaction sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapDirection {
    pub wallet: Address,
    pub tx_type: TxType,
    /// Raw amount of the deciding token transfer
    pub amount: u128,
}

/// Closed interval of Unix timestamps, always `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    /// Out-of-order bounds are swapped
    pub fn new(a: i64, b: i64) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// Price snapshot for a token/pair from the DEX price feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairInfo {
    pub pair_address: String,
    pub base_token_symbol: String,
    pub dex_id: String,
    pub price_usd: Option<f64>,
    pub volume_24h: Option<f64>,
}

/// Block selector for balance-at-block queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Number(u64),
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Latest => write!(f, "latest"),
            BlockTag::Number(n) => write!(f, "{:#x}", n),
        }
    }
}

/// Well-known Ethereum mainnet contracts and ABI constants
pub mod constants {
    /// Uniswap V2 factory
    pub const UNISWAP_V2_FACTORY: &str = "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f";
    pub const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

    /// `getPair(address,address)` selector
    pub const GET_PAIR_SELECTOR: &str = "0xe6a43905";

    pub const MAINNET_CHAIN_ID: u64 = 1;
    pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;
    pub const DEFAULT_MIN_RANGES: usize = 2;
}

pub mod utils {
    /// Raw token amount to a human amount using the given decimals
    pub fn scale_amount(raw_amount: u128, decimals: u8) -> f64 {
        raw_amount as f64 / 10_f64.powi(decimals as i32)
    }

    /// Parse a `0x`-prefixed hex quantity as returned by JSON-RPC
    pub fn parse_hex_quantity(value: &str) -> Option<u128> {
        let digits = value.strip_prefix("0x").unwrap_or(value);
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Some(0);
        }
        u128::from_str_radix(digits, 16).ok()
    }
}
