/// 20-byte EVM addresses and their 32-byte ABI word encoding
///
/// Addresses compare by their bytes, so two strings that differ only in hex
/// case are the same address. `Ord` follows the bytes as well, which matches
/// lexicographic order of the lower-cased `0x` form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::TrackerError;

pub const ADDRESS_BYTES: usize = 20;
pub const ADDRESS_HEX_LEN: usize = ADDRESS_BYTES * 2;
pub const WORD_HEX_LEN: usize = 64;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_BYTES]);

impl Address {
    pub const ZERO: Address = Address([0u8; ADDRESS_BYTES]);

    pub fn from_bytes(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_BYTES]
    }

    /// Left-pad to a 32-byte ABI word, 64 hex chars without prefix
    pub fn to_word(&self) -> String {
        format!("{:0>width$}", hex::encode(self.0), width = WORD_HEX_LEN)
    }

    /// Decode an ABI word (or topic) back to an address by keeping the last 40 hex chars
    pub fn from_word(word: &str) -> Result<Self, TrackerError> {
        let digits = word.strip_prefix("0x").unwrap_or(word);
        if digits.len() < ADDRESS_HEX_LEN || !digits.is_ascii() {
            return Err(TrackerError::MalformedRecord(format!(
                "word too short for an address: {}",
                word
            )));
        }
        decode_hex_address(&digits[digits.len() - ADDRESS_HEX_LEN..])
            .ok_or_else(|| TrackerError::MalformedRecord(format!("non-hex address word: {}", word)))
    }

    /// First 6 and last 4 hex characters, for log lines
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..8], &full[full.len() - 4..])
    }
}

fn decode_hex_address(digits: &str) -> Option<Address> {
    if digits.len() != ADDRESS_HEX_LEN {
        return None;
    }
    let mut bytes = [0u8; ADDRESS_BYTES];
    hex::decode_to_slice(digits, &mut bytes).ok()?;
    Some(Address(bytes))
}

impl FromStr for Address {
    type Err = TrackerError;

    /// Strict `0x` followed by exactly 40 hex digits, any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("0x")
            .and_then(decode_hex_address)
            .ok_or_else(|| TrackerError::InvalidAddressFormat(s.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
