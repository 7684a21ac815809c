/// Error taxonomy shared by the decoder, parser, upstream clients and analyzer

use std::fmt;

use super::address::Address;

/// Accepted time expression grammar, shown whenever a range fails to parse
pub const ACCEPTED_FORMATS: &str = "Please use one of these formats:
- YYYY-MM-DD HH:MM:SS
- YYYY-MM-DD HH:MM
- YYYY-MM-DD
- MM-DD HH:MM
- HH:MM
- Relative time: 1d, 2h, 30m, 1w
- 'now' for current time
Ranges are written as '<time1> to <time2>' and separated with '/'";

#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    #[error("Upstream service {service} unavailable: {message}")]
    UpstreamUnavailable {
        service: &'static str,
        message: String,
    },

    #[error("Invalid contract address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Error parsing time range: {expression}\n{}", ACCEPTED_FORMATS)]
    UnparseableTimeExpression { expression: String },

    #[error("Could not find a liquidity pool for token {token}")]
    NoPoolResolved { token: Address },

    #[error("No results: {0}")]
    EmptyResult(EmptyReason),

    #[error("Malformed upstream record: {0}")]
    MalformedRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TrackerError {
    pub fn upstream(service: &'static str, message: impl fmt::Display) -> Self {
        TrackerError::UpstreamUnavailable {
            service,
            message: message.to_string(),
        }
    }

    /// Transport and lookup failures degrade instead of aborting an analysis
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrackerError::UpstreamUnavailable { .. } | TrackerError::NoPoolResolved { .. }
        )
    }
}

/// Why a well-formed request produced nothing to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The explorer returned no transfers for the token at all
    NoTransfers,
    /// Transfers were fetched but none fell inside any requested range
    NoTransactionsInRanges,
    NoRanges,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::NoTransfers => write!(f, "no transactions found for this token"),
            EmptyReason::NoTransactionsInRanges => {
                write!(f, "no transactions found in the specified time ranges")
            }
            EmptyReason::NoRanges => write!(f, "no time ranges were given"),
        }
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_expression_error_lists_formats() {
        let err = TrackerError::UnparseableTimeExpression {
            expression: "yesterday-ish".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("yesterday-ish"));
        assert!(message.contains("YYYY-MM-DD HH:MM:SS"));
        assert!(message.contains("1d, 2h, 30m, 1w"));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(TrackerError::upstream("etherscan", "timeout").is_recoverable());
        assert!(!TrackerError::InvalidAddressFormat("0x123".into()).is_recoverable());
        assert!(!TrackerError::EmptyResult(EmptyReason::NoTransfers).is_recoverable());
    }
}
