/// Pure analysis core: time range parsing, classification and correlation

pub mod classifier;
pub mod correlator;
pub mod time_expr;

pub use classifier::{classify, classify_all, classify_with_swap};
pub use correlator::{correlate, CorrelationReport, RangeDiagnostic, WalletActivity};
pub use time_expr::{parse_time_ranges, TimeExpressionParser};
