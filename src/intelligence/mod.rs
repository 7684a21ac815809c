/// Wallet intelligence: which wallets keep showing up across the chosen time windows
///
/// Key Components:
/// - `wallet_analyzer`: one fetch / resolve / classify / correlate pass over a token

pub mod wallet_analyzer;

pub use wallet_analyzer::{AnalysisReport, WalletAnalyzer};
