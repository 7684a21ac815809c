// Analysis core
pub mod algo;
pub mod core;

// Configuration
pub mod config;

// Upstream explorer access and log decoding
pub mod ingest;

// Orchestration of a full analysis pass
pub mod intelligence;

// Price feed, terminal output and logging
pub mod util;

// Re-export commonly used types for convenience
pub use self::core::*;
pub use intelligence::{AnalysisReport, WalletAnalyzer};
