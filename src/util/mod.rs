/// Presentation and process-level helpers

pub mod dexscreener;
pub mod display;
pub mod logging;

pub use dexscreener::DexScreenerClient;
pub use logging::init_tracing;
