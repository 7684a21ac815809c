pub mod address;
pub mod dex_types;
pub mod error;

pub use address::*;
pub use dex_types::*;
pub use error::*;
