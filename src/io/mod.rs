//! Batch replay of account commands and export of the resulting ledger.

pub mod export;
pub mod import;

pub use export::*;
pub use import::*;
