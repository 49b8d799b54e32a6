// Application layer - use cases exposed to every front end (HTTP, CLI replay).
// Front ends never touch the registry or the ledger functions directly.

pub mod error;
mod service;

pub use error::*;
pub use service::*;
