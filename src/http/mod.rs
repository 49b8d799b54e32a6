//! REST front end: JSON over HTTP, customers identified by the `cpf` header.

mod error;
mod extract;
mod routes;

pub use extract::{CurrentCustomer, JsonBody, TAX_ID_HEADER};
pub use routes::{router, serve, AppState};
