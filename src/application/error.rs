use thiserror::Error;

use crate::domain::{Cents, LedgerError, TaxId};
use crate::storage::RegistryError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("customer not found")]
    CustomerNotFound(TaxId),

    /// The caller did not supply a usable tax id at all.
    #[error("customer not found")]
    MissingTaxId,

    #[error("Customer already exists!")]
    CustomerAlreadyExists(TaxId),

    #[error("Insufficient funds!")]
    InsufficientFunds {
        tax_id: TaxId,
        balance: Cents,
        required: Cents,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Cents),

    #[error("Amount out of range: {0}")]
    AmountOutOfRange(Cents),

    /// Request body missing, malformed, or of the wrong shape.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateTaxId(tax_id) => AppError::CustomerAlreadyExists(tax_id),
            RegistryError::NotFound(tax_id) => AppError::CustomerNotFound(tax_id),
        }
    }
}

impl AppError {
    /// Attach the customer's tax id to a ledger rule violation.
    pub fn from_ledger(tax_id: TaxId, err: LedgerError) -> Self {
        match err {
            LedgerError::NegativeAmount(amount) => AppError::InvalidAmount(amount),
            LedgerError::AmountOutOfRange(amount) => AppError::AmountOutOfRange(amount),
            LedgerError::InsufficientFunds { balance, requested } => AppError::InsufficientFunds {
                tax_id,
                balance,
                required: requested,
            },
        }
    }
}
