use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Operation;

pub type CustomerId = Uuid;

/// National taxpayer number (CPF) identifying a customer.
pub type TaxId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(rename = "cpf")]
    pub tax_id: TaxId,
    pub name: String,
    /// Append-only log of operations, in insertion order
    pub statement: Vec<Operation>,
}

impl Customer {
    pub fn new(tax_id: TaxId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tax_id,
            name: name.into(),
            statement: Vec::new(),
        }
    }

    /// Change the display name. Identity and statement are untouched.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}
