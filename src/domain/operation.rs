use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Money entering the account (deposit)
    Credit,
    /// Money leaving the account (withdrawal)
    Debit,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Credit => "credit",
            OperationKind::Debit => "debit",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in a customer's statement.
/// Operations are immutable once appended; the statement is the source of truth for the balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: OperationKind,
    /// Amount in cents (never negative)
    pub amount: Cents,
    /// Free text; deposits carry one, withdrawals do not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set by the ledger when the operation is appended
    pub created_at: DateTime<Utc>,
}

impl Operation {
    pub fn credit(amount: Cents, description: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            kind: OperationKind::Credit,
            amount,
            description: Some(description.into()),
            created_at,
        }
    }

    pub fn debit(amount: Cents, created_at: DateTime<Utc>) -> Self {
        Self {
            kind: OperationKind::Debit,
            amount,
            description: None,
            created_at,
        }
    }

    /// Effect of this operation on the balance: positive for credits, negative for debits.
    pub fn signed_amount(&self) -> Cents {
        match self.kind {
            OperationKind::Credit => self.amount,
            OperationKind::Debit => -self.amount,
        }
    }
}
