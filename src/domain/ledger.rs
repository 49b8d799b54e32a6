use chrono::{DateTime, Local, NaiveDate, Utc};
use thiserror::Error;

use super::{Cents, Customer, Operation, OperationKind};

/// Compute the balance of a statement.
/// Balance = sum of credits - sum of debits
///
/// `deposit` keeps the credit total within `Cents`, and debits never exceed credits,
/// so the saturating arithmetic here never actually saturates for a ledger-built statement.
pub fn compute_balance(statement: &[Operation]) -> Cents {
    statement
        .iter()
        .fold(0, |balance: Cents, operation| {
            balance.saturating_add(operation.signed_amount())
        })
}

/// Sum credits and debits separately: `(credits, debits)`.
pub fn totals(statement: &[Operation]) -> (Cents, Cents) {
    statement.iter().fold(
        (0, 0),
        |(credits, debits): (Cents, Cents), operation| match operation.kind {
            OperationKind::Credit => (credits.saturating_add(operation.amount), debits),
            OperationKind::Debit => (credits, debits.saturating_add(operation.amount)),
        },
    )
}

/// Operations created on `date`, judged by the calendar day in the server's local time zone.
pub fn statement_by_date(statement: &[Operation], date: NaiveDate) -> Vec<Operation> {
    statement
        .iter()
        .filter(|operation| operation.created_at.with_timezone(&Local).date_naive() == date)
        .cloned()
        .collect()
}

/// Append a credit to the customer's statement.
pub fn deposit(
    customer: &mut Customer,
    description: impl Into<String>,
    amount: Cents,
    now: DateTime<Utc>,
) -> Result<(), LedgerError> {
    ensure_non_negative(amount)?;
    let (credits, _) = totals(&customer.statement);
    if credits.checked_add(amount).is_none() {
        return Err(LedgerError::AmountOutOfRange(amount));
    }

    let created_at = next_timestamp(&customer.statement, now);
    customer
        .statement
        .push(Operation::credit(amount, description, created_at));
    Ok(())
}

/// Append a debit if the current balance covers it.
/// Callers must hold the customer exclusively across the whole call.
pub fn withdraw(customer: &mut Customer, amount: Cents, now: DateTime<Utc>) -> Result<(), LedgerError> {
    ensure_non_negative(amount)?;
    let balance = compute_balance(&customer.statement);
    if balance < amount {
        return Err(LedgerError::InsufficientFunds {
            balance,
            requested: amount,
        });
    }

    let created_at = next_timestamp(&customer.statement, now);
    customer.statement.push(Operation::debit(amount, created_at));
    Ok(())
}

fn ensure_non_negative(amount: Cents) -> Result<(), LedgerError> {
    if amount < 0 {
        return Err(LedgerError::NegativeAmount(amount));
    }
    Ok(())
}

// Keeps created_at non-decreasing even if the wall clock steps backwards.
fn next_timestamp(statement: &[Operation], now: DateTime<Utc>) -> DateTime<Utc> {
    match statement.last() {
        Some(last) if last.created_at > now => last.created_at,
        _ => now,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("amount must not be negative: {0} cents")]
    NegativeAmount(Cents),

    #[error("amount would overflow the account total: {0} cents")]
    AmountOutOfRange(Cents),

    #[error("insufficient funds: balance {balance} cents, requested {requested} cents")]
    InsufficientFunds { balance: Cents, requested: Cents },
}
