use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::domain::{
    self, compute_balance, statement_by_date, Cents, Customer, CustomerId, Operation, TaxId,
};
use crate::storage::{CustomerHandle, CustomerRegistry};

use super::AppError;

/// Application service providing the account operations.
/// This is the only interface front ends (HTTP, replay) use.
#[derive(Default)]
pub struct LedgerService {
    registry: CustomerRegistry,
}

impl LedgerService {
    /// Create a service with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================
    // Account operations
    // ========================

    /// Open a new account for `tax_id`.
    pub fn open(&self, tax_id: TaxId, name: String) -> Result<CustomerId, AppError> {
        let id = self.registry.open(tax_id, name)?;
        info!(tax_id, %id, "account opened");
        Ok(id)
    }

    /// Resolve a tax id. Every other operation starts from the handle returned here.
    pub fn lookup(&self, tax_id: TaxId) -> Result<CustomerHandle, AppError> {
        Ok(self.registry.lookup(tax_id)?)
    }

    /// Snapshot of the full customer record, statement included.
    pub fn account(&self, customer: &CustomerHandle) -> Result<Customer, AppError> {
        Ok(self.registry.with_customer(customer, |c| c.clone())?)
    }

    /// Change the customer's display name.
    pub fn rename(&self, customer: &CustomerHandle, name: String) -> Result<(), AppError> {
        self.registry.with_customer(customer, |c| c.rename(name))?;
        info!(tax_id = customer.tax_id(), "account renamed");
        Ok(())
    }

    /// Close the account and discard its statement.
    /// Returns every customer still registered.
    pub fn close(&self, customer: &CustomerHandle) -> Result<Vec<Customer>, AppError> {
        let remaining = self.registry.close(customer)?;
        info!(
            tax_id = customer.tax_id(),
            remaining = remaining.len(),
            "account closed"
        );
        Ok(remaining)
    }

    /// List all open accounts in opening order.
    pub fn customers(&self) -> Vec<Customer> {
        self.registry.snapshot()
    }

    /// Number of open accounts.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // ========================
    // Ledger operations
    // ========================

    /// Full statement, in insertion order.
    pub fn statement(&self, customer: &CustomerHandle) -> Result<Vec<Operation>, AppError> {
        Ok(self
            .registry
            .with_customer(customer, |c| c.statement.clone())?)
    }

    /// Operations created on `date` (server local time).
    pub fn statement_by_date(
        &self,
        customer: &CustomerHandle,
        date: NaiveDate,
    ) -> Result<Vec<Operation>, AppError> {
        Ok(self
            .registry
            .with_customer(customer, |c| statement_by_date(&c.statement, date))?)
    }

    /// Record a credit.
    pub fn deposit(
        &self,
        customer: &CustomerHandle,
        description: String,
        amount: Cents,
    ) -> Result<(), AppError> {
        let tax_id = customer.tax_id();
        self.registry
            .with_customer(customer, |c| {
                domain::deposit(c, description, amount, Utc::now())
            })?
            .map_err(|e| AppError::from_ledger(tax_id, e))?;

        debug!(tax_id, amount, "deposit recorded");
        Ok(())
    }

    /// Record a debit if the balance covers it.
    /// The balance check and the append happen under the customer's lock.
    pub fn withdraw(&self, customer: &CustomerHandle, amount: Cents) -> Result<(), AppError> {
        let tax_id = customer.tax_id();
        let result = self
            .registry
            .with_customer(customer, |c| domain::withdraw(c, amount, Utc::now()))?;

        match result {
            Ok(()) => {
                debug!(tax_id, amount, "withdrawal recorded");
                Ok(())
            }
            Err(e) => {
                warn!(tax_id, amount, error = %e, "withdrawal rejected");
                Err(AppError::from_ledger(tax_id, e))
            }
        }
    }

    /// Balance derived from the statement.
    pub fn balance(&self, customer: &CustomerHandle) -> Result<Cents, AppError> {
        Ok(self
            .registry
            .with_customer(customer, |c| compute_balance(&c.statement))?)
    }
}
