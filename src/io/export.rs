use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{compute_balance, format_cents, Customer};

/// Registry snapshot for full JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub customers: Vec<Customer>,
}

/// Exporter for writing ledger data to CSV or JSON
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export every operation of every customer, one row per operation.
    /// Returns the number of operations written.
    pub fn export_statements_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let customers = self.service.customers();
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["cpf", "name", "type", "amount", "description", "created_at"])?;

        let mut count = 0;
        for customer in &customers {
            for operation in &customer.statement {
                csv_writer.write_record([
                    customer.tax_id.to_string(),
                    customer.name.clone(),
                    operation.kind.to_string(),
                    format_cents(operation.amount),
                    operation.description.clone().unwrap_or_default(),
                    operation.created_at.to_rfc3339(),
                ])?;
                count += 1;
            }
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export one balance row per customer.
    pub fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let customers = self.service.customers();
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["cpf", "name", "operations", "balance"])?;

        for customer in &customers {
            csv_writer.write_record([
                customer.tax_id.to_string(),
                customer.name.clone(),
                customer.statement.len().to_string(),
                format_cents(compute_balance(&customer.statement)),
            ])?;
        }

        csv_writer.flush()?;
        Ok(customers.len())
    }

    /// Export the whole registry as pretty-printed JSON.
    pub fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            customers: self.service.customers(),
        };

        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(snapshot)
    }
}
