use anyhow::Result;
use serde::Deserialize;
use std::io::Read;
use tracing::debug;

use crate::application::{AppError, LedgerService};
use crate::domain::{parse_cents, Cents, TaxId};

/// One command of a replay file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayAction {
    Open,
    Rename,
    Close,
    Deposit,
    Withdraw,
}

#[derive(Debug, Deserialize)]
struct ReplayRow {
    tax_id: TaxId,
    action: ReplayAction,
    name: Option<String>,
    description: Option<String>,
    amount: Option<String>,
}

/// Result of a replay
#[derive(Debug, Clone, Default)]
pub struct ReplayResult {
    pub applied: usize,
    pub errors: Vec<ReplayError>,
}

/// A row that could not be applied
#[derive(Debug, Clone)]
pub struct ReplayError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for replay
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Parse and check every row without touching the ledger
    pub validate_only: bool,
}

/// Applies a CSV of account commands, in file order, to a ledger.
///
/// Expected header: `tax_id,action,name,description,amount`. Rows that fail are recorded
/// with their line number and skipped; later rows still apply.
pub struct Replayer<'a> {
    service: &'a LedgerService,
}

impl<'a> Replayer<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    pub fn replay_csv<R: Read>(&self, reader: R, options: &ReplayOptions) -> Result<ReplayResult> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut result = ReplayResult::default();

        for (line_num, row) in csv_reader.deserialize::<ReplayRow>().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let row = match row {
                Ok(r) => r,
                Err(e) => {
                    result.errors.push(ReplayError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let command = match Command::from_row(row) {
                Ok(c) => c,
                Err((field, error)) => {
                    result.errors.push(ReplayError {
                        line,
                        field: Some(field.to_string()),
                        error,
                    });
                    continue;
                }
            };

            if options.validate_only {
                result.applied += 1;
                continue;
            }

            match self.apply(command) {
                Ok(()) => result.applied += 1,
                Err(e) => {
                    debug!(line, error = %e, "replay row rejected");
                    result.errors.push(ReplayError {
                        line,
                        field: None,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(result)
    }

    fn apply(&self, command: Command) -> Result<(), AppError> {
        let service = self.service;
        match command {
            Command::Open { tax_id, name } => service.open(tax_id, name).map(|_| ()),
            Command::Rename { tax_id, name } => service.rename(&service.lookup(tax_id)?, name),
            Command::Close { tax_id } => service.close(&service.lookup(tax_id)?).map(|_| ()),
            Command::Deposit {
                tax_id,
                description,
                amount,
            } => service.deposit(&service.lookup(tax_id)?, description, amount),
            Command::Withdraw { tax_id, amount } => {
                service.withdraw(&service.lookup(tax_id)?, amount)
            }
        }
    }
}

/// A validated replay row
enum Command {
    Open { tax_id: TaxId, name: String },
    Rename { tax_id: TaxId, name: String },
    Close { tax_id: TaxId },
    Deposit { tax_id: TaxId, description: String, amount: Cents },
    Withdraw { tax_id: TaxId, amount: Cents },
}

type FieldError = (&'static str, String);

impl Command {
    fn from_row(row: ReplayRow) -> Result<Self, FieldError> {
        let tax_id = row.tax_id;
        Ok(match row.action {
            ReplayAction::Open => Command::Open {
                tax_id,
                name: required_text("name", row.name)?,
            },
            ReplayAction::Rename => Command::Rename {
                tax_id,
                name: required_text("name", row.name)?,
            },
            ReplayAction::Close => Command::Close { tax_id },
            ReplayAction::Deposit => Command::Deposit {
                tax_id,
                description: row.description.unwrap_or_default(),
                amount: required_amount(row.amount)?,
            },
            ReplayAction::Withdraw => Command::Withdraw {
                tax_id,
                amount: required_amount(row.amount)?,
            },
        })
    }
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, FieldError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err((field, format!("Missing {}", field))),
    }
}

fn required_amount(value: Option<String>) -> Result<Cents, FieldError> {
    let raw = required_text("amount", value)?;
    parse_cents(&raw).map_err(|e| ("amount", format!("Invalid amount: {}", e)))
}
