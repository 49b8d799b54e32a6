use std::fs::File;
use std::io::{stdin, stdout, Read, Write};
use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::application::LedgerService;
use crate::domain::{format_cents, totals};
use crate::http::{serve, AppState};
use crate::io::{Exporter, ReplayOptions, Replayer};

/// finapi - in-memory customer account ledger
#[derive(Parser)]
#[command(name = "finapi")]
#[command(about = "Customer accounts with derived balances, served over HTTP")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "FINAPI_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "FINAPI_BIND", default_value = "0.0.0.0:3333")]
        bind: SocketAddr,
    },

    /// Apply a CSV of account commands to a fresh ledger and export the result
    Replay {
        /// Input CSV file (stdin if omitted)
        input: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// What to export after replaying
        #[arg(short, long, value_enum, default_value_t = ExportKind::Statements)]
        export: ExportKind,

        /// Only check that every row parses; nothing is applied or exported
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    /// One CSV row per operation
    Statements,
    /// One CSV row per customer
    Balances,
    /// Full registry as JSON
    Full,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_tracing(self.verbose, self.json_logs);

        match self.command {
            Commands::Serve { bind } => {
                let state = AppState::new(LedgerService::new());
                serve(bind, state).await?;
            }

            Commands::Replay {
                input,
                output,
                export,
                validate,
            } => {
                let service = LedgerService::new();
                run_replay_command(&service, input.as_deref(), output.as_deref(), export, validate)?;
            }
        }

        Ok(())
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing init failed: {}", e);
    }
}

fn run_replay_command(
    service: &LedgerService,
    input: Option<&str>,
    output: Option<&str>,
    export: ExportKind,
    validate: bool,
) -> Result<()> {
    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let options = ReplayOptions {
        validate_only: validate,
    };
    let result = Replayer::new(service).replay_csv(reader, &options)?;

    if validate {
        eprintln!("Validation complete");
    } else {
        eprintln!("Replay complete");
    }
    eprintln!("  Applied: {}", result.applied);
    eprintln!("  Errors:  {}", result.errors.len());

    if !result.errors.is_empty() {
        eprintln!("\nErrors:");
        for error in result.errors.iter().take(10) {
            eprintln!(
                "  Line {}: {}{}",
                error.line,
                error
                    .field
                    .as_ref()
                    .map(|f| format!("[{}] ", f))
                    .unwrap_or_default(),
                error.error
            );
        }
        if result.errors.len() > 10 {
            eprintln!("  ... and {} more", result.errors.len() - 10);
        }
    }

    if validate {
        return Ok(());
    }

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let exporter = Exporter::new(service);
    match export {
        ExportKind::Statements => {
            let count = exporter.export_statements_csv(writer)?;
            eprintln!("Exported {} operations", count);
        }
        ExportKind::Balances => {
            let count = exporter.export_balances_csv(writer)?;
            eprintln!("Exported {} balances", count);
        }
        ExportKind::Full => {
            let snapshot = exporter.export_full_json(writer)?;
            let (credits, debits) = snapshot
                .customers
                .iter()
                .map(|c| totals(&c.statement))
                .fold((0, 0), |(cr, db), (c, d)| (cr + c, db + d));
            eprintln!(
                "Exported {} customers: credits {}, debits {}, net {}",
                snapshot.customers.len(),
                format_cents(credits),
                format_cents(debits),
                format_cents(credits - debits)
            );
        }
    }

    Ok(())
}
