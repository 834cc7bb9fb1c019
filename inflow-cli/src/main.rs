//! Inflow CLI - bank statement import in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{history, import, init, logs, new, status, transactions};

/// Inflow - statement import and reconciliation in your terminal
#[derive(Parser)]
#[command(name = "inflow", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the inflow directory and database
    Init {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import a statement file (CSV, OFX or PDF)
    Import {
        /// Path to the statement file
        file: PathBuf,
        /// Skip prompts and accept the default selection
        #[arg(long, short)]
        yes: bool,
        /// Show what would be imported without committing
        #[arg(long)]
        preview: bool,
        /// Flip signs on single-amount columns (credit card statements)
        #[arg(long)]
        flip_signs: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a manual transaction in the ledger
    New {
        /// What the money was for
        description: String,
        /// Amount, e.g. 230.50 (negative for an expense)
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Category to assign
        #[arg(short, long)]
        category: Option<String>,
        /// Transaction date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
        /// Record as income (expense by default)
        #[arg(long)]
        income: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List ledger transactions
    Transactions {
        /// Show at most this many rows
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Only rows from this import batch
        #[arg(long)]
        batch: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show past imports
    History {
        /// Show at most this many imports
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show ledger status and summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { json } => init::run(json).await,
        Commands::Import {
            file,
            yes,
            preview,
            flip_signs,
            json,
        } => import::run(file, yes, preview, flip_signs, json).await,
        Commands::New {
            description,
            amount,
            category,
            date,
            income,
            json,
        } => new::run(description, amount, category, date, income, json).await,
        Commands::Transactions { limit, batch, json } => {
            transactions::run(limit, batch, json).await
        }
        Commands::History { limit, json } => history::run(limit, json).await,
        Commands::Status { json } => status::run(json).await,
        Commands::Logs { command } => logs::run(command),
    }
}
