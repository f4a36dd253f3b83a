//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// FinBot - Financial assistant chatbot over a banking database
#[derive(Parser)]
#[command(name = "finbot")]
#[command(about = "Financial assistant chatbot for balances, spending and forecasts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "finbot.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set FINBOT_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import customers.csv, accounts.csv and transactions.csv from a directory
    Import {
        /// Directory containing the CSV files
        #[arg(short, long)]
        dir: PathBuf,
    },

    /// Insert a demo customer with a year of transactions
    Seed,

    /// Show database and LLM status
    Status,

    /// Interactive chat (type "exit" to quit)
    Chat {
        /// Customer id (defaults to the first customer)
        #[arg(short, long)]
        customer: Option<i64>,
    },

    /// Ask a single question
    Ask {
        /// The question
        message: String,

        /// Customer id (defaults to the first customer)
        #[arg(short, long)]
        customer: Option<i64>,
    },

    /// List a customer's active accounts
    Accounts {
        #[arg(short, long)]
        customer: Option<i64>,
    },

    /// List a customer's recent transactions
    Transactions {
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        #[arg(short, long)]
        customer: Option<i64>,
    },

    /// Forecast monthly spending
    Forecast {
        /// Months to forecast
        #[arg(short, long, default_value = "3")]
        months: usize,

        #[arg(short, long)]
        customer: Option<i64>,
    },

    /// Show unusual transactions and fraud alerts
    Anomalies {
        #[arg(short, long)]
        customer: Option<i64>,
    },

    /// Show the financial health score
    Health {
        #[arg(short, long)]
        customer: Option<i64>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on (default: $PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}
