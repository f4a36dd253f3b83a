//! FinBot CLI - Financial assistant chatbot
//!
//! Usage:
//!   finbot init                  Initialize database
//!   finbot import --dir data/    Import the bank CSV exports
//!   finbot chat                  Interactive chat
//!   finbot ask "What's my balance?"
//!   finbot serve --port 3000     Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Import { dir } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, &dir)
        }
        Commands::Seed => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_seed(&db)
        }
        Commands::Status => commands::cmd_status(&cli.db, cli.no_encrypt).await,
        Commands::Chat { customer } => {
            let assistant = commands::open_assistant(&cli.db, cli.no_encrypt)?;
            commands::cmd_chat(&assistant, customer).await
        }
        Commands::Ask { message, customer } => {
            let assistant = commands::open_assistant(&cli.db, cli.no_encrypt)?;
            commands::cmd_ask(&assistant, customer, &message).await
        }
        Commands::Accounts { customer } => {
            let assistant = commands::open_assistant(&cli.db, cli.no_encrypt)?;
            commands::cmd_accounts(&assistant, customer)
        }
        Commands::Transactions { limit, customer } => {
            let assistant = commands::open_assistant(&cli.db, cli.no_encrypt)?;
            commands::cmd_transactions(&assistant, customer, limit)
        }
        Commands::Forecast { months, customer } => {
            let assistant = commands::open_assistant(&cli.db, cli.no_encrypt)?;
            commands::cmd_forecast(&assistant, customer, months).await
        }
        Commands::Anomalies { customer } => {
            let assistant = commands::open_assistant(&cli.db, cli.no_encrypt)?;
            commands::cmd_anomalies(&assistant, customer)
        }
        Commands::Health { customer } => {
            let assistant = commands::open_assistant(&cli.db, cli.no_encrypt)?;
            commands::cmd_health(&assistant, customer)
        }
        Commands::Serve { port, host } => {
            commands::cmd_serve(&cli.db, &host, port, cli.no_encrypt).await
        }
    }
}
