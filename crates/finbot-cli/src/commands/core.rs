//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` / `open_assistant` - Shared utilities to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_import` - Load the bank CSV exports
//! - `cmd_seed` - Insert demo data

use std::path::Path;

use anyhow::{Context, Result};
use finbot_core::{
    db::Database, import_directory, seed_demo_data, AIClient, AssistantConfig, FinancialAssistant,
    ImportStats,
};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Build the assistant with the loaded config and the LLM backend from the environment
pub fn build_assistant(db: Database) -> Result<FinancialAssistant> {
    let config = AssistantConfig::load().context("Failed to load config")?;
    let ai = AIClient::from_env_with(&config.llm);
    let assistant = FinancialAssistant::new(db, config).context("Failed to build assistant")?;
    Ok(assistant.with_ai(ai))
}

pub fn open_assistant(db_path: &Path, no_encrypt: bool) -> Result<FinancialAssistant> {
    build_assistant(open_db(db_path, no_encrypt)?)
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import bank data: finbot import --dir data/");
    println!("     (or load a demo customer: finbot seed)");
    println!("  2. Ask a question: finbot ask \"What's my balance?\"");
    println!("  3. Start the API: finbot serve");

    Ok(())
}

pub fn cmd_import(db: &Database, dir: &Path) -> Result<()> {
    println!("📥 Importing CSV files from {}...", dir.display());

    let stats = import_directory(db, dir)
        .with_context(|| format!("Failed to import from {}", dir.display()))?;
    print_import_stats(&stats);

    println!("✅ Import complete");
    Ok(())
}

pub fn cmd_seed(db: &Database) -> Result<()> {
    println!("🌱 Seeding demo customer...");

    let stats = seed_demo_data(db).context("Failed to seed demo data")?;
    print_import_stats(&stats);

    println!("✅ Demo data ready. Try: finbot ask \"What's my balance?\"");
    Ok(())
}

fn print_import_stats(stats: &ImportStats) {
    println!("   Customers: {}", stats.customers);
    println!("   Accounts: {}", stats.accounts);
    println!("   Transactions: {}", stats.transactions);
    if stats.skipped > 0 {
        println!("   ⚠️  Skipped rows: {}", stats.skipped);
    }
}
