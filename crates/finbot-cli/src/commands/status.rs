//! Status command implementation

use std::path::Path;

use anyhow::Result;
use finbot_core::db::Database;
use finbot_core::{AIBackend, FinancialAssistant};

use super::{build_assistant, open_db};

pub async fn cmd_status(db_path: &Path, no_encrypt: bool) -> Result<()> {
    use finbot_core::db::DB_KEY_ENV;
    use std::fs;

    println!();
    println!("📊 FinBot Status");
    println!("   ─────────────────────────────────────────────────────────────");

    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    let has_key = std::env::var(DB_KEY_ENV).is_ok();
    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else if has_key {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ❌ Encryption: REQUIRED but {} not set", DB_KEY_ENV);
    }

    if db_path.exists() {
        match open_db(db_path, no_encrypt) {
            Ok(db) => {
                println!("   At rest: {}", at_rest_state(&db));
                if let Ok(stats) = db.dashboard_stats() {
                    println!();
                    println!("   Customers: {}", stats.customers);
                    println!("   Accounts: {}", stats.accounts);
                    println!("   Transactions: {}", stats.transactions);
                }
                print_llm_status(&build_assistant(db)?).await;
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {}", e);
                if !no_encrypt && !has_key {
                    println!("      Set {} or use --no-encrypt", DB_KEY_ENV);
                } else if has_key {
                    println!("      (Check if {} is correct)", DB_KEY_ENV);
                }
            }
        }
    }

    println!();
    Ok(())
}

/// Encryption as reported by SQLCipher on the opened database
pub fn at_rest_state(db: &Database) -> &'static str {
    match db.is_encrypted() {
        Ok(true) => "encrypted (SQLCipher)",
        Ok(false) => "plaintext",
        Err(_) => "unknown",
    }
}

async fn print_llm_status(assistant: &FinancialAssistant) {
    println!();
    match assistant.ai() {
        Some(client) if client.health_check().await => {
            println!("   🤖 LLM: {} at {} (connected)", client.model(), client.host());
        }
        Some(client) => {
            println!(
                "   ⚠️  LLM: {} at {} (not responding, using local answers)",
                client.model(),
                client.host()
            );
        }
        None => {
            println!("   💡 LLM: disabled (set GEMINI_API_KEY to enable AI answers)");
        }
    }
}
