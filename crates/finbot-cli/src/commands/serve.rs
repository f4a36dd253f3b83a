//! Server command implementation

use std::path::Path;

use anyhow::Result;

use super::open_assistant;

/// Port used when neither --port nor $PORT is set
pub const DEFAULT_PORT: u16 = 3000;

/// Pick the listen port: explicit flag, then the PORT variable, then the default
pub fn resolve_port(flag: Option<u16>, env_port: Option<&str>) -> u16 {
    flag.or_else(|| env_port.and_then(|p| p.trim().parse().ok()))
        .unwrap_or(DEFAULT_PORT)
}

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: Option<u16>,
    no_encrypt: bool,
) -> Result<()> {
    let port = resolve_port(port, std::env::var("PORT").ok().as_deref());

    println!("🚀 Starting FinBot web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    println!("   Endpoints: GET /, GET /health, POST /chat");
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   ⚠️  No authentication - do not expose to an untrusted network");
    println!("   Press Ctrl+C to stop");

    let assistant = open_assistant(db_path, no_encrypt)?;

    let origins: Vec<String> = std::env::var("FINBOT_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !origins.is_empty() {
        println!("   🌐 CORS origins: {} (FINBOT_ALLOWED_ORIGINS)", origins.join(", "));
    }

    let config = finbot_server::ServerConfig {
        allowed_origins: origins,
    };
    finbot_server::serve_with_config(assistant, host, port, config).await?;

    Ok(())
}
