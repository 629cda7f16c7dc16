//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::open_db;

/// Parse a comma-separated origin list
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    println!("🚀 Starting Spendcast forecast server...");
    println!(
        "   Database: {} ({})",
        db.path(),
        if db.is_encrypted() {
            "encrypted"
        } else {
            "unencrypted"
        }
    );
    println!("   Listening: http://{}:{}", host, port);
    println!("   Endpoint: GET /predict/<user_id>");

    // Parse allowed CORS origins from environment (comma-separated)
    let allowed_origins =
        parse_origins(&std::env::var("SPENDCAST_ALLOWED_ORIGINS").unwrap_or_default());
    if allowed_origins.is_empty() {
        println!("   🌐 CORS: any origin");
    } else {
        println!("   🌐 CORS: {}", allowed_origins.join(", "));
    }
    println!();

    let config = spendcast_server::ServerConfig { allowed_origins };

    spendcast_server::serve_with_config(db, host, port, config)
        .await
        .context("Server error")
}
