//! Spendcast CLI - Expense store and spending forecaster
//!
//! Usage:
//!   spendcast init                    Initialize database
//!   spendcast import --file CSV       Import expenses
//!   spendcast forecast <user_id>      Forecast the next 30 days
//!   spendcast serve --port 5001       Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
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
        Commands::Add {
            user,
            amount,
            date,
            title,
            category,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_add(&db, &user, amount, date.as_deref(), title, category)
        }
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, &file)
        }
        Commands::Users => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_users(&db)
        }
        Commands::Expenses { user_id, limit } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_expenses(&db, &user_id, limit)
        }
        Commands::Purge { user_id } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_purge(&db, &user_id)
        }
        Commands::Forecast { user_id, json } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_forecast(&db, &user_id, json)
        }
        Commands::Serve { port, host } => {
            commands::cmd_serve(&cli.db, &host, port, cli.no_encrypt).await
        }
    }
}
