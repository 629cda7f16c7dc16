//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Spendcast - Forecast the next 30 days of spending
#[derive(Parser)]
#[command(name = "spendcast")]
#[command(about = "Self-hosted expense store and spending forecaster", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "spendcast.db", env = "SPENDCAST_DB", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SPENDCAST_DB_KEY environment variable with your passphrase.
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

    /// Record a single expense
    Add {
        /// User id (24 hex characters)
        #[arg(short, long)]
        user: String,

        /// Amount spent
        #[arg(short, long)]
        amount: f64,

        /// Date of the expense (YYYY-MM-DD, defaults to now)
        #[arg(short, long)]
        date: Option<String>,

        /// Short title, e.g. "Groceries"
        #[arg(short, long)]
        title: Option<String>,

        /// Category, e.g. "Food"
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Import expenses from CSV (columns: user, amount, date, ...)
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List users with their expense counts
    Users,

    /// Show a user's most recent expenses
    Expenses {
        /// User id (24 hex characters)
        user_id: String,

        /// Number of expenses to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Delete every expense for a user
    Purge {
        /// User id (24 hex characters)
        user_id: String,
    },

    /// Forecast the next 30 days of spending for a user
    Forecast {
        /// User id (24 hex characters)
        user_id: String,

        /// Print the response as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5001")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
}
