//! Expense command implementations

use std::path::Path;

use anyhow::{Context, Result};
use spendcast_core::db::Database;
use spendcast_core::import::{generate_hash, parse_date, parse_expenses_csv};
use spendcast_core::models::{NewExpense, PaymentMode, UserId};
use tracing::debug;

use super::truncate;

fn parse_user(raw: &str) -> Result<UserId> {
    raw.parse()
        .with_context(|| format!("Invalid user id '{}'", raw))
}

pub fn cmd_add(
    db: &Database,
    user: &str,
    amount: f64,
    date: Option<&str>,
    title: Option<String>,
    category: Option<String>,
) -> Result<()> {
    let user_id = parse_user(user)?;
    if !amount.is_finite() {
        anyhow::bail!("Amount must be a finite number");
    }

    let date = match date {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().naive_local(),
    };
    let import_hash = generate_hash(&user_id, &date, title.as_deref().unwrap_or(""), amount);

    let expense = NewExpense {
        user_id,
        title,
        amount,
        category,
        date,
        payment_mode: PaymentMode::default(),
        description: None,
        import_hash,
    };

    match db.insert_expense(&expense)? {
        Some(id) => println!("✅ Recorded expense #{} ({:.2} on {})", id, amount, date.date()),
        None => println!("⚠️  An identical expense already exists, nothing added"),
    }

    Ok(())
}

pub fn cmd_import(db: &Database, file: &Path) -> Result<()> {
    println!("📥 Importing expenses from {}...", file.display());

    let reader = std::fs::File::open(file)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let expenses = parse_expenses_csv(reader).context("Failed to parse CSV")?;

    let mut imported = 0;
    let mut skipped = 0;
    for expense in &expenses {
        match db.insert_expense(expense)? {
            Some(_) => imported += 1,
            None => skipped += 1,
        }
    }
    debug!(imported, skipped, "Import finished");

    println!("   Found {} expenses", expenses.len());
    println!("   ✅ Imported: {}", imported);
    if skipped > 0 {
        println!("   ⏭️  Skipped (duplicates): {}", skipped);
    }

    Ok(())
}

pub fn cmd_users(db: &Database) -> Result<()> {
    let users = db.list_users()?;

    if users.is_empty() {
        println!("No expenses found. Import some with:");
        println!("  spendcast import --file expenses.csv");
        return Ok(());
    }

    println!();
    println!("👥 Users");
    println!("   ─────────────────────────────────────");

    for (user_id, count) in users {
        println!("   {} │ {:>5} expenses", user_id, count);
    }

    Ok(())
}

pub fn cmd_expenses(db: &Database, user: &str, limit: i64) -> Result<()> {
    let user_id = parse_user(user)?;
    let expenses = db.list_expenses(&user_id, limit)?;

    if expenses.is_empty() {
        println!("No expenses found for {}.", user_id);
        return Ok(());
    }

    let total = db.count_expenses(&user_id)?;

    println!();
    println!("📝 Recent Expenses ({} of {})", expenses.len(), total);
    println!("   ─────────────────────────────────────────────────────────────");

    for expense in expenses {
        println!(
            "   {} │ {:>10.2} │ {:<12} │ {}",
            expense.date.format("%Y-%m-%d"),
            expense.amount,
            truncate(expense.category.as_deref().unwrap_or("-"), 12),
            truncate(expense.title.as_deref().unwrap_or(""), 30)
        );
    }

    Ok(())
}

pub fn cmd_purge(db: &Database, user: &str) -> Result<()> {
    let user_id = parse_user(user)?;
    let removed = db.delete_expenses_for_user(&user_id)?;
    println!("🗑️  Deleted {} expenses for {}", removed, user_id);
    Ok(())
}
