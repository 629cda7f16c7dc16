//! Expense operations

use rusqlite::{params, Row};
use tracing::debug;

use super::{parse_datetime, parse_expense_date, Database, DATETIME_FORMAT};
use crate::error::{Error, Result};
use crate::models::{Expense, ExpenseRecord, NewExpense, UserId};
use crate::repository::ExpenseRepository;

fn parse_user_id(s: &str) -> Result<UserId> {
    s.parse()
        .map_err(|e| Error::InvalidData(format!("Malformed user id in storage '{}': {}", s, e)))
}

impl Database {
    /// Insert an expense (skips duplicates based on import_hash)
    pub fn insert_expense(&self, expense: &NewExpense) -> Result<Option<i64>> {
        let conn = self.conn()?;

        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO expenses (user_id, title, amount, category, date, payment_mode, description, import_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                expense.user_id.to_hex(),
                expense.title,
                expense.amount,
                expense.category,
                expense.date.format(DATETIME_FORMAT).to_string(),
                expense.payment_mode.as_str(),
                expense.description,
                expense.import_hash,
            ],
        )?;

        if inserted == 0 {
            debug!(hash = %expense.import_hash, "Skipped duplicate expense");
            return Ok(None);
        }

        Ok(Some(conn.last_insert_rowid()))
    }

    /// List a user's expenses, newest first
    pub fn list_expenses(&self, user: &UserId, limit: i64) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, title, amount, category, date, payment_mode, description, created_at
            FROM expenses
            WHERE user_id = ?
            ORDER BY date DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![user.to_hex(), limit], Self::row_to_raw_expense)?;

        let mut expenses = Vec::new();
        for row in rows {
            expenses.push(row?.into_expense()?);
        }
        Ok(expenses)
    }

    /// Number of expenses stored for a user
    pub fn count_expenses(&self, user: &UserId) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE user_id = ?",
            params![user.to_hex()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete every expense belonging to a user, returning how many were removed
    pub fn delete_expenses_for_user(&self, user: &UserId) -> Result<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM expenses WHERE user_id = ?",
            params![user.to_hex()],
        )?;
        Ok(deleted)
    }

    /// Every user with at least one expense, with their expense count
    pub fn list_users(&self) -> Result<Vec<(UserId, i64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, COUNT(*) FROM expenses GROUP BY user_id ORDER BY COUNT(*) DESC, user_id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut users = Vec::new();
        for row in rows {
            let (user_id, count) = row?;
            users.push((parse_user_id(&user_id)?, count));
        }
        Ok(users)
    }

    fn row_to_raw_expense(row: &Row) -> rusqlite::Result<RawExpense> {
        Ok(RawExpense {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            amount: row.get(3)?,
            category: row.get(4)?,
            date: row.get(5)?,
            payment_mode: row.get(6)?,
            description: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

/// Row as stored, before text columns are parsed into domain types
struct RawExpense {
    id: i64,
    user_id: String,
    title: Option<String>,
    amount: f64,
    category: Option<String>,
    date: String,
    payment_mode: String,
    description: Option<String>,
    created_at: String,
}

impl RawExpense {
    fn into_expense(self) -> Result<Expense> {
        Ok(Expense {
            id: self.id,
            user_id: parse_user_id(&self.user_id)?,
            title: self.title,
            amount: self.amount,
            category: self.category,
            date: parse_expense_date(&self.date)?,
            payment_mode: self.payment_mode.parse().unwrap_or_default(),
            description: self.description,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl ExpenseRepository for Database {
    /// Projects only amount and date
    fn expenses_for_user(&self, user: &UserId) -> Result<Vec<ExpenseRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT amount, date FROM expenses WHERE user_id = ?")?;

        let rows = stmt.query_map(params![user.to_hex()], |row| {
            Ok((row.get::<_, f64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (amount, date) = row?;
            records.push(ExpenseRecord::new(amount, parse_expense_date(&date)?));
        }
        Ok(records)
    }
}
