//! CSV import for expense exports

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use std::io::Read;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{NewExpense, PaymentMode, UserId};

/// Column positions resolved from the header row
struct Columns {
    user: usize,
    amount: usize,
    date: usize,
    title: Option<usize>,
    category: Option<usize>,
    payment_mode: Option<usize>,
    description: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| Error::Import(format!("Missing required column: {}", name)))
        };

        Ok(Self {
            user: require("user")?,
            amount: require("amount")?,
            date: require("date")?,
            title: find("title"),
            category: find("category"),
            payment_mode: find("payment_mode"),
            description: find("description"),
        })
    }
}

/// Parse a CSV of expenses into insertable rows
///
/// Required columns are `user`, `amount` and `date`; `title`, `category`,
/// `payment_mode` and `description` are picked up when present.
pub fn parse_expenses_csv<R: Read>(reader: R) -> Result<Vec<NewExpense>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    let columns = Columns::from_headers(&headers)?;

    let mut expenses = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = index + 2;

        let user_str = required(&record, columns.user, "user", line)?;
        let user_id: UserId = user_str
            .parse()
            .map_err(|e| Error::Import(format!("Line {}: invalid user '{}': {}", line, user_str, e)))?;

        let amount = parse_amount(required(&record, columns.amount, "amount", line)?)?;
        let date = parse_date(required(&record, columns.date, "date", line)?)?;

        let title = optional(&record, columns.title);
        let payment_mode = match optional(&record, columns.payment_mode) {
            Some(mode) => mode
                .parse()
                .map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?,
            None => PaymentMode::default(),
        };

        let import_hash = generate_hash(&user_id, &date, title.as_deref().unwrap_or(""), amount);

        expenses.push(NewExpense {
            user_id,
            title,
            amount,
            category: optional(&record, columns.category),
            date,
            payment_mode,
            description: optional(&record, columns.description),
            import_hash,
        });
    }

    debug!(count = expenses.len(), "Parsed expenses from CSV");
    Ok(expenses)
}

fn required<'r>(record: &'r StringRecord, index: usize, name: &str, line: usize) -> Result<&'r str> {
    record
        .get(index)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Import(format!("Line {}: missing {}", line, name)))
}

fn optional(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| record.get(i))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Generate a unique hash for deduplication
pub fn generate_hash(user: &UserId, date: &NaiveDateTime, title: &str, amount: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user.bytes());
    hasher.update(date.to_string().as_bytes());
    hasher.update(title.as_bytes());
    hasher.update(amount.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Parse a date or timestamp in one of the supported formats
///
/// Bare dates are read as midnight. Month-first wins when a slashed date is
/// valid both ways.
pub fn parse_date(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();

    // ISO timestamps as written by document-store exports: 2024-01-15T10:30:00.000Z
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    let date_formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%d/%m/%Y", // 15/01/2024
    ];
    for fmt in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and commas
pub fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['₹', '$', ',', ' '], "")
        .replace("Rs.", "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| Error::Import(format!("Unable to parse amount: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "65a1f0c2e4b0a1b2c3d4e5f6";

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-15").unwrap(), midnight(2024, 1, 15));
        assert_eq!(parse_date("01/15/2024").unwrap(), midnight(2024, 1, 15));
        assert_eq!(parse_date("15/01/2024").unwrap(), midnight(2024, 1, 15));
        assert_eq!(
            parse_date("2024-01-15T10:30:00.000Z").unwrap().to_string(),
            "2024-01-15 10:30:00"
        );
        assert_eq!(
            parse_date("2024-01-15 23:59:59").unwrap().to_string(),
            "2024-01-15 23:59:59"
        );
        assert!(parse_date("last tuesday").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("₹1,234.50").unwrap(), 1234.5);
        assert_eq!(parse_amount("$99").unwrap(), 99.0);
        assert_eq!(parse_amount("Rs. 250").unwrap(), 250.0);
        assert_eq!(parse_amount("(100.00)").unwrap(), -100.0);
        assert!(parse_amount("NaN").is_err());
        assert!(parse_amount("free").is_err());
    }

    #[test]
    fn test_parse_expenses_csv() {
        let csv = format!(
            "user,amount,date,title,category,payment_mode\n\
             {USER},\"₹1,200\",2024-03-01,Groceries,Food,upi\n\
             {USER},45.50,2024-03-02T08:15:00.000Z,Metro,Transport,\n"
        );

        let expenses = parse_expenses_csv(csv.as_bytes()).unwrap();

        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].user_id.to_hex(), USER);
        assert_eq!(expenses[0].amount, 1200.0);
        assert_eq!(expenses[0].title.as_deref(), Some("Groceries"));
        assert_eq!(expenses[0].payment_mode, PaymentMode::Upi);
        assert_eq!(expenses[1].payment_mode, PaymentMode::Cash);
        assert_eq!(expenses[1].date.to_string(), "2024-03-02 08:15:00");
        assert_ne!(expenses[0].import_hash, expenses[1].import_hash);
    }

    #[test]
    fn test_columns_in_any_order() {
        let csv = format!("Date,Amount,User\n2024-03-01,10,{USER}\n");
        let expenses = parse_expenses_csv(csv.as_bytes()).unwrap();
        assert_eq!(expenses[0].amount, 10.0);
        assert!(expenses[0].title.is_none());
    }

    #[test]
    fn test_missing_required_column() {
        let err = parse_expenses_csv("user,date\nx,2024-01-01\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("amount"));
    }

    #[test]
    fn test_invalid_user_reports_line() {
        let csv = format!("user,amount,date\n{USER},1,2024-01-01\nnope,2,2024-01-02\n");
        let err = parse_expenses_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Line 3"));
    }

    #[test]
    fn test_hash_is_stable() {
        let user: UserId = USER.parse().unwrap();
        let date = midnight(2024, 5, 5);
        assert_eq!(
            generate_hash(&user, &date, "Chai", 20.0),
            generate_hash(&user, &date, "Chai", 20.0)
        );
        assert_ne!(
            generate_hash(&user, &date, "Chai", 20.0),
            generate_hash(&user, &date, "Chai", 21.0)
        );
    }
}
