//! Database access layer with connection pooling and migrations
//!
//! - `expenses` - Expense storage and the [`ExpenseRepository`] implementation
//!
//! [`ExpenseRepository`]: crate::repository::ExpenseRepository

use chrono::{DateTime, NaiveDateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod expenses;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "SPENDCAST_DB_KEY";

/// Storage format for expense timestamps
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path. This allows moving/renaming/restoring the database freely.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Fixed application salt - changing this would invalidate all existing encrypted databases
    const APP_SALT: &[u8; 16] = b"spendcast-salt-1";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    // Hex-encoded hash output becomes the raw SQLCipher key
    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|_| Error::InvalidData(format!("Malformed timestamp in storage: {}", s)))
}

/// Parse a stored expense timestamp; bare dates are read as midnight
pub(crate) fn parse_expense_date(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| Error::InvalidData(format!("Malformed expense date in storage: {}", s)))
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
    /// Whether connections are opened with a SQLCipher key
    encrypted: bool,
}

impl Database {
    /// Create a new database connection pool with encryption
    ///
    /// Requires `SPENDCAST_DB_KEY` environment variable to be set.
    /// The database will be encrypted using SQLCipher with a key derived
    /// from the passphrase via Argon2.
    ///
    /// Returns an error if `SPENDCAST_DB_KEY` is not set. Use `new_unencrypted()`
    /// for development/testing without encryption.
    pub fn new(path: &str) -> Result<Self> {
        match std::env::var(DB_KEY_ENV).ok() {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases (not recommended for production).",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    ///
    /// WARNING: This creates an unencrypted database. Only use for development
    /// or testing. For production, use `new()` with `SPENDCAST_DB_KEY` set.
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let key_pragma = format!("PRAGMA key = 'x\"{}\"';", key);

            // Use with_init to set the key on every new connection
            let manager = manager.with_init(move |conn| {
                conn.execute_batch(&key_pragma)?;
                Ok(())
            });

            Pool::builder().max_size(10).build(manager)?
        } else {
            Pool::builder().max_size(10).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
            encrypted: passphrase.is_some(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create an in-memory database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because SQLCipher
    /// has issues with in-memory databases in the connection pool.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "spendcast_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let path = path.to_string_lossy().into_owned();

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Whether this database was opened with an encryption key
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block the occasional import
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- Expenses, one row per recorded spend
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,                     -- 24 hex chars, lowercase
                title TEXT,
                amount REAL NOT NULL,
                category TEXT,
                date DATETIME NOT NULL,                    -- "YYYY-MM-DD HH:MM:SS"
                payment_mode TEXT NOT NULL DEFAULT 'cash',
                description TEXT,
                import_hash TEXT UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_user ON expenses(user_id);
            CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expense_date_formats() {
        let full = parse_expense_date("2024-05-06 13:45:00").unwrap();
        assert_eq!(full.to_string(), "2024-05-06 13:45:00");

        let bare = parse_expense_date("2024-05-06").unwrap();
        assert_eq!(bare.to_string(), "2024-05-06 00:00:00");

        assert!(matches!(
            parse_expense_date("yesterday"),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        let ts = parse_datetime("2024-05-06 13:45:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-06T13:45:00+00:00");

        assert!(matches!(
            parse_datetime("not a timestamp"),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_encryption_flag_and_path() {
        let dir = tempfile::TempDir::new().unwrap();

        let plain_path = dir.path().join("plain.db");
        let plain_path = plain_path.to_str().unwrap();
        let plain = Database::new_unencrypted(plain_path).unwrap();
        assert!(!plain.is_encrypted());
        assert_eq!(plain.path(), plain_path);

        let keyed_path = dir.path().join("keyed.db");
        let keyed_path = keyed_path.to_str().unwrap();
        let keyed = Database::new_with_key(keyed_path, Some("hunter2")).unwrap();
        assert!(keyed.is_encrypted());
        assert_eq!(keyed.path(), keyed_path);
    }

    #[test]
    fn test_derive_key_is_stable() {
        let a = derive_key("correct horse battery staple").unwrap();
        let b = derive_key("correct horse battery staple").unwrap();
        let c = derive_key("another passphrase").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = Database::in_memory().unwrap();
        db.run_migrations().unwrap();
        let count: i64 = db
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
