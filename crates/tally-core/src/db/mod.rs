//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `transactions` - Ledger records, fingerprint-keyed
//! - `rules` - Categories, sub-categories and keyword rules

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod rules;
mod transactions;


pub use rules::{Category, CategoryNode};
pub use transactions::TransactionQuery;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Map a UNIQUE violation to `Error::Duplicate`, leave anything else as is
pub(crate) fn unique_violation(err: rusqlite::Error, what: impl Into<String>) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Error::Duplicate(what.into())
        }
        _ => Error::Database(err),
    }
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (or create) the database file and bring the schema up to date
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().max_size(4).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Create an in-memory database (for testing)
    ///
    /// Every pooled connection to `:memory:` is its own database, so the pool
    /// is capped at one connection.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().max_size(1).build(manager)?;

        let db = Self {
            pool,
            db_path: ":memory:".to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- Ledger, one row per statement line
            CREATE TABLE IF NOT EXISTS transactions (
                fingerprint TEXT PRIMARY KEY,
                account_type TEXT NOT NULL,
                amount REAL NOT NULL,
                operation_date TEXT,
                value_date TEXT,
                account_date TEXT,
                raw_label TEXT NOT NULL DEFAULT '',
                simplified_label TEXT NOT NULL DEFAULT '',
                reference TEXT,
                extra_info TEXT,
                operation_type TEXT,
                category TEXT,
                sub_category TEXT,
                debit REAL NOT NULL DEFAULT 0,
                credit REAL NOT NULL DEFAULT 0,
                pointed INTEGER NOT NULL DEFAULT 0,
                budget_kind TEXT NOT NULL DEFAULT 'punctual'
                    CHECK (budget_kind IN ('punctual', 'recurring')),
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(operation_date);
            CREATE INDEX IF NOT EXISTS idx_transactions_simplified ON transactions(simplified_label);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category);

            -- Categories, in declaration order (rule precedence follows id)
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS sub_categories (
                id INTEGER PRIMARY KEY,
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (category_id, name)
            );

            -- A keyword selects exactly one category
            CREATE TABLE IF NOT EXISTS categorization_rules (
                id INTEGER PRIMARY KEY,
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                keyword TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_rules_category ON categorization_rules(category_id);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
