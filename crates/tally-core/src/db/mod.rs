//! SQLite store with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `categories` - Categories and subcategories
//! - `merchants` - Merchant rules
//! - `mappings` - Saved column mappings
//! - `transactions` - Transaction storage and bulk classification updates
//!
//! `Database` implements [`crate::store::Store`] by delegating to the
//! inherent methods defined in those files.

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod categories;
mod mappings;
mod merchants;
mod store_impl;
mod transactions;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (creating if needed) a database file and run migrations
    pub fn new(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Foreign keys are a per-connection setting in SQLite
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        });
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create an isolated throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` because every pooled
    /// connection to `:memory:` would see a different empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "tally_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        let path = path
            .to_str()
            .ok_or_else(|| Error::Config("temporary directory is not valid UTF-8".to_string()))?
            .to_string();
        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Remove all rows belonging to one user
    pub fn delete_user_data(&self, user_id: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for table in [
            "transactions",
            "merchants",
            "mappings",
            "subcategories",
            "categories",
        ] {
            tx.execute(
                &format!("DELETE FROM {} WHERE user_id = ?", table),
                [user_id],
            )?;
        }
        tx.commit()?;
        info!(user_id, "Deleted user data");
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block writers
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- Categories, grouped as expense / income / transfer
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                category_group TEXT NOT NULL
                    CHECK (category_group IN ('expense', 'income', 'transfer')),
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_name
                ON categories(user_id, category_group, name COLLATE NOCASE);

            CREATE TABLE IF NOT EXISTS subcategories (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_subcategories_name
                ON subcategories(category_id, name COLLATE NOCASE);

            -- Merchant rules; includes is a JSON array of lowercase substrings
            CREATE TABLE IF NOT EXISTS merchants (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                includes TEXT NOT NULL DEFAULT '[]',
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                subcategory_id INTEGER REFERENCES subcategories(id) ON DELETE SET NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_merchants_name
                ON merchants(user_id, name COLLATE NOCASE);

            -- Saved column mappings; column_field_mapping is JSON
            CREATE TABLE IF NOT EXISTS mappings (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                account_name TEXT NOT NULL DEFAULT '',
                includes_header INTEGER NOT NULL DEFAULT 1,
                column_field_mapping TEXT NOT NULL DEFAULT '[]',
                negative_amount_means TEXT NOT NULL DEFAULT '',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_mappings_name
                ON mappings(user_id, name COLLATE NOCASE);

            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                date DATE NOT NULL,
                account_name TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                merchant_id INTEGER REFERENCES merchants(id) ON DELETE SET NULL,
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                subcategory_id INTEGER REFERENCES subcategories(id) ON DELETE SET NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_user_merchant
                ON transactions(user_id, merchant_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_user_date
                ON transactions(user_id, date);
            "#,
        )?;

        info!(path = %self.db_path, "Database migrations complete");
        Ok(())
    }
}

/// Whether an error is a UNIQUE/constraint violation
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Map a constraint violation to `Conflict`, passing other errors through
pub(crate) fn conflict_on_violation(err: rusqlite::Error, message: impl FnOnce() -> String) -> Error {
    if is_constraint_violation(&err) {
        Error::Conflict(message())
    } else {
        Error::Database(err)
    }
}

#[cfg(test)]
mod tests;
