//! `PostgreSQL` seat directory and reservation ledger for Seatbook.
//!
//! [`PostgresStore`] implements `SeatDirectory`, `PersonDirectory` and
//! `ReservationLedger` from `seatbook-core` on one connection pool, so seat
//! deletion and reservation inserts can lock each other out.
//!
//! # Uniqueness
//!
//! The two ledger invariants live in the schema as partial unique indexes:
//!
//! ```sql
//! CREATE UNIQUE INDEX ... ON reservations (seat_id, reserved_date)   WHERE status = 'active';
//! CREATE UNIQUE INDEX ... ON reservations (person_id, reserved_date) WHERE status = 'active';
//! ```
//!
//! An insert runs `INSERT ... ON CONFLICT DO NOTHING` inside a transaction
//! holding `FOR SHARE` on the seat row. When nothing was inserted the store
//! looks at which slot is held (person first, then seat) to report the
//! outcome.
//!
//! # Example
//!
//! ```ignore
//! use seatbook_postgres::PostgresStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresStore::new("postgres://localhost/seatbook").await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod directory;
mod ledger;

use seatbook_core::{DirectoryError, LedgerError, Role};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use thiserror::Error;

/// SQLSTATE for `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE for `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

/// Errors from connecting or migrating the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The pool could not connect.
    #[error("Failed to connect: {0}")]
    Connect(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(String),
}

/// Connection pool sizing.
#[derive(Clone, Debug)]
pub struct PoolOptions {
    /// Maximum open connections
    pub max_connections: u32,
    /// Connections kept open when idle
    pub min_connections: u32,
    /// How long to wait for a free connection
    pub acquire_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// `PostgreSQL`-backed seats, people and reservations.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect with default pool options.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connect`] if the database is unreachable.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        Self::connect(database_url, &PoolOptions::default()).await
    }

    /// Connect with explicit pool options.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connect`] if the database is unreachable.
    pub async fn connect(database_url: &str, options: &PoolOptions) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .min_connections(options.min_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        tracing::info!(
            max_connections = options.max_connections,
            "Connected to PostgreSQL"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Migration`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Round-trip a trivial query, for readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }
}

/// End a transaction that stopped at an expected refusal.
///
/// A failed rollback leaves nothing to undo; the connection discards the
/// transaction when it returns to the pool.
async fn roll_back(tx: Transaction<'_, Postgres>) {
    if let Err(e) = tx.rollback().await {
        tracing::debug!(error = %e, "Rollback failed");
    }
}

/// Whether the database aborted the statement because of a concurrent writer.
fn is_transient(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if matches!(
            db.code().as_deref(),
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
        )
    )
}

fn ledger_error(error: sqlx::Error) -> LedgerError {
    if is_transient(&error) {
        metrics::counter!("seatbook_postgres_transient_errors_total").increment(1);
        LedgerError::Conflict(error.to_string())
    } else {
        LedgerError::Storage(error.to_string())
    }
}

fn directory_error(error: sqlx::Error) -> DirectoryError {
    DirectoryError::Storage(error.to_string())
}

fn parse_role(raw: &str) -> Result<Role, sqlx::Error> {
    raw.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
