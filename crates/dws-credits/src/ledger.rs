// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit ledger for persisting per-request credit usage to SQLite.
//!
//! Each processing request that reports a cost is recorded with its
//! operation kind and, when present, the remaining balance. The ledger
//! answers per-operation totals since a point in time and the most recent
//! reported balance.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dws_core::{CreditUsage, DwsError, UsageRecorder};
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Timestamp format stored in `created_at`. Lexicographic order matches
/// chronological order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS credit_usage (
        id TEXT PRIMARY KEY NOT NULL,
        operation TEXT NOT NULL,
        cost REAL NOT NULL,
        remaining REAL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_credit_usage_created ON credit_usage(created_at);
    CREATE INDEX IF NOT EXISTS idx_credit_usage_operation ON credit_usage(operation);";

/// Formats a timestamp the way the ledger stores it.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// A single ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEntry {
    /// Unique record identifier (UUID v4).
    pub id: String,
    /// Operation kind in snake_case (e.g. "ocr", "sign").
    pub operation: String,
    pub cost: f64,
    pub remaining: Option<f64>,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

impl UsageEntry {
    /// Creates an entry for `usage` stamped with the current time.
    pub fn new(usage: &CreditUsage) -> Self {
        Self::at(usage, Utc::now())
    }

    /// Creates an entry for `usage` stamped with `at`.
    pub fn at(usage: &CreditUsage, at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operation: usage.operation.to_string(),
            cost: usage.cost,
            remaining: usage.remaining,
            created_at: format_timestamp(at),
        }
    }
}

/// Aggregated usage for one operation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationUsage {
    pub operation: String,
    pub requests: u64,
    pub credits: f64,
}

/// Convert a tokio-rusqlite error into DwsError::Storage.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> DwsError {
    DwsError::Storage {
        source: Box::new(e),
    }
}

/// Persistent credit ledger backed by SQLite.
///
/// All operations go through the single tokio-rusqlite background thread.
pub struct CreditLedger {
    conn: tokio_rusqlite::Connection,
}

impl CreditLedger {
    /// Wraps an existing connection and creates the schema if needed.
    pub async fn new(conn: tokio_rusqlite::Connection) -> Result<Self, DwsError> {
        conn.call(|conn| conn.execute_batch(SCHEMA))
            .await
            .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// Opens (or creates) the ledger database at `path`, creating parent
    /// directories as needed.
    pub async fn open(path: &str) -> Result<Self, DwsError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DwsError::Io {
                    context: format!("Cannot create ledger directory {}", parent.display()),
                    source,
                })?;
        }
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| DwsError::Storage {
                source: Box::new(e),
            })?;
        Self::new(conn).await
    }

    /// Opens a ledger that lives only as long as the process.
    pub async fn open_in_memory() -> Result<Self, DwsError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| DwsError::Storage {
                source: Box::new(e),
            })?;
        Self::new(conn).await
    }

    /// Record a usage entry in the ledger.
    pub async fn record(&self, entry: &UsageEntry) -> Result<(), DwsError> {
        let id = entry.id.clone();
        let operation = entry.operation.clone();
        let cost = entry.cost;
        let remaining = entry.remaining;
        let created_at = entry.created_at.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO credit_usage (id, operation, cost, remaining, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![id, operation, cost, remaining, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        info!(
            operation = %entry.operation,
            cost = entry.cost,
            remaining = ?entry.remaining,
            "credit usage recorded"
        );
        Ok(())
    }

    /// Per-operation request counts and credit sums since `since`, largest
    /// consumer first.
    pub async fn usage_by_operation(&self, since: DateTime<Utc>) -> Result<Vec<OperationUsage>, DwsError> {
        let since = format_timestamp(since);
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT operation, COUNT(*), COALESCE(SUM(cost), 0.0) FROM credit_usage \
                     WHERE created_at >= ?1 GROUP BY operation ORDER BY SUM(cost) DESC, operation",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![since], |row| {
                        Ok(OperationUsage {
                            operation: row.get(0)?,
                            requests: row.get::<_, i64>(1)?.max(0) as u64,
                            credits: row.get(2)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Sum of credits used since `since`.
    pub async fn total_since(&self, since: DateTime<Utc>) -> Result<f64, DwsError> {
        let since = format_timestamp(since);
        self.conn
            .call(move |conn| {
                let total: f64 = conn.query_row(
                    "SELECT COALESCE(SUM(cost), 0.0) FROM credit_usage WHERE created_at >= ?1",
                    rusqlite::params![since],
                    |row| row.get(0),
                )?;
                Ok(total)
            })
            .await
            .map_err(map_tr_err)
    }

    /// The most recently reported remaining balance, if any.
    pub async fn latest_balance(&self) -> Result<Option<f64>, DwsError> {
        self.conn
            .call(|conn| {
                let balance = conn
                    .query_row(
                        "SELECT remaining FROM credit_usage WHERE remaining IS NOT NULL \
                         ORDER BY created_at DESC, rowid DESC LIMIT 1",
                        [],
                        |row| row.get::<_, f64>(0),
                    )
                    .optional()?;
                Ok(balance)
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl UsageRecorder for CreditLedger {
    async fn record_usage(&self, usage: &CreditUsage) -> Result<(), DwsError> {
        self.record(&UsageEntry::new(usage)).await
    }
}
