//! SQLite persistence for normalized regulation records.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use serde::Serialize;
use tracing::{info, warn};

use regwatch_core::{Level, Regulation};

use crate::StoreError;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS regulations (
    id TEXT PRIMARY KEY,
    level TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    published_date TEXT NOT NULL DEFAULT '',
    full_text TEXT NOT NULL DEFAULT '',
    source_url TEXT NOT NULL DEFAULT '',
    source_last_modified TEXT NOT NULL DEFAULT '',
    last_updated TEXT NOT NULL
)";

const COLUMNS: &str = "id, level, title, description, published_date, \
                       full_text, source_url, source_last_modified, last_updated";

/// A record as read back from the table, including the local write stamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRegulation {
    #[serde(flatten)]
    pub regulation: Regulation,
    /// UTC wall-clock of the most recent write, RFC 3339. Set by the
    /// store, never by sources.
    pub last_updated: String,
}

/// A single row that failed to persist. The rest of the batch proceeds.
#[derive(Debug, Clone, Serialize)]
pub struct WriteFailure {
    pub id: String,
    pub message: String,
}

/// Result of writing one batch of normalized records.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub written: u64,
    pub failures: Vec<WriteFailure>,
}

/// Filters for the read path, mirroring what the display layer needs.
#[derive(Debug, Clone)]
pub struct RegulationFilter {
    pub level: Option<Level>,
    /// Case-insensitive substring match on title or description.
    pub query: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for RegulationFilter {
    fn default() -> Self {
        Self {
            level: None,
            query: None,
            limit: 20,
            offset: 0,
        }
    }
}

/// The `regulations` table behind one SQLite connection.
///
/// The schema is created on open, so a fresh database is usable
/// immediately. Supports in-memory (ephemeral) and file-backed modes;
/// the file-backed mode is the only state that survives between runs.
pub struct RegulationStore {
    conn: Connection,
}

impl RegulationStore {
    /// Open an in-memory database (tests and dry runs).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    /// Open or create a persistent database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn })
    }

    /// Insert-or-replace one record, stamping `last_updated` with the
    /// current UTC wall-clock. Non-key columns are always overwritten,
    /// so `last_updated` advances even when the source data is unchanged.
    pub fn upsert(&self, record: &Regulation) -> Result<(), StoreError> {
        self.upsert_at(record, &now_stamp())
    }

    fn upsert_at(&self, record: &Regulation, now: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO regulations (id, level, title, description, published_date,
                 full_text, source_url, source_last_modified, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                level = excluded.level,
                title = excluded.title,
                description = excluded.description,
                published_date = excluded.published_date,
                full_text = excluded.full_text,
                source_url = excluded.source_url,
                source_last_modified = excluded.source_last_modified,
                last_updated = excluded.last_updated",
            params![
                record.id,
                record.level.as_str(),
                record.title,
                record.description,
                record.published_date,
                record.full_text,
                record.source_url,
                record.source_last_modified,
                now,
            ],
        )?;
        Ok(())
    }

    /// Write a batch with per-row error isolation: a failing row is
    /// recorded in the outcome and the remainder still lands.
    pub fn upsert_all(&self, records: &[Regulation]) -> BatchOutcome {
        let now = now_stamp();
        let mut outcome = BatchOutcome::default();
        for record in records {
            match self.upsert_at(record, &now) {
                Ok(()) => outcome.written += 1,
                Err(err) => {
                    warn!(id = %record.id, %err, "row write failed");
                    outcome.failures.push(WriteFailure {
                        id: record.id.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        info!(
            written = outcome.written,
            failed = outcome.failures.len(),
            "batch upsert complete"
        );
        outcome
    }

    /// Fetch a single record by id.
    pub fn get(&self, id: &str) -> Result<Option<StoredRegulation>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM regulations WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, [id], row_to_stored)
            .optional()?;
        Ok(row)
    }

    /// Query the table with optional level and substring filters,
    /// most recently published first.
    pub fn search(&self, filter: &RegulationFilter) -> Result<Vec<StoredRegulation>, StoreError> {
        let mut sql = format!("SELECT {COLUMNS} FROM regulations WHERE 1=1");
        let mut args: Vec<String> = Vec::new();

        if let Some(level) = filter.level {
            sql.push_str(" AND level = ?");
            args.push(level.as_str().to_string());
        }
        if let Some(query) = filter.query.as_deref().filter(|q| !q.is_empty()) {
            sql.push_str(" AND (title LIKE ? OR description LIKE ?)");
            let pattern = format!("%{query}%");
            args.push(pattern.clone());
            args.push(pattern);
        }
        sql.push_str(&format!(
            " ORDER BY published_date DESC, id LIMIT {} OFFSET {}",
            filter.limit, filter.offset
        ));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(&args), row_to_stored)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Number of rows in the table.
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM regulations", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn now_stamp() -> String {
    // Fixed-width fractional seconds keep the stamps lexicographically
    // ordered, which is what the monotonicity invariant relies on.
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_stored(row: &Row<'_>) -> rusqlite::Result<StoredRegulation> {
    let level_text: String = row.get(1)?;
    let level: Level = level_text.parse().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(StoredRegulation {
        regulation: Regulation {
            id: row.get(0)?,
            level,
            title: row.get(2)?,
            description: row.get(3)?,
            published_date: row.get(4)?,
            full_text: row.get(5)?,
            source_url: row.get(6)?,
            source_last_modified: row.get(7)?,
        },
        last_updated: row.get(8)?,
    })
}
