use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, error, info};

use crate::error::StoreError;
use crate::types::{Finding, FindingView};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS findings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    namespace TEXT NOT NULL,
    resource TEXT NOT NULL,
    kind TEXT NOT NULL,
    container TEXT NOT NULL,
    issue TEXT NOT NULL,
    suggestion TEXT NOT NULL,
    subjects TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS findings_created_at ON findings(created_at);
";

const SELECT_NEWEST_FIRST: &str = "
SELECT namespace, resource, kind, container, issue, suggestion, subjects
FROM findings
ORDER BY created_at DESC, id DESC
";

/// Append-only SQLite table of findings
pub struct FindingsStore {
    conn: Connection,
}

impl FindingsStore {
    /// Open (creating if needed) a writable store
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(SCHEMA)?;
        debug!("opened findings store at {}", path.as_ref().display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Read-only handle for query paths; the database must already exist
    pub fn open_readonly(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(path.as_ref(), OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    /// Insert one row and return its id
    pub fn insert(&self, finding: &Finding) -> Result<i64, StoreError> {
        let subjects = serde_json::to_string(&finding.subjects)?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.conn.execute(
            "INSERT INTO findings (namespace, resource, kind, container, issue, suggestion, subjects, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                finding.namespace,
                finding.resource,
                finding.kind,
                finding.container,
                finding.issue,
                finding.suggestion,
                subjects,
                created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert every finding, logging and skipping rows that fail.
    /// Returns how many were stored.
    pub fn insert_all(&self, findings: &[Finding]) -> usize {
        let mut stored = 0;
        for finding in findings {
            match self.insert(finding) {
                Ok(_) => stored += 1,
                Err(e) => error!(
                    "failed to store finding for {}/{}: {}",
                    finding.namespace, finding.resource, e
                ),
            }
        }
        info!("Stored {}/{} findings", stored, findings.len());
        stored
    }

    /// All findings, newest first, subjects included
    pub fn list_findings(&self) -> Result<Vec<Finding>, StoreError> {
        let mut stmt = self.conn.prepare(SELECT_NEWEST_FIRST)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    Finding {
                        namespace: row.get(0)?,
                        resource: row.get(1)?,
                        kind: row.get(2)?,
                        container: row.get(3)?,
                        issue: row.get(4)?,
                        suggestion: row.get(5)?,
                        subjects: Vec::new(),
                    },
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut finding, subjects)| -> Result<Finding, StoreError> {
                finding.subjects = serde_json::from_str(&subjects)?;
                Ok(finding)
            })
            .collect()
    }

    /// Findings as served by the query service, without subjects
    pub fn list_finding_views(&self) -> Result<Vec<FindingView>, StoreError> {
        let mut stmt = self.conn.prepare(SELECT_NEWEST_FIRST)?;
        let views = stmt
            .query_map([], |row| {
                Ok(FindingView {
                    namespace: row.get(0)?,
                    resource: row.get(1)?,
                    kind: row.get(2)?,
                    container: row.get(3)?,
                    issue: row.get(4)?,
                    suggestion: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(views)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM findings", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }
}
