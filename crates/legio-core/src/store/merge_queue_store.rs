//! §4.F Merge queue: durable FIFO.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::error::{LegioError, LegioResult};
use crate::model::{MergeQueueEntry, QueueStatus, Tier};

use super::open_store;

pub struct MergeQueueStore {
    db_path: PathBuf,
}

impl MergeQueueStore {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> LegioResult<rusqlite::Connection> {
        let conn = open_store(&self.db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS merge_queue (
                branch TEXT PRIMARY KEY,
                bead_id TEXT NOT NULL,
                agent_name TEXT NOT NULL,
                files_modified TEXT NOT NULL,
                enqueued_at TEXT NOT NULL,
                status TEXT NOT NULL,
                resolved_tier TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_queue_status_enqueued ON merge_queue(status, enqueued_at);",
        )?;
        Ok(conn)
    }

    /// Only one entry per branch at a time (invariant 3).
    pub fn enqueue(&self, entry: &MergeQueueEntry) -> LegioResult<MergeQueueEntry> {
        let conn = self.open()?;
        let existing: Option<String> = conn
            .query_row(
                "SELECT status FROM merge_queue WHERE branch = ?1",
                params![entry.branch],
                |row| row.get(0),
            )
            .optional_or_none();
        if let Some(status) = existing {
            let status: QueueStatus = serde_json::from_str(&status).unwrap_or(QueueStatus::Pending);
            if matches!(status, QueueStatus::Pending | QueueStatus::Merging) {
                return Err(LegioError::Merge {
                    branch: entry.branch.clone(),
                    tier: None,
                    detail: "a queue entry for this branch is already pending or merging".into(),
                });
            }
        }
        conn.execute(
            "INSERT INTO merge_queue (branch, bead_id, agent_name, files_modified, enqueued_at,
                status, resolved_tier)
             VALUES (?1,?2,?3,?4,?5,?6,?7)
             ON CONFLICT(branch) DO UPDATE SET
                bead_id=excluded.bead_id, agent_name=excluded.agent_name,
                files_modified=excluded.files_modified, enqueued_at=excluded.enqueued_at,
                status=excluded.status, resolved_tier=excluded.resolved_tier",
            params![
                entry.branch,
                entry.bead_id,
                entry.agent_name,
                serde_json::to_string(&entry.files_modified).unwrap_or_default(),
                entry.enqueued_at.to_rfc3339(),
                serde_json::to_string(&QueueStatus::Pending).unwrap_or_default(),
                Option::<String>::None,
            ],
        )?;
        let mut entry = entry.clone();
        entry.status = QueueStatus::Pending;
        entry.resolved_tier = None;
        Ok(entry)
    }

    /// Earliest pending entry, without mutation.
    pub fn peek(&self) -> LegioResult<Option<MergeQueueEntry>> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT * FROM merge_queue WHERE status = ?1 ORDER BY enqueued_at ASC LIMIT 1",
            params![serde_json::to_string(&QueueStatus::Pending).unwrap_or_default()],
            row_to_entry,
        )
        .optional_or_none_result()
    }

    /// Atomically claims the earliest pending entry as `merging`.
    pub fn dequeue(&self) -> LegioResult<Option<MergeQueueEntry>> {
        let conn = self.open()?;
        let entry = conn
            .query_row(
                "SELECT * FROM merge_queue WHERE status = ?1 ORDER BY enqueued_at ASC LIMIT 1",
                params![serde_json::to_string(&QueueStatus::Pending).unwrap_or_default()],
                row_to_entry,
            )
            .optional_or_none_result()?;
        if let Some(entry) = &entry {
            conn.execute(
                "UPDATE merge_queue SET status = ?1 WHERE branch = ?2",
                params![serde_json::to_string(&QueueStatus::Merging).unwrap_or_default(), entry.branch],
            )?;
        }
        Ok(entry.map(|mut e| {
            e.status = QueueStatus::Merging;
            e
        }))
    }

    pub fn list(&self, status: Option<QueueStatus>) -> LegioResult<Vec<MergeQueueEntry>> {
        let conn = self.open()?;
        let entries = if let Some(status) = status {
            let mut stmt = conn.prepare(
                "SELECT * FROM merge_queue WHERE status = ?1 ORDER BY enqueued_at ASC",
            )?;
            let rows = stmt.query_map(params![serde_json::to_string(&status).unwrap_or_default()], row_to_entry)?;
            rows.collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt = conn.prepare("SELECT * FROM merge_queue ORDER BY enqueued_at ASC")?;
            let rows = stmt.query_map([], row_to_entry)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        Ok(entries)
    }

    pub fn update_status(&self, branch: &str, status: QueueStatus, tier: Option<Tier>) -> LegioResult<()> {
        let conn = self.open()?;
        let changed = conn.execute(
            "UPDATE merge_queue SET status = ?1, resolved_tier = ?2 WHERE branch = ?3",
            params![
                serde_json::to_string(&status).unwrap_or_default(),
                tier.map(|t| serde_json::to_string(&t).unwrap_or_default()),
                branch,
            ],
        )?;
        if changed == 0 {
            return Err(LegioError::not_found("queue-entry", branch));
        }
        Ok(())
    }
}

trait OptionalOrNone<T> {
    fn optional_or_none(self) -> Option<T>;
}

impl<T> OptionalOrNone<T> for rusqlite::Result<T> {
    fn optional_or_none(self) -> Option<T> {
        self.ok()
    }
}

trait OptionalOrNoneResult<T> {
    fn optional_or_none_result(self) -> LegioResult<Option<T>>;
}

impl<T> OptionalOrNoneResult<T> for rusqlite::Result<T> {
    fn optional_or_none_result(self) -> LegioResult<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<MergeQueueEntry> {
    let files_modified: String = row.get("files_modified")?;
    let status: String = row.get("status")?;
    let resolved_tier: Option<String> = row.get("resolved_tier")?;
    let enqueued_at: String = row.get("enqueued_at")?;
    Ok(MergeQueueEntry {
        branch: row.get("branch")?,
        bead_id: row.get("bead_id")?,
        agent_name: row.get("agent_name")?,
        files_modified: serde_json::from_str(&files_modified).unwrap_or_default(),
        enqueued_at: DateTime::parse_from_rfc3339(&enqueued_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        status: serde_json::from_str(&status).unwrap_or(QueueStatus::Pending),
        resolved_tier: resolved_tier.and_then(|t| serde_json::from_str(&t).ok()),
    })
}
