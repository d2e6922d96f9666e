//! **(added)** Audit store backing `audit.db` (SPEC_FULL.md §3).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::error::LegioResult;
use crate::model::AuditEntry;
use crate::util::random_suffix;

use super::open_store;

pub struct AuditStore {
    db_path: PathBuf,
}

impl AuditStore {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> LegioResult<rusqlite::Connection> {
        let conn = open_store(&self.db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit (
                id TEXT PRIMARY KEY,
                actor TEXT NOT NULL,
                action TEXT NOT NULL,
                detail TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_audit_created ON audit(created_at);",
        )?;
        Ok(conn)
    }

    pub fn record(&self, actor: &str, action: &str, detail: serde_json::Value) -> LegioResult<AuditEntry> {
        let conn = self.open()?;
        let entry = AuditEntry {
            id: format!("audit-{}", random_suffix(8)),
            actor: actor.to_string(),
            action: action.to_string(),
            detail,
            created_at: Utc::now(),
        };
        conn.execute(
            "INSERT INTO audit (id, actor, action, detail, created_at) VALUES (?1,?2,?3,?4,?5)",
            params![
                entry.id,
                entry.actor,
                entry.action,
                entry.detail.to_string(),
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Ok(entry)
    }

    pub fn list(&self, limit: u32) -> LegioResult<Vec<AuditEntry>> {
        let conn = self.open()?;
        let limit = if limit == 0 { 200 } else { limit };
        let mut stmt =
            conn.prepare("SELECT * FROM audit ORDER BY created_at DESC LIMIT ?1")?;
        let rows = stmt.query_map(params![limit], |row| {
            let created_at: String = row.get("created_at")?;
            let detail: String = row.get("detail")?;
            Ok(AuditEntry {
                id: row.get("id")?,
                actor: row.get("actor")?,
                action: row.get("action")?,
                detail: serde_json::from_str(&detail).unwrap_or(serde_json::Value::Null),
                created_at: DateTime::parse_from_rfc3339(&created_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
