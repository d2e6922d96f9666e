//! Per-file conflict history (§3 "Conflict history record", §4.G).

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::params;

use crate::db::open_store;
use crate::error::LegioResult;
use crate::model::{ConflictHistoryRecord, ConflictOutcome, Tier};

pub struct ConflictHistoryStore {
    db_path: PathBuf,
}

impl ConflictHistoryStore {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> LegioResult<rusqlite::Connection> {
        let conn = open_store(&self.db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS conflict_history (
                file_path TEXT NOT NULL,
                tier TEXT NOT NULL,
                outcome TEXT NOT NULL,
                strategy_hint TEXT,
                recorded_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_conflict_history_file ON conflict_history(file_path, recorded_at);",
        )?;
        Ok(conn)
    }

    pub fn record(&self, record: &ConflictHistoryRecord) -> LegioResult<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO conflict_history (file_path, tier, outcome, strategy_hint, recorded_at)
             VALUES (?1,?2,?3,?4,?5)",
            params![
                record.file_path,
                serde_json::to_string(&record.tier).unwrap_or_default(),
                serde_json::to_string(&record.outcome).unwrap_or_default(),
                record.strategy_hint,
                record.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent outcome for `(file_path, tier)`, used to decide whether
    /// to skip a tier that recently failed for this file.
    pub fn last_outcome(&self, file_path: &str, tier: Tier) -> LegioResult<Option<ConflictOutcome>> {
        let conn = self.open()?;
        let outcome: Option<String> = conn
            .query_row(
                "SELECT outcome FROM conflict_history WHERE file_path = ?1 AND tier = ?2
                 ORDER BY recorded_at DESC LIMIT 1",
                params![file_path, serde_json::to_string(&tier).unwrap_or_default()],
                |row| row.get(0),
            )
            .ok();
        Ok(outcome.and_then(|o| serde_json::from_str(&o).ok()))
    }

    /// True if `file_path` most recently failed at `tier` (§4.G tie-break:
    /// "if a file has a recent failed outcome at tier k, skip tier k").
    pub fn recently_failed(&self, file_path: &str, tier: Tier) -> LegioResult<bool> {
        Ok(matches!(self.last_outcome(file_path, tier)?, Some(ConflictOutcome::Failed)))
    }

    pub fn new_record(file_path: &str, tier: Tier, outcome: ConflictOutcome, hint: Option<String>) -> ConflictHistoryRecord {
        ConflictHistoryRecord {
            file_path: file_path.to_string(),
            tier,
            outcome,
            strategy_hint: hint,
            recorded_at: Utc::now(),
        }
    }
}
