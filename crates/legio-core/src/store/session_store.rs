//! §4.D Session & run store.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::error::{LegioError, LegioResult};
use crate::model::{AgentSession, Capability, Run, RunStatus, SessionState};

use super::open_store;

/// Opens `sessions.db` (and, on first run, migrates `sessions.json` if
/// present) for the duration of one call. Never held across an await point.
pub struct SessionStore {
    db_path: PathBuf,
    legacy_json_path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>, legacy_json_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            legacy_json_path: legacy_json_path.into(),
        }
    }

    fn open(&self) -> LegioResult<rusqlite::Connection> {
        let is_fresh = !self.db_path.exists();
        let conn = open_store(&self.db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                agent_name TEXT NOT NULL UNIQUE,
                capability TEXT NOT NULL,
                worktree_path TEXT NOT NULL,
                branch TEXT NOT NULL,
                task_id TEXT NOT NULL,
                tmux_session TEXT NOT NULL,
                state TEXT NOT NULL,
                root_pid INTEGER,
                parent_agent TEXT,
                depth INTEGER NOT NULL,
                run_id TEXT NOT NULL,
                started_at TEXT NOT NULL,
                last_activity TEXT NOT NULL,
                stalled_since TEXT,
                escalation_level INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_run ON sessions(run_id);
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                started_at TEXT NOT NULL,
                ended_at TEXT,
                coordinator_session_id TEXT NOT NULL,
                status TEXT NOT NULL
            );",
        )?;
        if is_fresh && self.legacy_json_path.exists() {
            migrate_legacy_json(&conn, &self.legacy_json_path)?;
        }
        Ok(conn)
    }

    pub fn upsert(&self, session: &AgentSession) -> LegioResult<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO sessions (id, agent_name, capability, worktree_path, branch, task_id,
                tmux_session, state, root_pid, parent_agent, depth, run_id, started_at,
                last_activity, stalled_since, escalation_level)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)
             ON CONFLICT(id) DO UPDATE SET
                agent_name=excluded.agent_name, capability=excluded.capability,
                worktree_path=excluded.worktree_path, branch=excluded.branch,
                task_id=excluded.task_id, tmux_session=excluded.tmux_session,
                state=excluded.state, root_pid=excluded.root_pid,
                parent_agent=excluded.parent_agent, depth=excluded.depth,
                run_id=excluded.run_id, started_at=excluded.started_at,
                last_activity=excluded.last_activity, stalled_since=excluded.stalled_since,
                escalation_level=excluded.escalation_level",
            params![
                session.id,
                session.agent_name,
                serde_json::to_string(&session.capability).unwrap_or_default(),
                session.worktree_path,
                session.branch,
                session.task_id,
                session.tmux_session,
                serde_json::to_string(&session.state).unwrap_or_default(),
                session.root_pid,
                session.parent_agent,
                session.depth,
                session.run_id,
                session.started_at.to_rfc3339(),
                session.last_activity.to_rfc3339(),
                session.stalled_since.map(|t| t.to_rfc3339()),
                session.escalation_level,
            ],
        )?;
        Ok(())
    }

    pub fn get_by_name(&self, name: &str) -> LegioResult<Option<AgentSession>> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT * FROM sessions WHERE agent_name = ?1",
            params![name],
            row_to_session,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn get_all(&self) -> LegioResult<Vec<AgentSession>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare("SELECT * FROM sessions ORDER BY started_at ASC")?;
        let rows = stmt.query_map([], row_to_session)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Invariant 1: active sessions are exactly those not in a terminal state.
    pub fn get_active(&self) -> LegioResult<Vec<AgentSession>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|s| s.state.is_active())
            .collect())
    }

    pub fn get_by_run(&self, run_id: &str) -> LegioResult<Vec<AgentSession>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare("SELECT * FROM sessions WHERE run_id = ?1 ORDER BY started_at ASC")?;
        let rows = stmt.query_map(params![run_id], row_to_session)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn create_run(&self, run: &Run) -> LegioResult<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO runs (id, started_at, ended_at, coordinator_session_id, status)
             VALUES (?1,?2,?3,?4,?5)",
            params![
                run.id,
                run.started_at.to_rfc3339(),
                run.ended_at.map(|t| t.to_rfc3339()),
                run.coordinator_session_id,
                serde_json::to_string(&run.status).unwrap_or_default(),
            ],
        )?;
        Ok(())
    }

    pub fn get_run(&self, id: &str) -> LegioResult<Option<Run>> {
        let conn = self.open()?;
        conn.query_row("SELECT * FROM runs WHERE id = ?1", params![id], row_to_run)
            .optional()
            .map_err(Into::into)
    }

    pub fn get_active_run(&self) -> LegioResult<Option<Run>> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT * FROM runs WHERE status = ?1 ORDER BY started_at DESC LIMIT 1",
            params![serde_json::to_string(&RunStatus::Active).unwrap_or_default()],
            row_to_run,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_runs(&self, status: Option<RunStatus>, limit: u32) -> LegioResult<Vec<Run>> {
        let conn = self.open()?;
        let runs = if let Some(status) = status {
            let mut stmt = conn.prepare(
                "SELECT * FROM runs WHERE status = ?1 ORDER BY started_at DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(
                params![serde_json::to_string(&status).unwrap_or_default(), limit],
                row_to_run,
            )?;
            rows.collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt =
                conn.prepare("SELECT * FROM runs ORDER BY started_at DESC LIMIT ?1")?;
            let rows = stmt.query_map(params![limit], row_to_run)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        Ok(runs)
    }

    /// Idempotent: marking an already-ended run ended again is a no-op write.
    pub fn mark_ended(&self, id: &str, status: RunStatus, ended_at: DateTime<Utc>) -> LegioResult<()> {
        let conn = self.open()?;
        conn.execute(
            "UPDATE runs SET status = ?1, ended_at = ?2 WHERE id = ?3",
            params![
                serde_json::to_string(&status).unwrap_or_default(),
                ended_at.to_rfc3339(),
                id
            ],
        )?;
        Ok(())
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<AgentSession> {
    let capability: String = row.get("capability")?;
    let state: String = row.get("state")?;
    let started_at: String = row.get("started_at")?;
    let last_activity: String = row.get("last_activity")?;
    let stalled_since: Option<String> = row.get("stalled_since")?;
    Ok(AgentSession {
        id: row.get("id")?,
        agent_name: row.get("agent_name")?,
        capability: serde_json::from_str(&capability).unwrap_or(Capability::Builder),
        worktree_path: row.get("worktree_path")?,
        branch: row.get("branch")?,
        task_id: row.get("task_id")?,
        tmux_session: row.get("tmux_session")?,
        state: serde_json::from_str(&state).unwrap_or(SessionState::Booting),
        root_pid: row.get("root_pid")?,
        parent_agent: row.get("parent_agent")?,
        depth: row.get("depth")?,
        run_id: row.get("run_id")?,
        started_at: parse_rfc3339(&started_at),
        last_activity: parse_rfc3339(&last_activity),
        stalled_since: stalled_since.as_deref().map(parse_rfc3339),
        escalation_level: row.get("escalation_level")?,
    })
}

fn row_to_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<Run> {
    let status: String = row.get("status")?;
    let started_at: String = row.get("started_at")?;
    let ended_at: Option<String> = row.get("ended_at")?;
    Ok(Run {
        id: row.get("id")?,
        started_at: parse_rfc3339(&started_at),
        ended_at: ended_at.as_deref().map(parse_rfc3339),
        coordinator_session_id: row.get("coordinator_session_id")?,
        status: serde_json::from_str(&status).unwrap_or(RunStatus::Active),
    })
}

fn parse_rfc3339(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// One-directional migration of the legacy `sessions.json` format into the
/// SQLite store, run once on first open when no `sessions.db` yet exists
/// (§4.D, §9 Open Question (b) — see `DESIGN.md`).
fn migrate_legacy_json(conn: &rusqlite::Connection, legacy_path: &Path) -> LegioResult<()> {
    let text = std::fs::read_to_string(legacy_path)?;
    let sessions: Vec<AgentSession> = match serde_json::from_str(&text) {
        Ok(sessions) => sessions,
        Err(_) => return Ok(()),
    };
    for session in &sessions {
        conn.execute(
            "INSERT OR IGNORE INTO sessions (id, agent_name, capability, worktree_path, branch,
                task_id, tmux_session, state, root_pid, parent_agent, depth, run_id, started_at,
                last_activity, stalled_since, escalation_level)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
            params![
                session.id,
                session.agent_name,
                serde_json::to_string(&session.capability).unwrap_or_default(),
                session.worktree_path,
                session.branch,
                session.task_id,
                session.tmux_session,
                serde_json::to_string(&session.state).unwrap_or_default(),
                session.root_pid,
                session.parent_agent,
                session.depth,
                session.run_id,
                session.started_at.to_rfc3339(),
                session.last_activity.to_rfc3339(),
                session.stalled_since.map(|t| t.to_rfc3339()),
                session.escalation_level,
            ],
        )?;
    }
    tracing::info!(count = sessions.len(), "migrated legacy sessions.json into sessions.db");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session(name: &str) -> AgentSession {
        AgentSession {
            id: format!("sess-{name}"),
            agent_name: name.to_string(),
            capability: Capability::Builder,
            worktree_path: format!("/tmp/{name}"),
            branch: format!("legio/{name}/t1"),
            task_id: "t1".into(),
            tmux_session: format!("legio-proj-{name}"),
            state: SessionState::Booting,
            root_pid: Some(100),
            parent_agent: None,
            depth: 0,
            run_id: "run-1".into(),
            started_at: Utc::now(),
            last_activity: Utc::now(),
            stalled_since: None,
            escalation_level: 0,
        }
    }

    #[test]
    fn upsert_then_get_preserves_attributes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().join("sessions.db"), dir.path().join("sessions.json"));
        let session = sample_session("b1");
        store.upsert(&session).expect("upsert");
        let fetched = store.get_by_name("b1").expect("get").expect("present");
        assert_eq!(fetched.agent_name, session.agent_name);
        assert_eq!(fetched.branch, session.branch);
        assert_eq!(fetched.root_pid, session.root_pid);
    }

    #[test]
    fn get_active_excludes_terminal_states() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().join("sessions.db"), dir.path().join("sessions.json"));
        let mut done = sample_session("done");
        done.state = SessionState::Completed;
        store.upsert(&done).expect("upsert");
        store.upsert(&sample_session("live")).expect("upsert");
        let active = store.get_active().expect("get_active");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].agent_name, "live");
    }
}
