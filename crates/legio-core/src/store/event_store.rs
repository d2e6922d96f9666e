//! §4.C Event store: append-only, indexed by agent/run/level/type.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;

use crate::error::LegioResult;
use crate::model::{Event, EventLevel, EventType};

use super::open_store;

pub struct EventStore {
    db_path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: u32,
    pub level: Option<EventLevel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolStats {
    pub tool_name: String,
    pub count: u64,
    pub avg_duration_ms: f64,
    pub max_duration_ms: i64,
}

impl EventStore {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> LegioResult<rusqlite::Connection> {
        let conn = open_store(&self.db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                run_id TEXT NOT NULL,
                agent_name TEXT NOT NULL,
                session_id TEXT NOT NULL,
                event_type TEXT NOT NULL,
                tool_name TEXT,
                tool_args TEXT,
                tool_duration_ms INTEGER,
                level TEXT NOT NULL,
                data TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_events_agent_time ON events(agent_name, timestamp);
            CREATE INDEX IF NOT EXISTS idx_events_run_time ON events(run_id, timestamp);
            CREATE INDEX IF NOT EXISTS idx_events_level_time ON events(level, timestamp);
            CREATE INDEX IF NOT EXISTS idx_events_type_time ON events(event_type, timestamp);",
        )?;
        Ok(conn)
    }

    /// `id` and `timestamp` are assigned here; callers pass placeholders.
    pub fn insert(&self, event: &Event) -> LegioResult<i64> {
        let conn = self.open()?;
        let timestamp = Utc::now();
        conn.execute(
            "INSERT INTO events (timestamp, run_id, agent_name, session_id, event_type, tool_name,
                tool_args, tool_duration_ms, level, data)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                timestamp.to_rfc3339(),
                event.run_id,
                event.agent_name,
                event.session_id,
                serde_json::to_string(&event.event_type).unwrap_or_default(),
                event.tool_name,
                event.tool_args,
                event.tool_duration_ms,
                serde_json::to_string(&event.level).unwrap_or_default(),
                event.data,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_by_agent(&self, agent_name: &str, filter: &EventFilter) -> LegioResult<Vec<Event>> {
        self.query("agent_name = ?1", params![agent_name], filter)
    }

    pub fn get_timeline(&self, filter: &EventFilter) -> LegioResult<Vec<Event>> {
        self.query("1 = 1", params![], filter)
    }

    pub fn get_errors(&self, filter: &EventFilter) -> LegioResult<Vec<Event>> {
        self.query(
            "event_type = ?1",
            params![serde_json::to_string(&EventType::Error).unwrap_or_default()],
            filter,
        )
    }

    fn query(
        &self,
        where_clause: &str,
        base_params: &[&dyn rusqlite::ToSql],
        filter: &EventFilter,
    ) -> LegioResult<Vec<Event>> {
        let conn = self.open()?;
        let mut sql = format!("SELECT * FROM events WHERE {where_clause}");
        let mut owned_params: Vec<Box<dyn rusqlite::ToSql>> =
            base_params.iter().map(|p| clone_to_sql(*p)).collect();

        if let Some(level) = filter.level {
            sql.push_str(&format!(" AND level = ?{}", owned_params.len() + 1));
            owned_params.push(Box::new(serde_json::to_string(&level).unwrap_or_default()));
        }
        if let Some(since) = filter.since {
            sql.push_str(&format!(" AND timestamp >= ?{}", owned_params.len() + 1));
            owned_params.push(Box::new(since.to_rfc3339()));
        }
        if let Some(until) = filter.until {
            sql.push_str(&format!(" AND timestamp <= ?{}", owned_params.len() + 1));
            owned_params.push(Box::new(until.to_rfc3339()));
        }
        sql.push_str(" ORDER BY timestamp ASC, id ASC");
        let limit = if filter.limit == 0 { 1000 } else { filter.limit };
        sql.push_str(&format!(" LIMIT ?{}", owned_params.len() + 1));
        owned_params.push(Box::new(limit));

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = owned_params.iter().map(AsRef::as_ref).collect();
        let rows = stmt.query_map(param_refs.as_slice(), row_to_event)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn get_tool_stats(&self, agent: Option<&str>, since: Option<DateTime<Utc>>) -> LegioResult<Vec<ToolStats>> {
        let conn = self.open()?;
        let mut sql = String::from(
            "SELECT tool_name, COUNT(*) as cnt, AVG(tool_duration_ms) as avg_ms, MAX(tool_duration_ms) as max_ms
             FROM events WHERE event_type = ?1 AND tool_name IS NOT NULL",
        );
        let mut owned_params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(
            serde_json::to_string(&EventType::ToolEnd).unwrap_or_default(),
        )];
        if let Some(agent) = agent {
            sql.push_str(&format!(" AND agent_name = ?{}", owned_params.len() + 1));
            owned_params.push(Box::new(agent.to_string()));
        }
        if let Some(since) = since {
            sql.push_str(&format!(" AND timestamp >= ?{}", owned_params.len() + 1));
            owned_params.push(Box::new(since.to_rfc3339()));
        }
        sql.push_str(" GROUP BY tool_name ORDER BY cnt DESC");

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = owned_params.iter().map(AsRef::as_ref).collect();
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok(ToolStats {
                tool_name: row.get(0)?,
                count: row.get(1)?,
                avg_duration_ms: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                max_duration_ms: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn clone_to_sql(value: &dyn rusqlite::ToSql) -> Box<dyn rusqlite::ToSql> {
    match value.to_sql() {
        Ok(rusqlite::types::ToSqlOutput::Borrowed(v)) => Box::new(v.into_owned()),
        Ok(rusqlite::types::ToSqlOutput::Owned(v)) => Box::new(v),
        _ => Box::new(rusqlite::types::Null),
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    let event_type: String = row.get("event_type")?;
    let level: String = row.get("level")?;
    let timestamp: String = row.get("timestamp")?;
    Ok(Event {
        id: row.get("id")?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        run_id: row.get("run_id")?,
        agent_name: row.get("agent_name")?,
        session_id: row.get("session_id")?,
        event_type: serde_json::from_str(&event_type).unwrap_or(EventType::Custom),
        tool_name: row.get("tool_name")?,
        tool_args: row.get("tool_args")?,
        tool_duration_ms: row.get("tool_duration_ms")?,
        level: serde_json::from_str(&level).unwrap_or(EventLevel::Info),
        data: row.get("data")?,
    })
}
