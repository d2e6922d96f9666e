//! §4.E Mail store. Group-address expansion lives above this store, in
//! `crate::mail` — this module only ever inserts/reads individual messages.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::error::LegioResult;
use crate::model::{MailMessage, MailType, Priority};

use super::open_store;
use crate::util::random_suffix;

pub struct MailStore {
    db_path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct MailFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub unread_only: bool,
}

impl MailStore {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> LegioResult<rusqlite::Connection> {
        let conn = open_store(&self.db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS mail (
                id TEXT PRIMARY KEY,
                sender TEXT NOT NULL,
                recipient TEXT NOT NULL,
                subject TEXT NOT NULL,
                body TEXT NOT NULL,
                mail_type TEXT NOT NULL,
                priority TEXT NOT NULL,
                thread_id TEXT,
                payload TEXT,
                read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_mail_to_read_created ON mail(recipient, read, created_at);
            CREATE INDEX IF NOT EXISTS idx_mail_thread_created ON mail(thread_id, created_at);",
        )?;
        Ok(conn)
    }

    /// Inserts one message, minting an id (`msg-` + random suffix) if absent.
    pub fn insert(&self, message: &MailMessage) -> LegioResult<MailMessage> {
        let conn = self.open()?;
        let mut message = message.clone();
        if message.id.is_empty() {
            message.id = format!("msg-{}", random_suffix(10));
        }
        conn.execute(
            "INSERT INTO mail (id, sender, recipient, subject, body, mail_type, priority,
                thread_id, payload, read, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
            params![
                message.id,
                message.from,
                message.to,
                message.subject,
                message.body,
                serde_json::to_string(&message.mail_type).unwrap_or_default(),
                serde_json::to_string(&message.priority).unwrap_or_default(),
                message.thread_id,
                message.payload.as_ref().map(|p| p.to_string()),
                message.read,
                message.created_at.to_rfc3339(),
            ],
        )?;
        Ok(message)
    }

    pub fn get_by_id(&self, id: &str) -> LegioResult<Option<MailMessage>> {
        let conn = self.open()?;
        conn.query_row("SELECT * FROM mail WHERE id = ?1", params![id], row_to_mail)
            .optional_or_not_found()
    }

    pub fn get_all(&self, filter: &MailFilter) -> LegioResult<Vec<MailMessage>> {
        let conn = self.open()?;
        let mut sql = String::from("SELECT * FROM mail WHERE 1 = 1");
        let mut owned_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(from) = &filter.from {
            sql.push_str(&format!(" AND sender = ?{}", owned_params.len() + 1));
            owned_params.push(Box::new(from.clone()));
        }
        if let Some(to) = &filter.to {
            sql.push_str(&format!(" AND recipient = ?{}", owned_params.len() + 1));
            owned_params.push(Box::new(to.clone()));
        }
        if filter.unread_only {
            sql.push_str(" AND read = 0");
        }
        sql.push_str(" ORDER BY created_at ASC");

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = owned_params.iter().map(AsRef::as_ref).collect();
        let rows = stmt.query_map(param_refs.as_slice(), row_to_mail)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Hot path: unread mail for one recipient (§4.E composite index).
    pub fn get_unread(&self, agent: &str) -> LegioResult<Vec<MailMessage>> {
        self.get_all(&MailFilter {
            to: Some(agent.to_string()),
            unread_only: true,
            ..Default::default()
        })
    }

    pub fn get_by_thread(&self, thread_id: &str) -> LegioResult<Vec<MailMessage>> {
        let conn = self.open()?;
        let mut stmt =
            conn.prepare("SELECT * FROM mail WHERE thread_id = ?1 ORDER BY created_at ASC")?;
        let rows = stmt.query_map(params![thread_id], row_to_mail)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Monotonic false→true; calling twice on an already-read message is a
    /// no-op observable outcome (round-trip idempotence property).
    pub fn mark_read(&self, id: &str) -> LegioResult<()> {
        let conn = self.open()?;
        conn.execute("UPDATE mail SET read = 1 WHERE id = ?1", params![id])?;
        Ok(())
    }
}

/// Small local helper so `query_row().optional()` reads as "absent is fine".
trait OptionalOrNotFound<T> {
    fn optional_or_not_found(self) -> LegioResult<Option<T>>;
}

impl<T> OptionalOrNotFound<T> for rusqlite::Result<T> {
    fn optional_or_not_found(self) -> LegioResult<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

fn row_to_mail(row: &rusqlite::Row<'_>) -> rusqlite::Result<MailMessage> {
    let mail_type: String = row.get("mail_type")?;
    let priority: String = row.get("priority")?;
    let created_at: String = row.get("created_at")?;
    let payload: Option<String> = row.get("payload")?;
    Ok(MailMessage {
        id: row.get("id")?,
        from: row.get("sender")?,
        to: row.get("recipient")?,
        subject: row.get("subject")?,
        body: row.get("body")?,
        mail_type: serde_json::from_str(&mail_type).unwrap_or(MailType::Status),
        priority: serde_json::from_str(&priority).unwrap_or(Priority::Normal),
        thread_id: row.get("thread_id")?,
        payload: payload.and_then(|p| serde_json::from_str(&p).ok()),
        read: row.get::<_, i64>("read")? != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
