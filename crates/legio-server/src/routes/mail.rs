use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use legio_core::mail::resolve_group_address;
use legio_core::model::{MailMessage, MailType, Priority};
use legio_core::store::{MailFilter, MailStore, SessionStore};
use legio_core::LegioError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

fn mail_store(state: &AppState) -> MailStore {
    MailStore::new(state.paths.mail_db())
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    from: Option<String>,
    to: Option<String>,
    unread_only: Option<bool>,
}

pub async fn list(State(state): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Json<Value>> {
    let filter = MailFilter {
        from: q.from,
        to: q.to,
        unread_only: q.unread_only.unwrap_or(false),
    };
    let messages = mail_store(&state).get_all(&filter)?;
    Ok(Json(json!(messages)))
}

#[derive(Debug, Deserialize)]
pub struct AgentQuery {
    agent: String,
}

pub async fn unread(State(state): State<AppState>, Query(q): Query<AgentQuery>) -> ApiResult<Json<Value>> {
    let messages = mail_store(&state).get_unread(&q.agent)?;
    Ok(Json(json!(messages)))
}

/// Groups every message touching `agent` (as sender or recipient) by thread,
/// newest thread first.
pub async fn conversations(State(state): State<AppState>, Query(q): Query<AgentQuery>) -> ApiResult<Json<Value>> {
    let all = mail_store(&state).get_all(&MailFilter::default())?;
    let mut threads: BTreeMap<String, Vec<MailMessage>> = BTreeMap::new();
    for message in all {
        if message.from != q.agent && message.to != q.agent {
            continue;
        }
        let key = message.thread_id.clone().unwrap_or_else(|| message.id.clone());
        threads.entry(key).or_default().push(message);
    }
    let mut conversations: Vec<Value> = threads
        .into_iter()
        .map(|(thread_id, mut messages)| {
            messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            let last = messages.last().map(|m| m.created_at);
            json!({ "thread_id": thread_id, "messages": messages, "last_activity": last })
        })
        .collect();
    conversations.sort_by(|a, b| b["last_activity"].as_str().cmp(&a["last_activity"].as_str()));
    Ok(Json(json!(conversations)))
}

pub async fn thread(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let messages = mail_store(&state).get_by_thread(&id)?;
    Ok(Json(json!(messages)))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let message = mail_store(&state)
        .get_by_id(&id)?
        .ok_or_else(|| LegioError::not_found("MailMessage", &id))?;
    Ok(Json(json!(message)))
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    from: String,
    to: String,
    subject: String,
    body: String,
    #[serde(rename = "type")]
    mail_type: MailType,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default)]
    payload: Option<Value>,
}

/// Resolves group addresses (`@all`, `@capability`) against the active
/// session set, inserting one message per recipient sharing a thread id.
pub async fn send(State(state): State<AppState>, Json(req): Json<SendRequest>) -> ApiResult<Json<Value>> {
    let sessions = SessionStore::new(state.paths.sessions_db(), state.paths.legacy_sessions_json()).get_active()?;
    let recipients = resolve_group_address(&req.to, &req.from, &sessions)?;

    let thread_id = req
        .thread_id
        .or_else(|| (recipients.len() > 1).then(|| format!("thread-{}", legio_core::util::random_suffix(8))));

    let store = mail_store(&state);
    let mut inserted = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        let message = MailMessage {
            id: String::new(),
            from: req.from.clone(),
            to: recipient,
            subject: req.subject.clone(),
            body: req.body.clone(),
            mail_type: req.mail_type,
            priority: req.priority.unwrap_or(Priority::Normal),
            thread_id: thread_id.clone(),
            payload: req.payload.clone(),
            read: false,
            created_at: Utc::now(),
        };
        inserted.push(store.insert(&message)?);
    }
    Ok(Json(json!(inserted)))
}
