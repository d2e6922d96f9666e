use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use legio_core::model::EventLevel;
use legio_core::store::{EventFilter, EventStore};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct TimelineQuery {
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    level: Option<String>,
    limit: Option<u32>,
}

fn parse_level(raw: Option<&str>) -> Option<EventLevel> {
    match raw?.to_ascii_lowercase().as_str() {
        "debug" => Some(EventLevel::Debug),
        "info" => Some(EventLevel::Info),
        "warn" | "warning" => Some(EventLevel::Warn),
        "error" => Some(EventLevel::Error),
        _ => None,
    }
}

pub async fn timeline(State(state): State<AppState>, Query(q): Query<TimelineQuery>) -> ApiResult<Json<Value>> {
    let store = EventStore::new(state.paths.events_db());
    let filter = EventFilter {
        since: q.since,
        until: q.until,
        level: parse_level(q.level.as_deref()),
        limit: q.limit.unwrap_or(0),
    };
    let events = store.get_timeline(&filter)?;
    Ok(Json(json!(events)))
}

pub async fn errors(State(state): State<AppState>, Query(q): Query<TimelineQuery>) -> ApiResult<Json<Value>> {
    let store = EventStore::new(state.paths.events_db());
    let filter = EventFilter {
        since: q.since,
        until: q.until,
        level: None,
        limit: q.limit.unwrap_or(0),
    };
    let events = store.get_errors(&filter)?;
    Ok(Json(json!(events)))
}

#[derive(Debug, Deserialize, Default)]
pub struct ToolStatsQuery {
    agent: Option<String>,
}

pub async fn tool_stats(State(state): State<AppState>, Query(q): Query<ToolStatsQuery>) -> ApiResult<Json<Value>> {
    let store = EventStore::new(state.paths.events_db());
    let stats = store.get_tool_stats(q.agent.as_deref(), None)?;
    Ok(Json(json!(stats)))
}
