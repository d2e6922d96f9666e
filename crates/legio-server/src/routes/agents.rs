use axum::extract::{Path, State};
use axum::Json;
use legio_core::store::{EventFilter, EventStore, SessionStore};
use legio_core::LegioError;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn sessions(state: &AppState) -> SessionStore {
    SessionStore::new(state.paths.sessions_db(), state.paths.legacy_sessions_json())
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let all = sessions(&state).get_all()?;
    Ok(Json(json!(all)))
}

pub async fn active(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let active = sessions(&state).get_active()?;
    Ok(Json(json!(active)))
}

pub async fn get_one(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Value>> {
    let session = sessions(&state)
        .get_by_name(&name)?
        .ok_or_else(|| LegioError::not_found("AgentSession", &name))?;
    Ok(Json(json!(session)))
}

/// Session record plus a tail of its terminal output, if the session is
/// still live in tmux.
pub async fn inspect(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Value>> {
    let session = sessions(&state)
        .get_by_name(&name)?
        .ok_or_else(|| LegioError::not_found("AgentSession", &name))?;

    let terminal = state
        .tmux
        .as_ref()
        .as_ref()
        .and_then(|tmux| tmux.capture(&session.tmux_session, 200).ok());

    Ok(Json(json!({
        "session": session,
        "terminal": terminal,
    })))
}

pub async fn agent_events(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Value>> {
    let store = EventStore::new(state.paths.events_db());
    let events = store.get_by_agent(&name, &EventFilter::default())?;
    Ok(Json(json!(events)))
}
