use axum::extract::{Path, Query, State};
use axum::Json;
use legio_core::store::SessionStore;
use legio_core::LegioError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

fn sessions(state: &AppState) -> SessionStore {
    SessionStore::new(state.paths.sessions_db(), state.paths.legacy_sessions_json())
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    limit: Option<u32>,
}

pub async fn list(State(state): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Json<Value>> {
    let runs = sessions(&state).list_runs(None, q.limit.unwrap_or(100))?;
    Ok(Json(json!(runs)))
}

pub async fn active(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let run = sessions(&state).get_active_run()?;
    Ok(Json(json!(run)))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let run = sessions(&state)
        .get_run(&id)?
        .ok_or_else(|| LegioError::not_found("Run", &id))?;
    Ok(Json(json!(run)))
}
