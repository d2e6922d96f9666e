use axum::extract::{Path, Query, State};
use axum::Json;
use legio_core::store::{AuditStore, SessionStore};
use legio_core::LegioError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn status(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let sessions = SessionStore::new(state.paths.sessions_db(), state.paths.legacy_sessions_json());
    let active = sessions.get_active()?;
    let active_run = sessions.get_active_run()?;
    Ok(Json(json!({
        "project": state.config.project.name,
        "canonical_branch": state.config.project.canonical_branch,
        "active_agent_count": active.len(),
        "active_run": active_run,
        "autopilot_running": state.autopilot.is_running(),
    })))
}

pub async fn config(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.config.as_ref()))
}

pub async fn metrics(State(state): State<AppState>) -> Json<Value> {
    Json(json!(crate::snapshot::metrics_summary(&state)))
}

/// No `metrics.db` writer exists; this wraps one live reading so the shape
/// matches a future historical series without pretending one is stored.
pub async fn metrics_snapshots(State(state): State<AppState>) -> Json<Value> {
    Json(json!([crate::snapshot::metrics_summary(&state)]))
}

/// Issue tracking is a thin wrapper over an external CLI that this system
/// does not model; these routes are a read-through stub until one is wired
/// up, returning an empty result rather than failing the request.
pub async fn issues() -> Json<Value> {
    Json(json!({ "issues": [] }))
}

pub async fn issues_ready() -> Json<Value> {
    Json(json!({ "issues": [] }))
}

pub async fn issue_one(Path(id): Path<String>) -> ApiResult<Json<Value>> {
    Err(LegioError::not_found("Issue", &id).into())
}

#[derive(Debug, Deserialize)]
pub struct TerminalCaptureQuery {
    agent: String,
    lines: Option<u32>,
}

pub async fn terminal_capture(
    State(state): State<AppState>,
    Query(q): Query<TerminalCaptureQuery>,
) -> ApiResult<Json<Value>> {
    let sessions = SessionStore::new(state.paths.sessions_db(), state.paths.legacy_sessions_json());
    let session = sessions
        .get_by_name(&q.agent)?
        .ok_or_else(|| LegioError::not_found("AgentSession", &q.agent))?;
    let tmux = state
        .tmux
        .as_ref()
        .as_ref()
        .ok_or_else(|| LegioError::agent(&q.agent, "tmux binary not located on this host"))?;
    let output = tmux.capture(&session.tmux_session, q.lines.unwrap_or(200))?;
    Ok(Json(json!({ "agent": q.agent, "output": output })))
}

#[derive(Debug, Deserialize)]
pub struct TerminalSendRequest {
    agent: String,
    text: String,
}

pub async fn terminal_send(
    State(state): State<AppState>,
    Json(req): Json<TerminalSendRequest>,
) -> ApiResult<Json<Value>> {
    let sessions = SessionStore::new(state.paths.sessions_db(), state.paths.legacy_sessions_json());
    let session = sessions
        .get_by_name(&req.agent)?
        .ok_or_else(|| LegioError::not_found("AgentSession", &req.agent))?;
    let tmux = state
        .tmux
        .as_ref()
        .as_ref()
        .ok_or_else(|| LegioError::agent(&req.agent, "tmux binary not located on this host"))?;
    tmux.send_keys(&session.tmux_session, &req.text)?;
    Ok(Json(json!({ "sent": true })))
}

pub async fn autopilot_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.autopilot.snapshot()))
}

pub async fn autopilot_start(State(state): State<AppState>) -> Json<Value> {
    state.autopilot.start();
    Json(json!(state.autopilot.snapshot()))
}

pub async fn autopilot_stop(State(state): State<AppState>) -> Json<Value> {
    state.autopilot.stop();
    Json(json!(state.autopilot.snapshot()))
}

#[derive(Debug, Deserialize, Default)]
pub struct AuditListQuery {
    limit: Option<u32>,
}

pub async fn audit_list(State(state): State<AppState>, Query(q): Query<AuditListQuery>) -> ApiResult<Json<Value>> {
    let store = AuditStore::new(state.paths.audit_db());
    let entries = store.list(q.limit.unwrap_or(100))?;
    Ok(Json(json!(entries)))
}

#[derive(Debug, Deserialize)]
pub struct AuditRecordRequest {
    actor: String,
    action: String,
    #[serde(default)]
    detail: Value,
}

pub async fn audit_record(State(state): State<AppState>, Json(req): Json<AuditRecordRequest>) -> ApiResult<Json<Value>> {
    let store = AuditStore::new(state.paths.audit_db());
    let entry = store.record(&req.actor, &req.action, req.detail)?;
    Ok(Json(json!(entry)))
}

/// Strategy approval lives outside this system's core (an external planning
/// surface); these routes acknowledge the action without a backing store.
pub async fn strategy() -> Json<Value> {
    Json(json!({ "strategies": [] }))
}

pub async fn strategy_approve(Path(id): Path<String>) -> Json<Value> {
    Json(json!({ "id": id, "decision": "approved" }))
}

pub async fn strategy_dismiss(Path(id): Path<String>) -> Json<Value> {
    Json(json!({ "id": id, "decision": "dismissed" }))
}

pub async fn setup_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "initialized": state.paths.config_yaml().exists(),
        "root": state.paths.root(),
    }))
}

pub async fn setup_init(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.paths.ensure_skeleton().map_err(|err| LegioError::agent("setup", err.to_string()))?;
    if !state.paths.config_yaml().exists() {
        let yaml = legio_core::config::LegioConfig::default().to_yaml()?;
        std::fs::write(state.paths.config_yaml(), yaml).map_err(|err| LegioError::agent("setup", err.to_string()))?;
    }
    Ok(Json(json!({ "initialized": true })))
}
