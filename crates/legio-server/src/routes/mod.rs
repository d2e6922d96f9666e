//! §6 HTTP/JSON API: one module per resource family, mounted under `/api`.

mod agents;
mod events;
mod mail;
mod merge_queue;
mod misc;
mod runs;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(misc::health))
        .route("/status", get(misc::status))
        .route("/config", get(misc::config))
        .route("/agents", get(agents::list))
        .route("/agents/active", get(agents::active))
        .route("/agents/{name}", get(agents::get_one))
        .route("/agents/{name}/inspect", get(agents::inspect))
        .route("/agents/{name}/events", get(agents::agent_events))
        .route("/mail", get(mail::list))
        .route("/mail/unread", get(mail::unread))
        .route("/mail/conversations", get(mail::conversations))
        .route("/mail/thread/{id}", get(mail::thread))
        .route("/mail/{id}", get(mail::get_one))
        .route("/mail/send", post(mail::send))
        .route("/events", get(events::timeline))
        .route("/events/errors", get(events::errors))
        .route("/events/tools", get(events::tool_stats))
        .route("/metrics", get(misc::metrics))
        .route("/metrics/snapshots", get(misc::metrics_snapshots))
        .route("/runs", get(runs::list))
        .route("/runs/active", get(runs::active))
        .route("/runs/{id}", get(runs::get_one))
        .route("/merge-queue", get(merge_queue::list))
        .route("/issues", get(misc::issues))
        .route("/issues/ready", get(misc::issues_ready))
        .route("/issues/{id}", get(misc::issue_one))
        .route("/terminal/capture", get(misc::terminal_capture))
        .route("/terminal/send", post(misc::terminal_send))
        .route("/autopilot/status", get(misc::autopilot_status))
        .route("/autopilot/start", post(misc::autopilot_start))
        .route("/autopilot/stop", post(misc::autopilot_stop))
        .route("/audit", get(misc::audit_list).post(misc::audit_record))
        .route("/strategy", get(misc::strategy))
        .route("/strategy/{id}/approve", post(misc::strategy_approve))
        .route("/strategy/{id}/dismiss", post(misc::strategy_dismiss))
        .route("/setup/status", get(misc::setup_status))
        .route("/setup/init", post(misc::setup_init))
}
