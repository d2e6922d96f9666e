//! §4.M snapshot aggregation: active sessions, recent mail + unread count,
//! merge queue, a metrics summary, the active run, and autopilot state.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use legio_core::model::QueueStatus;
use legio_core::store::{MailStore, MergeQueueStore, SessionStore};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MetricsSummary {
    pub total_sessions: u64,
    pub active_sessions: u64,
    pub average_duration_secs: f64,
}

/// Computes the live metrics digest (total sessions, active count, average
/// duration). There is no historical `metrics.db` writer in this system —
/// `metrics/snapshots` wraps a single point-in-time reading of this.
#[must_use]
pub fn metrics_summary(state: &AppState) -> MetricsSummary {
    let sessions = SessionStore::new(state.paths.sessions_db(), state.paths.legacy_sessions_json());
    let active_sessions = sessions.get_active().unwrap_or_default();
    let all_sessions = sessions.get_all().unwrap_or_default();

    let durations: Vec<i64> = all_sessions
        .iter()
        .filter_map(|s| {
            let end = s.stalled_since.unwrap_or_else(Utc::now);
            Some((end - s.started_at).num_seconds())
        })
        .collect();
    let average_duration_secs = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<i64>() as f64 / durations.len() as f64
    };

    MetricsSummary {
        total_sessions: all_sessions.len() as u64,
        active_sessions: active_sessions.len() as u64,
        average_duration_secs,
    }
}

/// Builds the point-in-time digest broadcast over `/ws`. Tolerates missing
/// store files by substituting empty collections instead of failing the
/// whole snapshot.
#[must_use]
pub fn build(state: &AppState) -> serde_json::Value {
    let sessions = SessionStore::new(state.paths.sessions_db(), state.paths.legacy_sessions_json());
    let mail = MailStore::new(state.paths.mail_db());
    let queue = MergeQueueStore::new(state.paths.merge_queue_db());

    let active_sessions = sessions.get_active().unwrap_or_default();
    let active_run = sessions.get_active_run().unwrap_or(None);

    let recent_mail = mail
        .get_all(&Default::default())
        .map(|mut all| {
            all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            all.into_iter().take(20).collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let unread_count = recent_mail.iter().filter(|m| !m.read).count();

    let queue_entries = queue.list(None).unwrap_or_default();

    let metrics = metrics_summary(state);

    json!({
        "active_sessions": active_sessions,
        "recent_mail": recent_mail,
        "unread_mail_count": unread_count,
        "merge_queue": queue_entries.into_iter().filter(|e| matches!(e.status, QueueStatus::Pending | QueueStatus::Merging)).collect::<Vec<_>>(),
        "metrics": metrics,
        "active_run": active_run,
        "autopilot": state.autopilot.snapshot(),
    })
}
