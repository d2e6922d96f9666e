use axum::extract::{Query, State};
use axum::Json;
use legio_core::model::QueueStatus;
use legio_core::store::MergeQueueStore;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    status: Option<String>,
}

fn parse_status(raw: Option<&str>) -> Option<QueueStatus> {
    match raw?.to_ascii_lowercase().as_str() {
        "pending" => Some(QueueStatus::Pending),
        "merging" => Some(QueueStatus::Merging),
        "merged" => Some(QueueStatus::Merged),
        "failed" => Some(QueueStatus::Failed),
        "abandoned" => Some(QueueStatus::Abandoned),
        _ => None,
    }
}

pub async fn list(State(state): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Json<Value>> {
    let store = MergeQueueStore::new(state.paths.merge_queue_db());
    let entries = store.list(parse_status(q.status.as_deref()))?;
    Ok(Json(json!(entries)))
}
