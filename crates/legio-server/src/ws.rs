//! §4.M/4.N `GET /ws` upgrade handler: sends the current snapshot on
//! connect, then streams subsequent snapshots as they change. Accepts
//! `{"type":"refresh"}` from the client to force an immediate re-send.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::StreamExt;
use serde::Deserialize;

use crate::state::AppState;

pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

#[derive(Debug, Deserialize)]
struct ClientMessage {
    #[serde(rename = "type")]
    kind: String,
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sink, mut recv) = socket.split();
    let rx = state.broadcaster.register();

    let initial = crate::snapshot::build(&state);
    state.broadcaster.force_resend(initial);

    let pump_task = tokio::spawn(crate::broadcaster::pump(sink, rx));

    while let Some(Ok(msg)) = recv.next().await {
        if let Message::Text(text) = msg {
            if let Ok(parsed) = serde_json::from_str::<ClientMessage>(&text) {
                if parsed.kind == "refresh" {
                    let snapshot = crate::snapshot::build(&state);
                    state.broadcaster.force_resend(snapshot);
                }
            }
        }
    }

    pump_task.abort();
}
