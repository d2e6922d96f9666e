//! §4.M Observability broadcaster: a shared client registry and a ticker
//! that diffs the serialised snapshot against the previous one, skipping a
//! broadcast when nothing changed.

use std::sync::Mutex;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use serde_json::json;
use tokio::sync::mpsc;

type ClientSink = SplitSink<WebSocket, Message>;

pub struct Broadcaster {
    clients: Mutex<Vec<mpsc::UnboundedSender<String>>>,
    last_snapshot: Mutex<Option<String>>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(Vec::new()),
            last_snapshot: Mutex::new(None),
        }
    }

    pub fn register(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.lock().expect("broadcaster client list poisoned").push(tx);
        rx
    }

    /// Sends `frame` to every client, dropping any whose channel is closed.
    fn send_to_all(&self, frame: &str) {
        let mut clients = self.clients.lock().expect("broadcaster client list poisoned");
        clients.retain(|tx| tx.send(frame.to_string()).is_ok());
    }

    /// Forces a re-send of the current snapshot to every client, bypassing
    /// the unchanged-skip (used for `{type:"refresh"}`).
    pub fn force_resend(&self, snapshot: serde_json::Value) {
        let frame = frame(snapshot);
        self.send_to_all(&frame);
    }

    /// One tick: compare the serialised snapshot against the cached one;
    /// broadcast only on change.
    pub fn tick(&self, snapshot: serde_json::Value) {
        let data_text = snapshot.to_string();
        let mut last = self.last_snapshot.lock().expect("broadcaster snapshot cache poisoned");
        if last.as_deref() == Some(data_text.as_str()) {
            return;
        }
        *last = Some(data_text);
        drop(last);
        self.send_to_all(&frame(snapshot));
    }
}

fn frame(data: serde_json::Value) -> String {
    json!({
        "type": "snapshot",
        "data": data,
        "timestamp": Utc::now().to_rfc3339(),
    })
    .to_string()
}

/// Runs the 2s (configurable) ticker until `shutdown` fires.
pub async fn run_ticker(
    state: crate::state::AppState,
    interval: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = crate::snapshot::build(&state);
                state.broadcaster.tick(snapshot);
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

/// Pumps one client's outbound queue into its WebSocket sink.
pub async fn pump(mut sink: ClientSink, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(frame) = rx.recv().await {
        if sink.send(Message::Text(frame.into())).await.is_err() {
            break;
        }
    }
}
