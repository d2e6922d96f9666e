//! §4.J Nudge dispatcher: delivers text into a live agent session with
//! debounce and retry.

use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LegioResult;
use crate::model::{Event, EventLevel, EventType};
use crate::proc::TmuxAdapter;
use crate::store::EventStore;

const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);
const MAX_RETRIES: u32 = 3;
const RETRY_SPACING: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct DebounceState {
    last_nudge_at: std::collections::HashMap<String, DateTime<Utc>>,
}

/// Outcome of a nudge attempt.
#[derive(Debug, Clone, Serialize)]
pub struct NudgeResult {
    pub delivered: bool,
    pub reason: Option<String>,
}

pub struct NudgeDispatcher {
    state_path: PathBuf,
    tmux: TmuxAdapter,
    events: EventStore,
}

impl NudgeDispatcher {
    #[must_use]
    pub fn new(state_path: PathBuf, tmux: TmuxAdapter, events: EventStore) -> Self {
        Self {
            state_path,
            tmux,
            events,
        }
    }

    fn load_state(&self) -> DebounceState {
        std::fs::read_to_string(&self.state_path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    fn save_state(&self, state: &DebounceState) -> LegioResult<()> {
        if let Some(parent) = self.state_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(state).unwrap_or_default();
        std::fs::write(&self.state_path, text)?;
        Ok(())
    }

    /// Sends `text` into `session_name`'s interactive session. Returns
    /// `{delivered, reason}` per §4.J; event-store writes are fire-and-forget
    /// and never affect the return value.
    pub fn nudge(&self, agent_name: &str, session_name: &str, text: &str, force: bool) -> NudgeResult {
        let mut state = self.load_state();
        if !force {
            if let Some(last) = state.last_nudge_at.get(agent_name) {
                if Utc::now().signed_duration_since(*last).num_milliseconds()
                    < i64::try_from(DEBOUNCE_WINDOW.as_millis()).unwrap_or(i64::MAX)
                {
                    return NudgeResult {
                        delivered: false,
                        reason: Some("debounced".into()),
                    };
                }
            }
        }

        match self.tmux.has_session(session_name) {
            Ok(false) => {
                return NudgeResult {
                    delivered: false,
                    reason: Some("session not live".into()),
                }
            }
            Err(err) => {
                return NudgeResult {
                    delivered: false,
                    reason: Some(err.to_string()),
                }
            }
            Ok(true) => {}
        }

        let mut last_err = None;
        for attempt in 0..MAX_RETRIES {
            match self.tmux.send_keys(session_name, text) {
                Ok(()) => {
                    state.last_nudge_at.insert(agent_name.to_string(), Utc::now());
                    let _ = self.save_state(&state);
                    self.emit_nudge_event(agent_name);
                    return NudgeResult {
                        delivered: true,
                        reason: None,
                    };
                }
                Err(err) => {
                    last_err = Some(err.to_string());
                    if attempt + 1 < MAX_RETRIES {
                        sleep(RETRY_SPACING);
                    }
                }
            }
        }
        NudgeResult {
            delivered: false,
            reason: last_err,
        }
    }

    fn emit_nudge_event(&self, agent_name: &str) {
        let event = Event {
            id: 0,
            timestamp: Utc::now(),
            run_id: String::new(),
            agent_name: agent_name.to_string(),
            session_id: String::new(),
            event_type: EventType::Custom,
            tool_name: None,
            tool_args: None,
            tool_duration_ms: None,
            level: EventLevel::Info,
            data: Some(serde_json::json!({"kind": "nudge"}).to_string()),
        };
        let _ = self.events.insert(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debounce_window_blocks_second_nudge_within_window() {
        let mut state = DebounceState::default();
        state.last_nudge_at.insert("b1".into(), Utc::now());
        let elapsed = Utc::now().signed_duration_since(state.last_nudge_at["b1"]).num_milliseconds();
        assert!(elapsed < DEBOUNCE_WINDOW.as_millis() as i64 + 50);
    }
}
