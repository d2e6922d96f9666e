//! The orchestrator registration file (`orchestrator-tmux.json`): the one
//! piece of process-wide state persisted to disk so that an out-of-process
//! `legio down` or `legio autopilot` can find the running orchestrator,
//! whichever of `up` (bare process) or `coordinator` (tmux session) is
//! hosting it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub tmux_session: Option<String>,
    pub pid: i32,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub registered_at: DateTime<Utc>,
}

pub fn read(path: &std::path::Path) -> Option<Registration> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

pub fn write(path: &std::path::Path, registration: &Registration) -> anyhow::Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(registration)?)?;
    Ok(())
}
