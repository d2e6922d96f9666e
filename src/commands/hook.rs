use std::io::Read;

use anyhow::Result;
use chrono::Utc;
use legio_core::model::{Event, EventLevel, EventType};
use legio_core::paths::ProjectPaths;
use legio_core::store::EventStore;
use serde::Deserialize;
use serde_json::Value;

use crate::cli::HookCommands;

#[derive(Debug, Default, Deserialize)]
struct HookPayload {
    #[serde(default)]
    run_id: String,
    #[serde(default)]
    agent_name: String,
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    tool_input: Option<Value>,
    #[serde(default)]
    duration_ms: Option<i64>,
}

/// Dangerous git subcommands a `PreToolUse` Bash hook blocks outright.
const BLOCKED_GIT_ARGS: &[&str] = &["push --force", "push -f", "reset --hard", "clean -fdx", "branch -D"];

pub fn run(cmd: HookCommands) -> Result<()> {
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    let payload: HookPayload = serde_json::from_str(&raw).unwrap_or_default();

    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let events = EventStore::new(paths.events_db());

    let (event_type, level) = match cmd {
        HookCommands::SessionStart => (EventType::SessionStart, EventLevel::Info),
        HookCommands::UserPromptSubmit => (EventType::Custom, EventLevel::Info),
        HookCommands::PreToolUse => (EventType::ToolStart, EventLevel::Info),
        HookCommands::PostToolUse => (EventType::ToolEnd, EventLevel::Info),
        HookCommands::Stop => (EventType::SessionEnd, EventLevel::Info),
        HookCommands::PreCompact => (EventType::Custom, EventLevel::Info),
    };

    let _ = events.insert(&Event {
        id: 0,
        timestamp: Utc::now(),
        run_id: payload.run_id.clone(),
        agent_name: payload.agent_name.clone(),
        session_id: payload.session_id.clone(),
        event_type,
        tool_name: payload.tool_name.clone(),
        tool_args: payload.tool_input.as_ref().map(|v| v.to_string()),
        tool_duration_ms: payload.duration_ms,
        level,
        data: Some(raw),
    });

    if matches!(cmd, HookCommands::PreToolUse) {
        if let Some(reason) = blocked_reason(&payload) {
            println!("{}", serde_json::json!({ "decision": "block", "reason": reason }));
        }
    }

    Ok(())
}

fn blocked_reason(payload: &HookPayload) -> Option<String> {
    if payload.tool_name.as_deref() != Some("Bash") {
        return None;
    }
    let command = payload.tool_input.as_ref()?.get("command")?.as_str()?;
    BLOCKED_GIT_ARGS
        .iter()
        .find(|pattern| command.contains(**pattern))
        .map(|pattern| format!("blocked dangerous git operation matching '{pattern}'"))
}
