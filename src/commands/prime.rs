use anyhow::{bail, Result};
use legio_core::paths::ProjectPaths;
use legio_core::store::SessionStore;

use crate::output;

pub fn run(agent: Option<String>, compact: bool, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);

    let agent_name = match agent {
        Some(name) => name,
        None => {
            let sessions = SessionStore::new(paths.sessions_db(), paths.legacy_sessions_json());
            let active = sessions.get_active()?;
            match active.len() {
                0 => bail!("no active agent sessions; pass --agent explicitly"),
                1 => active[0].agent_name.clone(),
                _ => bail!("multiple active sessions; pass --agent to pick one"),
            }
        }
    };

    let overlay_path = paths.worktree_dir(&agent_name).join("LEGIO_OVERLAY.md");
    let overlay = std::fs::read_to_string(&overlay_path)
        .map_err(|_| anyhow::anyhow!("no overlay found for agent '{agent_name}' at {}", overlay_path.display()))?;

    let checkpoint = if compact {
        std::fs::read_to_string(paths.checkpoint_json(&agent_name)).ok()
    } else {
        None
    };

    output::emit(
        &serde_json::json!({ "agent": agent_name, "overlay": overlay, "checkpoint": checkpoint }),
        json,
    );
    Ok(())
}
