use std::time::Duration;

use anyhow::{bail, Result};
use legio_core::paths::ProjectPaths;
use legio_core::proc::{kill_session_tree, process_alive, TmuxAdapter};

use super::registration;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let info_path = paths.orchestrator_tmux_json();

    let Some(info) = registration::read(&info_path) else {
        bail!("no running legio instance found for this project");
    };

    if let Some(session) = &info.tmux_session {
        let tmux = TmuxAdapter::locate()?;
        let outcome = tmux.kill_session(session, Duration::from_secs(5))?;
        let _ = std::fs::remove_file(&info_path);
        output::emit(&serde_json::json!({ "stopped": true, "terminated": outcome.terminated }), json);
        return Ok(());
    }

    if !process_alive(info.pid) {
        let _ = std::fs::remove_file(&info_path);
        bail!("recorded legio process (pid {}) is already gone", info.pid);
    }

    let outcome = kill_session_tree(info.pid, Duration::from_secs(5));
    let _ = std::fs::remove_file(&info_path);

    output::emit(
        &serde_json::json!({ "stopped": true, "terminated": outcome.terminated, "hard_killed": outcome.hard_killed }),
        json,
    );
    Ok(())
}
