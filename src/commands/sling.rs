use anyhow::{bail, Result};
use chrono::Utc;
use legio_core::config::LegioConfig;
use legio_core::lifecycle::{Lifecycle, SpawnRequest};
use legio_core::model::{Capability, FileScope, Run, RunStatus};
use legio_core::paths::ProjectPaths;
use legio_core::proc::TmuxAdapter;
use legio_core::store::SessionStore;
use legio_core::util::random_suffix;
use legio_core::worktree::WorktreeManager;

use crate::output;

pub fn run(capability: String, task: String, parent: Option<String>, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    if !paths.config_yaml().exists() {
        bail!("no .legio/config.yaml here; run `legio init` first");
    }
    let config = LegioConfig::load(&paths.config_yaml())?;

    let capability: Capability = capability.parse()?;
    let sessions = SessionStore::new(paths.sessions_db(), paths.legacy_sessions_json());
    let tmux = TmuxAdapter::locate()?;
    let worktrees = WorktreeManager::new(paths.root(), config.worktrees.branch_prefix.clone());

    let (depth, active_siblings) = match &parent {
        Some(name) => {
            let parent_session = sessions
                .get_by_name(name)?
                .ok_or_else(|| anyhow::anyhow!("unknown parent agent '{name}'"))?;
            let siblings = sessions
                .get_active()?
                .iter()
                .filter(|s| s.parent_agent.as_deref() == Some(name.as_str()))
                .count();
            (parent_session.depth + 1, siblings)
        }
        None => (0, 0),
    };

    let run_id = current_or_new_run(&paths, &sessions)?;

    let request = SpawnRequest {
        capability,
        task_id: task.clone(),
        parent_agent: parent.clone(),
        depth,
        run_id,
        base_ref: config.project.canonical_branch.clone(),
        file_scope: FileScope::default(),
        activation_context: format!("Task: {task}"),
    };

    let lifecycle = Lifecycle {
        paths: &paths,
        sessions: &sessions,
        tmux: &tmux,
        worktrees: &worktrees,
        config: &config.agents,
    };

    let session = lifecycle.spawn(&request, active_siblings)?;
    output::emit(&session, json);
    Ok(())
}

fn current_or_new_run(paths: &ProjectPaths, sessions: &SessionStore) -> Result<String> {
    if let Ok(text) = std::fs::read_to_string(paths.current_run_txt()) {
        let id = text.trim();
        if !id.is_empty() && sessions.get_run(id)?.is_some() {
            return Ok(id.to_string());
        }
    }

    let id = format!("run-{}", random_suffix(8));
    sessions.create_run(&Run {
        id: id.clone(),
        started_at: Utc::now(),
        ended_at: None,
        coordinator_session_id: "cli".into(),
        status: RunStatus::Active,
    })?;
    std::fs::write(paths.current_run_txt(), &id)?;
    Ok(id)
}
