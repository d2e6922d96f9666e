use anyhow::Result;
use legio_core::config::LegioConfig;
use legio_core::paths::ProjectPaths;
use legio_core::store::SessionStore;
use legio_core::worktree::WorktreeManager;

use crate::cli::WorktreeCommands;
use crate::output;

pub fn run(cmd: WorktreeCommands, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let config = LegioConfig::load(&paths.config_yaml()).unwrap_or_default();
    let manager = WorktreeManager::new(paths.root(), config.worktrees.branch_prefix.clone());

    match cmd {
        WorktreeCommands::List => {
            let entries = manager.list()?;
            output::emit(&entries, json);
        }
        WorktreeCommands::Clean => {
            let sessions = SessionStore::new(paths.sessions_db(), paths.legacy_sessions_json());
            let live_names: Vec<String> = sessions.get_active()?.into_iter().map(|s| s.agent_name).collect();
            let removed = manager.clean(&live_names)?;
            output::emit(&serde_json::json!({ "removed": removed }), json);
        }
    }
    Ok(())
}
