use anyhow::Result;
use legio_core::config::LegioConfig;
use legio_core::paths::ProjectPaths;
use legio_core::worktree::WorktreeManager;

use crate::output;

#[allow(clippy::too_many_arguments)]
pub fn run(
    all: bool,
    mail: bool,
    sessions: bool,
    metrics: bool,
    logs: bool,
    worktrees: bool,
    branches: bool,
    agents: bool,
    specs: bool,
    json: bool,
) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let mut removed = Vec::new();

    if all || mail {
        if std::fs::remove_file(paths.mail_db()).is_ok() {
            removed.push("mail");
        }
    }
    if all || sessions {
        if std::fs::remove_file(paths.sessions_db()).is_ok() {
            removed.push("sessions");
        }
        let _ = std::fs::remove_file(paths.legacy_sessions_json());
        let _ = std::fs::remove_file(paths.current_run_txt());
    }
    if all || metrics {
        if std::fs::remove_file(paths.metrics_db()).is_ok() {
            removed.push("metrics");
        }
    }
    if all || logs {
        if std::fs::remove_dir_all(paths.legio_dir().join("logs")).is_ok() {
            removed.push("logs");
        }
    }
    if all || worktrees {
        let config = LegioConfig::load(&paths.config_yaml()).unwrap_or_default();
        let manager = WorktreeManager::new(paths.root(), config.worktrees.branch_prefix.clone());
        let cleaned = manager.clean(&[])?;
        if !cleaned.is_empty() {
            removed.push("worktrees");
        }
    }
    if all || branches {
        let config = LegioConfig::load(&paths.config_yaml()).unwrap_or_default();
        let output = std::process::Command::new("git")
            .args(["branch", "--list", &format!("{}*", config.worktrees.branch_prefix)])
            .current_dir(paths.root())
            .output()?;
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            let branch = line.trim().trim_start_matches("* ").trim();
            if branch.is_empty() {
                continue;
            }
            let _ = std::process::Command::new("git")
                .args(["branch", "-D", branch])
                .current_dir(paths.root())
                .status();
        }
        removed.push("branches");
    }
    if all || agents {
        if std::fs::remove_dir_all(paths.agent_defs_dir()).is_ok() {
            removed.push("agents");
        }
    }
    if all || specs {
        if std::fs::remove_dir_all(paths.legio_dir().join("specs")).is_ok() {
            removed.push("specs");
        }
    }

    output::emit(&serde_json::json!({ "removed": removed }), json);
    Ok(())
}
