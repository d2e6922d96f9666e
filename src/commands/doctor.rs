use anyhow::Result;
use legio_core::paths::ProjectPaths;

use crate::output;

pub fn run(json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);

    let git_ok = which::which("git").is_ok();
    let tmux_ok = which::which("tmux").is_ok();
    let in_git_repo = cwd.join(".git").exists() || std::process::Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(&cwd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    let scaffolded = paths.config_yaml().exists();

    let checks = serde_json::json!({
        "git": git_ok,
        "tmux": tmux_ok,
        "in_git_repository": in_git_repo,
        "legio_scaffolded": scaffolded,
    });

    let ok = git_ok && tmux_ok && in_git_repo && scaffolded;
    output::emit(&serde_json::json!({ "ok": ok, "checks": checks }), json);
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
