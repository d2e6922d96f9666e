use anyhow::{bail, Result};
use legio_core::model::AgentSession;
use legio_core::paths::ProjectPaths;
use legio_core::store::SessionStore;

use crate::output;

pub fn run(json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let sessions = SessionStore::new(paths.sessions_db(), paths.legacy_sessions_json());

    let Some(active_run) = sessions.get_active_run()? else {
        bail!("no active run");
    };
    let members = sessions.get_by_run(&active_run.id)?;

    if json {
        output::emit(&serde_json::json!({ "run": active_run, "agents": members }), true);
        return Ok(());
    }

    println!("run {} (started {})", active_run.id, active_run.started_at);
    let roots: Vec<&AgentSession> = members.iter().filter(|s| s.parent_agent.is_none()).collect();
    for root in roots {
        print_tree(root, &members, 0);
    }
    Ok(())
}

fn print_tree(session: &AgentSession, all: &[AgentSession], indent: usize) {
    let pad = "  ".repeat(indent);
    println!("{pad}{} [{:?}] {:?}", session.agent_name, session.capability, session.state);
    for child in all.iter().filter(|s| s.parent_agent.as_deref() == Some(session.agent_name.as_str())) {
        print_tree(child, all, indent + 1);
    }
}
