use anyhow::{bail, Result};
use legio_core::nudge::NudgeDispatcher;
use legio_core::paths::ProjectPaths;
use legio_core::proc::TmuxAdapter;
use legio_core::store::{EventStore, SessionStore};

use crate::output;

pub fn run(agent: String, message: Option<String>, from: Option<String>, force: bool, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let sessions = SessionStore::new(paths.sessions_db(), paths.legacy_sessions_json());

    let session = sessions
        .get_by_name(&agent)?
        .ok_or_else(|| anyhow::anyhow!("no session recorded for agent '{agent}'"))?;

    let tmux = TmuxAdapter::locate()?;
    let events = EventStore::new(paths.events_db());
    let dispatcher = NudgeDispatcher::new(paths.nudge_state_json(), tmux, events);

    let text = match (&message, &from) {
        (Some(m), Some(sender)) => format!("[{sender}] {m}"),
        (Some(m), None) => m.clone(),
        (None, _) => bail!("a nudge needs a message"),
    };

    let result = dispatcher.nudge(&agent, &session.tmux_session, &text, force);
    output::emit(&result, json);
    Ok(())
}
