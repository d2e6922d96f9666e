use std::time::Duration;

use anyhow::Result;
use legio_core::paths::ProjectPaths;
use legio_core::proc::TmuxAdapter;
use legio_core::store::SessionStore;

use crate::output;

pub fn run(agent: String, follow: bool, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let sessions = SessionStore::new(paths.sessions_db(), paths.legacy_sessions_json());

    let session = sessions
        .get_by_name(&agent)?
        .ok_or_else(|| anyhow::anyhow!("no session recorded for agent '{agent}'"))?;

    let tmux = TmuxAdapter::locate().ok();

    loop {
        let terminal = tmux.as_ref().and_then(|t| t.capture(&session.tmux_session, 200).ok());
        output::emit(&serde_json::json!({ "session": &session, "terminal": terminal }), json);
        if !follow {
            break;
        }
        std::thread::sleep(Duration::from_secs(2));
    }
    Ok(())
}
