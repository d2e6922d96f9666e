use anyhow::{bail, Result};
use chrono::Utc;
use legio_core::model::RunStatus;
use legio_core::paths::ProjectPaths;
use legio_core::store::SessionStore;

use crate::cli::RunCommands;
use crate::output;

pub fn run(cmd: RunCommands, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let sessions = SessionStore::new(paths.sessions_db(), paths.legacy_sessions_json());

    match cmd {
        RunCommands::List => {
            let runs = sessions.list_runs(None, 50)?;
            output::emit(&runs, json);
        }
        RunCommands::Show { id } => {
            let Some(found) = sessions.get_run(&id)? else {
                bail!("no run '{id}'");
            };
            output::emit(&found, json);
        }
        RunCommands::Complete { id } => {
            if sessions.get_run(&id)?.is_none() {
                bail!("no run '{id}'");
            }
            sessions.mark_ended(&id, RunStatus::Completed, Utc::now())?;
            output::emit(&serde_json::json!({ "completed": id }), json);
        }
    }
    Ok(())
}
