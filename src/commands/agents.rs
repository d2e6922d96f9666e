use anyhow::Result;
use legio_core::model::Capability;
use legio_core::paths::ProjectPaths;
use legio_core::store::SessionStore;

use crate::output;

pub fn run(capability: Option<String>, all: bool, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);

    let wanted: Option<Capability> = capability.map(|c| c.parse()).transpose()?;

    if all {
        let names: Vec<&str> = Capability::ALL
            .iter()
            .filter(|c| wanted.map_or(true, |w| w == **c))
            .map(Capability::as_str)
            .collect();
        output::emit(&names, json);
        return Ok(());
    }

    let sessions = SessionStore::new(paths.sessions_db(), paths.legacy_sessions_json());
    let active = sessions.get_active()?;
    let matching: Vec<_> = active
        .into_iter()
        .filter(|s| wanted.map_or(true, |w| w == s.capability))
        .collect();
    output::emit(&matching, json);
    Ok(())
}
