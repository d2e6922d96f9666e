use std::time::Duration;

use anyhow::Result;
use legio_core::paths::ProjectPaths;
use legio_core::store::EventStore;

use crate::output;

pub fn run(live: bool, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let store = EventStore::new(paths.events_db());

    if !live {
        let stats = store.get_tool_stats(None, None)?;
        output::emit(&stats, json);
        return Ok(());
    }

    loop {
        let stats = store.get_tool_stats(None, None)?;
        output::emit(&stats, json);
        std::thread::sleep(Duration::from_secs(3));
    }
}
