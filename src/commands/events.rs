use anyhow::Result;
use legio_core::paths::ProjectPaths;
use legio_core::store::{EventFilter, EventStore};

use crate::output;

/// `legio events`: timeline with no filters, alias for `legio logs` bare.
pub fn run(json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let store = EventStore::new(paths.events_db());
    let events = store.get_timeline(&EventFilter::default())?;
    output::emit(&events, json);
    Ok(())
}
