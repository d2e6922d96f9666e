use std::time::Duration;

use anyhow::Result;
use legio_core::config::LegioConfig;
use legio_core::paths::ProjectPaths;
use legio_server::AppState;

use crate::output;

pub fn read_snapshot(paths: &ProjectPaths) -> serde_json::Value {
    let config = LegioConfig::load(&paths.config_yaml()).unwrap_or_default();
    let state = AppState::new(paths.clone(), config);
    legio_server::snapshot::build(&state)
}

pub fn run(follow: bool, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);

    output::emit(&read_snapshot(&paths), json);
    if !follow {
        return Ok(());
    }
    loop {
        std::thread::sleep(Duration::from_secs(2));
        output::emit(&read_snapshot(&paths), json);
    }
}
