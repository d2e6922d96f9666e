use anyhow::{bail, Result};
use legio_core::paths::ProjectPaths;

use super::registration;
use crate::cli::AutopilotCommands;
use crate::output;

fn server_base_url(paths: &ProjectPaths) -> Result<String> {
    let Some(info) = registration::read(&paths.orchestrator_tmux_json()) else {
        bail!("legio is not running here; start it with `legio up`");
    };
    let (Some(host), Some(port)) = (info.host, info.port) else {
        bail!("the registered orchestrator is a tmux coordinator with no HTTP server; run `legio up` to control autopilot remotely");
    };
    Ok(format!("http://{host}:{port}/api/autopilot"))
}

pub fn run(cmd: AutopilotCommands, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let base = server_base_url(&paths)?;
    let client = reqwest::blocking::Client::new();

    let response = match cmd {
        AutopilotCommands::Start => client.post(format!("{base}/start")).send()?,
        AutopilotCommands::Stop => client.post(format!("{base}/stop")).send()?,
        AutopilotCommands::Status => client.get(format!("{base}/status")).send()?,
    };

    if !response.status().is_success() {
        bail!("server returned {}", response.status());
    }
    let body: serde_json::Value = response.json()?;
    output::emit(&body, json);
    Ok(())
}
