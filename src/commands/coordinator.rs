use anyhow::{bail, Result};
use chrono::Utc;
use legio_core::config::LegioConfig;
use legio_core::paths::ProjectPaths;
use legio_core::proc::TmuxAdapter;

use super::loops;
use super::registration::{self, Registration};
use crate::cli::CoordinatorCommands;
use crate::output;

const COORDINATOR_SESSION: &str = "legio-coordinator";

pub fn run(cmd: CoordinatorCommands, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);

    match cmd {
        CoordinatorCommands::Start { attach, watchdog, monitor } => start(&paths, attach, watchdog, monitor, json),
        CoordinatorCommands::Stop => stop(&paths, json),
        CoordinatorCommands::Status => status(&paths, json),
    }
}

fn start(paths: &ProjectPaths, attach: bool, watchdog: bool, monitor: bool, json: bool) -> Result<()> {
    if !paths.config_yaml().exists() {
        bail!("no .legio/config.yaml here; run `legio init` first");
    }
    let reg_path = paths.orchestrator_tmux_json();
    let tmux = TmuxAdapter::locate()?;
    if let Some(existing) = registration::read(&reg_path) {
        if let Some(session) = &existing.tmux_session {
            if tmux.has_session(session).unwrap_or(false) {
                bail!("coordinator already running in tmux session '{session}'");
            }
        }
    }

    let mut launch = String::from("legio hidden-internal-loop");
    if watchdog {
        launch.push_str(" --watchdog");
    }
    if monitor {
        launch.push_str(" --monitor");
    }
    let root_pid = tmux.create_session(COORDINATOR_SESSION, paths.root(), &launch)?;

    let info = Registration {
        tmux_session: Some(COORDINATOR_SESSION.to_string()),
        pid: root_pid,
        port: None,
        host: None,
        registered_at: Utc::now(),
    };
    registration::write(&reg_path, &info)?;

    output::emit(&serde_json::json!({ "started": true, "tmux_session": COORDINATOR_SESSION }), json);

    if attach {
        std::process::Command::new("tmux").args(["attach", "-t", COORDINATOR_SESSION]).status()?;
    }
    Ok(())
}

fn stop(paths: &ProjectPaths, json: bool) -> Result<()> {
    let reg_path = paths.orchestrator_tmux_json();
    let Some(info) = registration::read(&reg_path) else {
        bail!("no coordinator registered for this project");
    };
    let Some(session) = info.tmux_session else {
        bail!("registered orchestrator is not a coordinator session; use `legio down` instead");
    };
    let tmux = TmuxAdapter::locate()?;
    let outcome = tmux.kill_session(&session, std::time::Duration::from_secs(5))?;
    let _ = std::fs::remove_file(&reg_path);
    output::emit(&serde_json::json!({ "stopped": true, "terminated": outcome.terminated }), json);
    Ok(())
}

fn status(paths: &ProjectPaths, json: bool) -> Result<()> {
    let reg_path = paths.orchestrator_tmux_json();
    let Some(info) = registration::read(&reg_path) else {
        output::emit(&serde_json::json!({ "running": false }), json);
        return Ok(());
    };
    let alive = match &info.tmux_session {
        Some(session) => TmuxAdapter::locate().map(|t| t.has_session(session).unwrap_or(false)).unwrap_or(false),
        None => false,
    };
    output::emit(&serde_json::json!({ "running": alive, "registration": info }), json);
    Ok(())
}

/// Entry point for the hidden internal-loop command run inside the
/// coordinator's tmux session: blocks forever ticking the watchdog and/or
/// autopilot, optionally printing the observability snapshot to its log.
pub fn internal_loop(watchdog: bool, monitor: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let config = LegioConfig::load(&paths.config_yaml())?;

    if monitor {
        let monitor_paths = paths.clone();
        std::thread::spawn(move || loop {
            let snapshot = crate::commands::feed::read_snapshot(&monitor_paths);
            println!("{}", serde_json::to_string(&snapshot).unwrap_or_default());
            std::thread::sleep(std::time::Duration::from_secs(2));
        });
    }

    if watchdog {
        let watchdog_paths = paths.clone();
        let watchdog_config = config.clone();
        std::thread::spawn(move || loops::watchdog_loop(watchdog_paths, watchdog_config));
    }

    let autopilot = std::sync::Arc::new(legio_core::autopilot::Autopilot::new(config.autopilot.clone()));
    autopilot.start();
    loops::autopilot_loop(autopilot, paths, config);
    Ok(())
}
