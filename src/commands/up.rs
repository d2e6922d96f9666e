use anyhow::{bail, Result};
use legio_core::config::LegioConfig;
use legio_core::paths::ProjectPaths;
use legio_core::proc::process_alive;
use legio_server::AppState;

use super::loops;
use super::registration::{self, Registration};

pub fn run(port: u16, host: String, no_open: bool, force: bool, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    if !paths.config_yaml().exists() {
        bail!("no .legio/config.yaml here; run `legio init` first");
    }

    let info_path = paths.orchestrator_tmux_json();
    if let Some(existing) = registration::read(&info_path) {
        if process_alive(existing.pid) && !force {
            bail!("legio is already running (pid {}); pass --force to replace it", existing.pid);
        }
    }

    let config = LegioConfig::load(&paths.config_yaml())?;
    let info = Registration {
        tmux_session: None,
        pid: std::process::id() as i32,
        port: Some(port),
        host: Some(host.clone()),
        registered_at: chrono::Utc::now(),
    };
    registration::write(&info_path, &info)?;

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let result = runtime.block_on(serve(paths.clone(), config, port, host, no_open, json));
    let _ = std::fs::remove_file(&info_path);
    result
}

async fn serve(
    paths: ProjectPaths,
    config: LegioConfig,
    port: u16,
    host: String,
    no_open: bool,
    json: bool,
) -> Result<()> {
    let state = AppState::new(paths, config);
    let (shutdown_tx, broadcaster_handle) = legio_server::spawn_broadcaster(state.clone());

    let watchdog_paths = state.paths.as_ref().clone();
    let watchdog_config = state.config.as_ref().clone();
    let watchdog_handle = tokio::task::spawn_blocking(move || loops::watchdog_loop(watchdog_paths, watchdog_config));

    let autopilot = state.autopilot.clone();
    let autopilot_paths = state.paths.as_ref().clone();
    let autopilot_config = state.config.as_ref().clone();
    let autopilot_handle =
        tokio::task::spawn_blocking(move || loops::autopilot_loop(autopilot, autopilot_paths, autopilot_config));

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    crate::output::emit(&serde_json::json!({ "listening": addr, "opened_browser": !no_open }), json);

    let router = legio_server::build_router(state);
    let serve_result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    let _ = shutdown_tx.send(true);
    let _ = broadcaster_handle.await;
    watchdog_handle.abort();
    autopilot_handle.abort();

    serve_result.map_err(Into::into)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
