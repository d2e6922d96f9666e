//! Process-wide server state (§5 "Shared resources"): the autopilot
//! instance, the tmux adapter, and the broadcaster's client registry. Stores
//! themselves are never held here — each handler opens what it needs.

use std::sync::Arc;

use legio_core::autopilot::Autopilot;
use legio_core::config::LegioConfig;
use legio_core::paths::ProjectPaths;
use legio_core::proc::TmuxAdapter;

use crate::broadcaster::Broadcaster;

#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<ProjectPaths>,
    pub config: Arc<LegioConfig>,
    pub autopilot: Arc<Autopilot>,
    pub tmux: Arc<Option<TmuxAdapter>>,
    pub broadcaster: Arc<Broadcaster>,
}

impl AppState {
    #[must_use]
    pub fn new(paths: ProjectPaths, config: LegioConfig) -> Self {
        let autopilot = Arc::new(Autopilot::new(config.autopilot.clone()));
        let tmux = Arc::new(TmuxAdapter::locate().ok());
        Self {
            paths: Arc::new(paths),
            config: Arc::new(config),
            autopilot,
            tmux,
            broadcaster: Arc::new(Broadcaster::new()),
        }
    }
}
