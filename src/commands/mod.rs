mod agents;
mod autopilot;
mod clean;
mod coordinator;
mod costs;
mod doctor;
mod down;
mod events;
mod feed;
mod hook;
mod hooks;
mod init;
mod inspect;
mod logs;
mod loops;
mod mail;
mod merge;
mod nudge;
mod prime;
mod registration;
mod run;
mod sling;
mod status;
mod trace;
mod up;
mod worktree;

pub use agents::run as agents_run;
pub use autopilot::run as autopilot_run;
pub use clean::run as clean_run;
pub use coordinator::internal_loop as coordinator_internal_loop;
pub use coordinator::run as coordinator_run;
pub use costs::run as costs_run;
pub use doctor::run as doctor_run;
pub use down::run as down_run;
pub use events::run as events_run;
pub use feed::run as feed_run;
pub use hook::run as hook_run;
pub use hooks::run as hooks_run;
pub use init::run as init_run;
pub use inspect::run as inspect_run;
pub use logs::run as logs_run;
pub use mail::run as mail_run;
pub use merge::run as merge_run;
pub use nudge::run as nudge_run;
pub use prime::run as prime_run;
pub use run::run as run_run;
pub use sling::run as sling_run;
pub use status::run as status_run;
pub use trace::run as trace_run;
pub use up::run as up_run;
pub use worktree::run as worktree_run;

use legio_core::paths::ProjectPaths;
use legio_core::config::LegioConfig;

/// Resolves the project root and loads its config, defaulting when
/// `.legio/config.yaml` does not exist yet (commands that don't need a
/// scaffolded project, like `init`, load it themselves).
pub fn project(cwd: &std::path::Path) -> anyhow::Result<(ProjectPaths, LegioConfig)> {
    let paths = ProjectPaths::discover(cwd);
    let config = if paths.config_yaml().exists() {
        LegioConfig::load(&paths.config_yaml())?
    } else {
        LegioConfig::default()
    };
    Ok((paths, config))
}
