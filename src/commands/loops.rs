//! Shared blocking tick loops for the watchdog and autopilot, reused by
//! `legio up` (spawned as tokio blocking tasks) and `legio coordinator`
//! (run directly inside a dedicated tmux session).

use std::time::Duration;

use legio_core::autopilot::Autopilot;
use legio_core::config::LegioConfig;
use legio_core::merge::conflict_history::ConflictHistoryStore;
use legio_core::merge::MergeResolver;
use legio_core::model::QueueStatus;
use legio_core::nudge::NudgeDispatcher;
use legio_core::paths::ProjectPaths;
use legio_core::proc::TmuxAdapter;
use legio_core::store::{EventStore, MailStore, MergeQueueStore, SessionStore};
use legio_core::watchdog::Watchdog;
use legio_core::worktree::WorktreeManager;

pub fn watchdog_tick(paths: &ProjectPaths, config: &LegioConfig) {
    let (Ok(tmux), Ok(nudge_tmux)) = (TmuxAdapter::locate(), TmuxAdapter::locate()) else {
        return;
    };
    let sessions = SessionStore::new(paths.sessions_db(), paths.legacy_sessions_json());
    let events = EventStore::new(paths.events_db());
    let mail = MailStore::new(paths.mail_db());
    let nudge = NudgeDispatcher::new(paths.nudge_state_json(), nudge_tmux, EventStore::new(paths.events_db()));
    let watchdog = Watchdog {
        sessions: &sessions,
        events: &events,
        mail: &mail,
        tmux: &tmux,
        nudge: &nudge,
        config: &config.watchdog,
        models: &config.models,
    };
    watchdog.tick();
}

pub fn watchdog_loop(paths: ProjectPaths, config: LegioConfig) {
    loop {
        watchdog_tick(&paths, &config);
        std::thread::sleep(Duration::from_millis(config.watchdog.tier0_interval_ms));
    }
}

pub fn autopilot_tick(autopilot: &Autopilot, paths: &ProjectPaths, config: &LegioConfig) {
    let mail = MailStore::new(paths.mail_db());
    let queue = MergeQueueStore::new(paths.merge_queue_db());
    let history = ConflictHistoryStore::new(paths.merge_queue_db());
    let resolver = MergeResolver {
        repo_root: paths.root().to_path_buf(),
        queue: &queue,
        history: &history,
        mail: &mail,
        reimagine_command: config.merge.reimagine_command.clone(),
        reimagine_timeout: Duration::from_secs(config.merge.reimagine_timeout_secs),
    };
    let worktrees = WorktreeManager::new(paths.root(), config.worktrees.branch_prefix.clone());
    let entries = queue.list(Some(QueueStatus::Pending)).unwrap_or_default();
    let branches: Vec<String> = entries.into_iter().map(|e| e.branch).collect();
    autopilot.tick(&mail, &resolver, &config.project.canonical_branch, Some((&worktrees, &branches)));
}

pub fn autopilot_loop(autopilot: std::sync::Arc<Autopilot>, paths: ProjectPaths, config: LegioConfig) {
    loop {
        if autopilot.is_running() {
            autopilot_tick(&autopilot, &paths, &config);
        }
        std::thread::sleep(Duration::from_millis(config.autopilot.tick_interval_ms));
    }
}
