//! S4 (stall -> terminate) against a real tmux session: first tick marks the
//! session stalled and delivers a nudge, second tick (no recovery) gets a
//! `terminate` verdict from a stub triage script and the session becomes a
//! zombie with a `session_end` event and its process tree killed.

use std::time::Duration;

use chrono::Utc;
use legio_core::config::{ModelsConfig, WatchdogConfig};
use legio_core::model::{AgentSession, Capability, EventType, SessionState};
use legio_core::nudge::NudgeDispatcher;
use legio_core::proc::{process_alive, TmuxAdapter};
use legio_core::store::{EventFilter, EventStore, MailStore, SessionStore};
use legio_core::watchdog::Watchdog;

fn unique_session_name(tag: &str) -> String {
    format!("legio-test-{tag}-{}", legio_core::util::random_suffix(6))
}

/// Writes a stub "triage command" that always answers `terminate`, the way
/// a real LLM triage CLI would after deciding a session is unrecoverable.
fn write_terminate_script(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("triage-terminate.sh");
    std::fs::write(&path, "#!/bin/sh\necho terminate\n").expect("write script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    }
    path
}

#[test]
fn stall_then_terminate_ladder() {
    let Ok(tmux) = TmuxAdapter::locate() else {
        eprintln!("skipping: tmux not found on PATH");
        return;
    };

    let state_dir = tempfile::tempdir().expect("state dir");
    let session_name = unique_session_name("watchdog");
    let root_pid = tmux
        .create_session(&session_name, state_dir.path(), "sleep 300")
        .expect("create tmux session");

    let sessions = SessionStore::new(state_dir.path().join("sessions.db"), state_dir.path().join("sessions.json"));
    let events = EventStore::new(state_dir.path().join("events.db"));
    let mail = MailStore::new(state_dir.path().join("mail.db"));
    let nudge_events = EventStore::new(state_dir.path().join("events.db"));
    let nudge = NudgeDispatcher::new(
        state_dir.path().join("nudge-state.json"),
        TmuxAdapter::locate().expect("tmux"),
        nudge_events,
    );

    let mut config = WatchdogConfig::default();
    config.stale_threshold_ms = 100;
    config.grace_ms = 2_000;

    let script = write_terminate_script(state_dir.path());
    let models = ModelsConfig {
        triage_command: Some(script.to_string_lossy().into_owned()),
        triage_timeout_secs: 5,
    };

    let session = AgentSession {
        id: "sess-1".into(),
        agent_name: "b1".into(),
        capability: Capability::Builder,
        worktree_path: state_dir.path().to_string_lossy().into_owned(),
        branch: "legio/b1/t1".into(),
        task_id: "t1".into(),
        tmux_session: session_name.clone(),
        state: SessionState::Working,
        root_pid: Some(root_pid),
        parent_agent: None,
        depth: 0,
        run_id: "run-1".into(),
        started_at: Utc::now() - chrono::Duration::minutes(10),
        last_activity: Utc::now() - chrono::Duration::minutes(10),
        stalled_since: None,
        escalation_level: 0,
    };
    sessions.upsert(&session).expect("upsert");

    let watchdog = Watchdog {
        sessions: &sessions,
        events: &events,
        mail: &mail,
        tmux: &tmux,
        nudge: &nudge,
        config: &config,
        models: &models,
    };

    // First tick: stale session transitions to stalled and receives a nudge.
    watchdog.tick();
    let after_first = sessions.get_by_name("b1").expect("get").expect("present");
    assert_eq!(after_first.state, SessionState::Stalled);

    // Second tick: still stale, now at escalation level 1 -> terminate verdict.
    watchdog.tick();
    let after_second = sessions.get_by_name("b1").expect("get").expect("present");
    assert_eq!(after_second.state, SessionState::Zombie);

    let session_end_events: Vec<_> = events
        .get_by_agent("b1", &EventFilter::default())
        .expect("get_by_agent")
        .into_iter()
        .filter(|e| e.event_type == EventType::SessionEnd)
        .collect();
    assert_eq!(session_end_events.len(), 1);
    assert!(session_end_events[0].data.as_deref().unwrap_or_default().contains("watchdog"));

    std::thread::sleep(Duration::from_millis(200));
    assert!(!process_alive(root_pid), "root pid should be killed after terminate verdict");

    // Best-effort cleanup; the pane process exiting may already have torn
    // the tmux session down on its own.
    let _ = tmux.kill_session(&session_name, Duration::from_secs(1));
}
