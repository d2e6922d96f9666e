//! Invariant 9 (monotonically increasing event ids, timeline ordering) and
//! the session/run store's invariant 1 (active sessions exclude terminal
//! states) at the persistence layer.

use chrono::Utc;
use legio_core::model::{Event, EventLevel, EventType};
use legio_core::store::{EventFilter, EventStore};

fn event(run_id: &str, agent: &str, event_type: EventType) -> Event {
    Event {
        id: 0,
        timestamp: Utc::now(),
        run_id: run_id.to_string(),
        agent_name: agent.to_string(),
        session_id: format!("sess-{agent}"),
        event_type,
        tool_name: None,
        tool_args: None,
        tool_duration_ms: None,
        level: EventLevel::Info,
        data: None,
    }
}

#[test]
fn event_ids_are_monotonically_increasing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = EventStore::new(dir.path().join("events.db"));

    let mut ids = Vec::new();
    for _ in 0..10 {
        ids.push(store.insert(&event("run-1", "b1", EventType::ToolStart)).expect("insert"));
    }
    for window in ids.windows(2) {
        assert!(window[1] > window[0], "ids should strictly increase: {ids:?}");
    }
}

#[test]
fn no_event_appears_after_a_session_end_for_the_same_session_in_the_timeline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = EventStore::new(dir.path().join("events.db"));

    store.insert(&event("run-1", "b1", EventType::ToolStart)).expect("insert");
    store.insert(&event("run-1", "b1", EventType::ToolEnd)).expect("insert");
    let session_end_id = store.insert(&event("run-1", "b1", EventType::SessionEnd)).expect("insert");

    let timeline = store.get_timeline(&EventFilter::default()).expect("get_timeline");
    let session_end_index = timeline.iter().position(|e| e.id == session_end_id).expect("session_end present");
    let later_events_for_same_session: Vec<_> = timeline[session_end_index + 1..]
        .iter()
        .filter(|e| e.agent_name == "b1")
        .collect();
    assert!(later_events_for_same_session.is_empty());
}

#[test]
fn level_filter_excludes_other_levels() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = EventStore::new(dir.path().join("events.db"));

    let mut warn_event = event("run-1", "b1", EventType::Error);
    warn_event.level = EventLevel::Warn;
    store.insert(&warn_event).expect("insert warn");
    store.insert(&event("run-1", "b1", EventType::ToolStart)).expect("insert info");

    let warnings = store
        .get_timeline(&EventFilter {
            level: Some(EventLevel::Warn),
            ..Default::default()
        })
        .expect("get_timeline");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].level, EventLevel::Warn);
}
