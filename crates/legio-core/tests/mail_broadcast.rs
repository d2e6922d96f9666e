//! S1 (broadcast to capability group) and the mail round-trip/idempotence
//! properties, exercised against a real `MailStore` rather than the pure
//! `resolve_group_address` unit tests in `src/mail.rs`.

use chrono::Utc;
use legio_core::mail::resolve_group_address;
use legio_core::model::{AgentSession, Capability, MailMessage, MailType, Priority, SessionState};
use legio_core::store::{MailFilter, MailStore};

fn session(name: &str, capability: Capability) -> AgentSession {
    AgentSession {
        id: format!("sess-{name}"),
        agent_name: name.to_string(),
        capability,
        worktree_path: String::new(),
        branch: String::new(),
        task_id: String::new(),
        tmux_session: String::new(),
        state: SessionState::Working,
        root_pid: None,
        parent_agent: None,
        depth: 0,
        run_id: "run-1".into(),
        started_at: Utc::now(),
        last_activity: Utc::now(),
        stalled_since: None,
        escalation_level: 0,
    }
}

fn broadcast_message(from: &str, to: &str, thread_id: Option<String>) -> MailMessage {
    MailMessage {
        id: String::new(),
        from: from.to_string(),
        to: to.to_string(),
        subject: "build".into(),
        body: "start building".into(),
        mail_type: MailType::Dispatch,
        priority: Priority::Normal,
        thread_id,
        payload: None,
        read: false,
        created_at: Utc::now(),
    }
}

#[test]
fn broadcast_to_capability_group_inserts_one_message_per_recipient_sharing_a_thread() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MailStore::new(dir.path().join("mail.db"));

    let sessions = vec![
        session("b1", Capability::Builder),
        session("b2", Capability::Builder),
        session("r1", Capability::Reviewer),
    ];
    let recipients = resolve_group_address("@builders", "orchestrator", &sessions).expect("resolve");
    assert_eq!(recipients.len(), 2);

    let thread_id = format!("thread-{}", legio_core::util::random_suffix(8));
    for recipient in &recipients {
        store
            .insert(&broadcast_message("orchestrator", recipient, Some(thread_id.clone())))
            .expect("insert");
    }

    let mut delivered: Vec<String> = recipients.clone();
    delivered.sort();
    assert_eq!(delivered, vec!["b1".to_string(), "b2".to_string()]);

    for recipient in &["b1", "b2"] {
        let unread = store.get_unread(recipient).expect("get_unread");
        assert_eq!(unread.len(), 1, "{recipient} should have exactly one unread message");
        assert_eq!(unread[0].thread_id.as_deref(), Some(thread_id.as_str()));
    }

    assert!(store.get_unread("r1").expect("get_unread").is_empty());
    assert!(store.get_unread("orchestrator").expect("get_unread").is_empty());

    let thread = store.get_by_thread(&thread_id).expect("get_by_thread");
    assert_eq!(thread.len(), 2);
}

#[test]
fn insert_then_get_preserves_every_attribute() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MailStore::new(dir.path().join("mail.db"));

    let message = MailMessage {
        id: String::new(),
        from: "scout-1".into(),
        to: "coordinator".into(),
        subject: "found something".into(),
        body: "details here".into(),
        mail_type: MailType::Result,
        priority: Priority::High,
        thread_id: Some("thread-abc".into()),
        payload: Some(serde_json::json!({"found": true})),
        read: false,
        created_at: Utc::now(),
    };
    let inserted = store.insert(&message).expect("insert");
    let fetched = store.get_by_id(&inserted.id).expect("get").expect("present");

    assert_eq!(fetched.from, message.from);
    assert_eq!(fetched.to, message.to);
    assert_eq!(fetched.subject, message.subject);
    assert_eq!(fetched.body, message.body);
    assert_eq!(fetched.mail_type, message.mail_type);
    assert_eq!(fetched.priority, message.priority);
    assert_eq!(fetched.thread_id, message.thread_id);
    assert_eq!(fetched.payload, message.payload);
    assert!(!fetched.read);
}

#[test]
fn marking_an_already_read_message_read_again_is_a_no_op() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MailStore::new(dir.path().join("mail.db"));
    let inserted = store.insert(&broadcast_message("a", "b", None)).expect("insert");

    store.mark_read(&inserted.id).expect("mark_read");
    let once = store.get_by_id(&inserted.id).expect("get").expect("present");
    store.mark_read(&inserted.id).expect("mark_read again");
    let twice = store.get_by_id(&inserted.id).expect("get").expect("present");

    assert!(once.read);
    assert!(twice.read);
}

#[test]
fn unread_only_filter_excludes_read_messages() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MailStore::new(dir.path().join("mail.db"));

    let first = store.insert(&broadcast_message("a", "b", None)).expect("insert");
    store.insert(&broadcast_message("a", "b", None)).expect("insert");
    store.mark_read(&first.id).expect("mark_read");

    let unread = store
        .get_all(&MailFilter {
            to: Some("b".into()),
            unread_only: true,
            ..Default::default()
        })
        .expect("get_all");
    assert_eq!(unread.len(), 1);
    assert_ne!(unread[0].id, first.id);
}

#[test]
fn group_address_with_no_matching_active_sessions_fails_validation() {
    let sessions = vec![session("r1", Capability::Reviewer)];
    let err = resolve_group_address("@scouts", "orchestrator", &sessions).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("zero recipients"), "unexpected message: {message}");
}
