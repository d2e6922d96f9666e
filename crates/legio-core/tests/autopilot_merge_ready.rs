//! S3 (merge-ready autopilot): unread `merge_ready` mail addressed to
//! `coordinator`, `autoMerge=true`, one tick merges the queued branch and
//! marks the message read.

use std::process::Command;

use chrono::Utc;
use legio_core::autopilot::Autopilot;
use legio_core::config::AutopilotConfig;
use legio_core::merge::conflict_history::ConflictHistoryStore;
use legio_core::merge::MergeResolver;
use legio_core::model::{MailMessage, MailType, MergeQueueEntry, Priority, QueueStatus};
use legio_core::store::{MailStore, MergeQueueStore};
use legio_core::worktree::WorktreeManager;

fn git(dir: &std::path::Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("run git");
    assert!(status.success(), "git {args:?} failed");
}

/// A bare-bones repo with `main` and a feature branch that adds a new,
/// non-overlapping line to `file.txt` — guaranteed to clean-merge.
fn setup_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    git(root, &["init", "-q", "-b", "main"]);
    git(root, &["config", "user.email", "test@example.com"]);
    git(root, &["config", "user.name", "test"]);

    std::fs::write(root.join("file.txt"), "line one\n").expect("write file.txt");
    git(root, &["add", "."]);
    git(root, &["commit", "-q", "-m", "initial"]);

    git(root, &["checkout", "-q", "-b", "legio/b1/t1"]);
    std::fs::write(root.join("file.txt"), "line one\nline two\n").expect("write file.txt");
    git(root, &["commit", "-q", "-am", "add line two"]);
    git(root, &["checkout", "-q", "main"]);

    dir
}

#[test]
fn one_tick_merges_the_queued_branch_and_marks_mail_read() {
    let repo = setup_repo();
    let state_dir = tempfile::tempdir().expect("state dir");

    let mail = MailStore::new(state_dir.path().join("mail.db"));
    let queue = MergeQueueStore::new(state_dir.path().join("merge_queue.db"));
    let history = ConflictHistoryStore::new(state_dir.path().join("conflict_history.db"));

    queue
        .enqueue(&MergeQueueEntry {
            branch: "legio/b1/t1".into(),
            bead_id: "t1".into(),
            agent_name: "b1".into(),
            files_modified: vec!["file.txt".into()],
            enqueued_at: Utc::now(),
            status: QueueStatus::Pending,
            resolved_tier: None,
        })
        .expect("enqueue");

    let message = mail
        .insert(&MailMessage {
            id: String::new(),
            from: "b1".into(),
            to: "coordinator".into(),
            subject: "merge ready".into(),
            body: String::new(),
            mail_type: MailType::MergeReady,
            priority: Priority::Normal,
            thread_id: None,
            payload: Some(serde_json::json!({"branch": "legio/b1/t1"})),
            read: false,
            created_at: Utc::now(),
        })
        .expect("insert mail");

    let mut config = AutopilotConfig::default();
    config.auto_merge = true;
    let pilot = Autopilot::new(config);
    pilot.start();

    let resolver = MergeResolver {
        repo_root: repo.path().to_path_buf(),
        queue: &queue,
        history: &history,
        mail: &mail,
        reimagine_command: None,
        reimagine_timeout: std::time::Duration::from_secs(5),
    };

    let worktrees: Option<(&WorktreeManager, &[String])> = None;
    pilot.tick(&mail, &resolver, "main", worktrees);

    let snapshot = pilot.snapshot();
    assert_eq!(snapshot.tick_count, 1);
    assert_eq!(snapshot.actions.len(), 1);
    assert_eq!(snapshot.actions[0].kind, "merge");

    let refreshed = mail.get_by_id(&message.id).expect("get").expect("present");
    assert!(refreshed.read);

    let entries = queue.list(Some(QueueStatus::Merged)).expect("list merged");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].branch, "legio/b1/t1");
}

#[test]
fn autopilot_disabled_for_auto_merge_only_records_escalations() {
    let state_dir = tempfile::tempdir().expect("state dir");
    let mail = MailStore::new(state_dir.path().join("mail.db"));

    mail.insert(&MailMessage {
        id: String::new(),
        from: "b1".into(),
        to: "coordinator".into(),
        subject: "build failed".into(),
        body: "panic in worker".into(),
        mail_type: MailType::Error,
        priority: Priority::Urgent,
        thread_id: None,
        payload: None,
        read: false,
        created_at: Utc::now(),
    })
    .expect("insert mail");

    let queue = MergeQueueStore::new(state_dir.path().join("merge_queue.db"));
    let history = ConflictHistoryStore::new(state_dir.path().join("conflict_history.db"));
    let resolver = MergeResolver {
        repo_root: state_dir.path().to_path_buf(),
        queue: &queue,
        history: &history,
        mail: &mail,
        reimagine_command: None,
        reimagine_timeout: std::time::Duration::from_secs(5),
    };

    let pilot = Autopilot::new(AutopilotConfig::default());
    pilot.start();
    let worktrees: Option<(&WorktreeManager, &[String])> = None;
    pilot.tick(&mail, &resolver, "main", worktrees);

    let snapshot = pilot.snapshot();
    assert_eq!(snapshot.actions.len(), 1);
    assert_eq!(snapshot.actions[0].kind, "escalation-noted");
}
