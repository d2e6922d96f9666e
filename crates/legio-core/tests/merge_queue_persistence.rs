//! S6 (persistence across processes) and invariants 3-4 (one pending/merging
//! entry per branch, FIFO dequeue order) against a real sqlite file on disk.

use chrono::{Duration, Utc};
use legio_core::model::{MergeQueueEntry, QueueStatus};
use legio_core::store::MergeQueueStore;

fn entry(branch: &str, enqueued_offset_secs: i64) -> MergeQueueEntry {
    MergeQueueEntry {
        branch: branch.to_string(),
        bead_id: "t1".into(),
        agent_name: "b1".into(),
        files_modified: vec!["src/lib.rs".into()],
        enqueued_at: Utc::now() + Duration::seconds(enqueued_offset_secs),
        status: QueueStatus::Pending,
        resolved_tier: None,
    }
}

#[test]
fn second_process_observes_enqueue_from_the_first_immediately() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("merge_queue.db");

    let process_a = MergeQueueStore::new(&db_path);
    process_a.enqueue(&entry("legio/b1/t1", 0)).expect("enqueue from process a");

    let process_b = MergeQueueStore::new(&db_path);
    let pending = process_b.list(Some(QueueStatus::Pending)).expect("list from process b");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].branch, "legio/b1/t1");
}

#[test]
fn only_one_pending_or_merging_entry_per_branch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MergeQueueStore::new(dir.path().join("merge_queue.db"));

    store.enqueue(&entry("legio/b1/t1", 0)).expect("first enqueue");
    let err = store.enqueue(&entry("legio/b1/t1", 1)).unwrap_err();
    assert!(matches!(err, legio_core::LegioError::Merge { .. }));
}

#[test]
fn re_enqueue_is_allowed_once_the_prior_entry_is_terminal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MergeQueueStore::new(dir.path().join("merge_queue.db"));

    store.enqueue(&entry("legio/b1/t1", 0)).expect("first enqueue");
    store
        .update_status("legio/b1/t1", QueueStatus::Merged, None)
        .expect("update_status");
    store.enqueue(&entry("legio/b1/t1", 1)).expect("re-enqueue after merge");
}

#[test]
fn dequeue_is_fifo_by_enqueued_at() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MergeQueueStore::new(dir.path().join("merge_queue.db"));

    store.enqueue(&entry("legio/b2/t2", 10)).expect("enqueue b2");
    store.enqueue(&entry("legio/b1/t1", 0)).expect("enqueue b1");
    store.enqueue(&entry("legio/b3/t3", 20)).expect("enqueue b3");

    let first = store.dequeue().expect("dequeue").expect("present");
    assert_eq!(first.branch, "legio/b1/t1");
    assert_eq!(first.status, QueueStatus::Merging);

    let second = store.dequeue().expect("dequeue").expect("present");
    assert_eq!(second.branch, "legio/b2/t2");
}

#[test]
fn non_pending_entries_are_invisible_to_dequeue_and_peek() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MergeQueueStore::new(dir.path().join("merge_queue.db"));

    store.enqueue(&entry("legio/b1/t1", 0)).expect("enqueue");
    store.dequeue().expect("dequeue").expect("present");

    assert!(store.peek().expect("peek").is_none());
    assert!(store.dequeue().expect("dequeue").is_none());
}

#[test]
fn update_status_on_unknown_branch_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MergeQueueStore::new(dir.path().join("merge_queue.db"));
    let err = store.update_status("legio/ghost/t9", QueueStatus::Merged, None).unwrap_err();
    assert!(matches!(err, legio_core::LegioError::NotFound { .. }));
}
