//! S2 (tree kill) and invariant 5, against a real process tree rather than
//! the single-leaf-process checks in `src/proc/tree_kill.rs`'s own tests.

use std::process::{Child, Command};
use std::time::Duration;

use legio_core::proc::{descendant_pids, kill_session_tree, process_alive};

/// Spawns `sh -c '<nested sleep tree> & <sleep> & wait'`: the returned
/// process is the root; it has two direct children, one of which itself
/// has a child (a three-level tree mirroring pid 100/{200,300}/400 from S2).
fn spawn_process_tree() -> Child {
    Command::new("sh")
        .arg("-c")
        .arg("sh -c 'sleep 300' & sleep 300 & wait")
        .spawn()
        .expect("spawn process tree")
}

#[test]
fn kill_session_tree_terminates_every_descendant() {
    let mut root = spawn_process_tree();
    let root_pid = root.id() as i32;

    // Give the shell time to fork both children and the grandchild.
    let mut descendants = Vec::new();
    for _ in 0..50 {
        descendants = descendant_pids(root_pid);
        if descendants.len() >= 3 {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    assert!(descendants.len() >= 3, "expected at least 3 descendants, saw {descendants:?}");

    let mut tree = descendants.clone();
    tree.push(root_pid);
    assert!(tree.iter().all(|&pid| process_alive(pid)), "whole tree should be alive before kill");

    let outcome = kill_session_tree(root_pid, Duration::from_secs(2));

    for &pid in &tree {
        assert!(!process_alive(pid), "pid {pid} should be dead after kill_session_tree");
    }
    assert!(outcome.terminated.contains(&root_pid));

    let _ = root.wait();
}

#[test]
fn current_process_is_always_alive() {
    assert!(process_alive(std::process::id() as i32));
}
