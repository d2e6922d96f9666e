//! Tree termination (§4.A): enumerate descendants deepest-first, SIGTERM
//! deepest-first then root, poll aliveness within a grace window, then
//! SIGKILL survivors. Errors signalling already-dead processes are ignored.

use std::path::PathBuf;
use std::time::{Duration, Instant};

#[cfg(unix)]
use nix::sys::signal::{kill, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Outcome of one `kill_session_tree` call, surfaced for tests and audit logs.
#[derive(Debug, Clone, Default)]
pub struct KillOutcome {
    pub terminated: Vec<i32>,
    pub hard_killed: Vec<i32>,
}

/// `processAlive(pid) -> bool` — a zero-signal probe.
#[cfg(unix)]
#[must_use]
pub fn process_alive(pid: i32) -> bool {
    kill(Pid::from_raw(pid), None).is_ok()
}

#[cfg(not(unix))]
#[must_use]
pub fn process_alive(_pid: i32) -> bool {
    false
}

/// `descendantPids(root) -> [pid]`, deepest-first, via `/proc/<pid>/task/*/children`.
#[must_use]
pub fn descendant_pids(root: i32) -> Vec<i32> {
    let mut order = Vec::new();
    collect_descendants(root, &mut order);
    // `collect_descendants` appends in pre-order (parent before children);
    // reverse so children precede their parents (deepest-first).
    order.reverse();
    order
}

fn collect_descendants(pid: i32, out: &mut Vec<i32>) {
    for child in direct_children(pid) {
        out.push(child);
        collect_descendants(child, out);
    }
}

fn direct_children(pid: i32) -> Vec<i32> {
    let task_dir = PathBuf::from(format!("/proc/{pid}/task"));
    let Ok(entries) = std::fs::read_dir(&task_dir) else {
        return Vec::new();
    };
    let mut children = Vec::new();
    for entry in entries.flatten() {
        let children_file = entry.path().join("children");
        let Ok(text) = std::fs::read_to_string(children_file) else {
            continue;
        };
        children.extend(text.split_whitespace().filter_map(|s| s.parse::<i32>().ok()));
    }
    children
}

/// Sends `SIGTERM` to every descendant deepest-first then to `root`, waits
/// `grace`, then `SIGKILL`s any survivor found alive via the zero-signal
/// probe. Signalling an already-dead process is not an error (ignored).
#[cfg(unix)]
pub fn kill_session_tree(root: i32, grace: Duration) -> KillOutcome {
    let mut tree = descendant_pids(root);
    tree.push(root);

    let mut outcome = KillOutcome::default();
    for &pid in &tree {
        if kill(Pid::from_raw(pid), Signal::SIGTERM).is_ok() {
            outcome.terminated.push(pid);
        }
    }

    let deadline = Instant::now() + grace;
    let poll_interval = Duration::from_millis(100).min(grace);
    while Instant::now() < deadline {
        if tree.iter().all(|&pid| !process_alive(pid)) {
            return outcome;
        }
        std::thread::sleep(poll_interval);
    }

    for &pid in &tree {
        if process_alive(pid) {
            let _ = kill(Pid::from_raw(pid), Signal::SIGKILL);
            outcome.hard_killed.push(pid);
        }
    }
    outcome
}

#[cfg(not(unix))]
pub fn kill_session_tree(_root: i32, _grace: Duration) -> KillOutcome {
    KillOutcome::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_process_is_alive() {
        assert!(process_alive(std::process::id() as i32));
    }

    #[test]
    fn descendants_of_leaf_process_are_empty() {
        // This test process has no children of its own in the test harness.
        assert!(descendant_pids(std::process::id() as i32).is_empty());
    }
}
