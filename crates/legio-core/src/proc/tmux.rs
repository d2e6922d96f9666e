//! tmux session lifecycle, shelled via `std::process::Command`, located via
//! `which` (grounded on `aguindehi-aifo-coder-rs`'s `fork/orchestrators/tmux.rs`).

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::LegioError;

use super::tree_kill::{kill_session_tree, KillOutcome};

pub struct TmuxAdapter {
    tmux_bin: PathBuf,
}

impl TmuxAdapter {
    pub fn locate() -> Result<Self, LegioError> {
        let tmux_bin = which::which("tmux")
            .map_err(|_| LegioError::agent("tmux", "tmux binary not found on PATH"))?;
        Ok(Self { tmux_bin })
    }

    fn command(&self) -> Command {
        Command::new(&self.tmux_bin)
    }

    /// `createSession(name, cwd, command) -> rootPid`. Fails fast if `name`
    /// already exists (duplicate creation, §4.A failure semantics).
    pub fn create_session(&self, name: &str, cwd: &Path, shell_command: &str) -> Result<i32, LegioError> {
        if self.has_session(name)? {
            return Err(LegioError::agent(name, "a session with this name already exists"));
        }
        let status = self
            .command()
            .args(["new-session", "-d", "-s", name, "-c"])
            .arg(cwd)
            .arg(shell_command)
            .status()
            .map_err(LegioError::from)?;
        if !status.success() {
            return Err(LegioError::agent(name, "tmux new-session failed"));
        }
        self.root_pid(name)
    }

    fn root_pid(&self, name: &str) -> Result<i32, LegioError> {
        let output = self
            .command()
            .args(["list-panes", "-t", name, "-F", "#{pane_pid}"])
            .output()
            .map_err(LegioError::from)?;
        let text = String::from_utf8_lossy(&output.stdout);
        text.lines()
            .next()
            .and_then(|line| line.trim().parse::<i32>().ok())
            .ok_or_else(|| LegioError::agent(name, "could not determine root pid of session"))
    }

    /// "session not found" is not an error on reads — returns `[]`.
    pub fn list_sessions(&self) -> Result<Vec<(String, i32)>, LegioError> {
        let output = self
            .command()
            .args(["list-sessions", "-F", "#{session_name}"])
            .output()
            .map_err(LegioError::from)?;
        if !output.status.success() {
            return Ok(Vec::new());
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let mut sessions = Vec::new();
        for name in text.lines().filter(|l| !l.is_empty()) {
            if let Ok(pid) = self.root_pid(name) {
                sessions.push((name.to_string(), pid));
            }
        }
        Ok(sessions)
    }

    pub fn has_session(&self, name: &str) -> Result<bool, LegioError> {
        let status = self
            .command()
            .args(["has-session", "-t", name])
            .status()
            .map_err(LegioError::from)?;
        Ok(status.success())
    }

    /// Flattens embedded newlines into spaces, then appends an explicit
    /// submit (`C-m`). TUI clients often treat a raw `Enter` mid-text as a
    /// line split, so callers needing a hard submit rely on this flattening.
    pub fn send_keys(&self, name: &str, text: &str) -> Result<(), LegioError> {
        if !self.has_session(name)? {
            return Err(LegioError::agent(name, "session not found"));
        }
        let flattened = text.replace('\n', " ");
        let status = self
            .command()
            .args(["send-keys", "-t", name, &flattened, "C-m"])
            .status()
            .map_err(LegioError::from)?;
        if !status.success() {
            return Err(LegioError::agent(name, "tmux send-keys failed"));
        }
        Ok(())
    }

    /// Captures the last `lines` lines of the session's primary pane.
    pub fn capture(&self, name: &str, lines: u32) -> Result<String, LegioError> {
        if !self.has_session(name)? {
            return Err(LegioError::agent(name, "session not found"));
        }
        let start = format!("-{lines}");
        let output = self
            .command()
            .args(["capture-pane", "-t", name, "-p", "-S", &start])
            .output()
            .map_err(LegioError::from)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Terminates the session and the full process tree rooted at its
    /// primary pane (§4.A "tree termination", S2).
    pub fn kill_session(&self, name: &str, grace: std::time::Duration) -> Result<KillOutcome, LegioError> {
        let outcome = if let Ok(pid) = self.root_pid(name) {
            kill_session_tree(pid, grace)
        } else {
            KillOutcome::default()
        };
        // "already removed" is not an error: tmux kill-session on a missing
        // session is tolerated.
        let _ = self.command().args(["kill-session", "-t", name]).status();
        Ok(outcome)
    }
}
