//! `.legio/` on-disk layout (§6).

use std::path::{Path, PathBuf};

/// Handle to a project's `.legio/` directory. Every other module resolves
/// its files through this instead of hardcoding path fragments.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    /// `root` is the project's working directory (the parent of `.legio/`).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the project root from `LEGIO_CWD` if set, else `cwd`.
    #[must_use]
    pub fn discover(cwd: &Path) -> Self {
        match std::env::var_os("LEGIO_CWD") {
            Some(dir) => Self::new(PathBuf::from(dir)),
            None => Self::new(cwd.to_path_buf()),
        }
    }

    /// The project root (parent of `.legio/`).
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `.legio/`.
    #[must_use]
    pub fn legio_dir(&self) -> PathBuf {
        self.root.join(".legio")
    }

    #[must_use]
    pub fn config_yaml(&self) -> PathBuf {
        self.legio_dir().join("config.yaml")
    }

    #[must_use]
    pub fn agent_manifest(&self) -> PathBuf {
        self.legio_dir().join("agent-manifest.json")
    }

    #[must_use]
    pub fn hooks_json(&self) -> PathBuf {
        self.legio_dir().join("hooks.json")
    }

    #[must_use]
    pub fn agent_defs_dir(&self) -> PathBuf {
        self.legio_dir().join("agent-defs")
    }

    #[must_use]
    pub fn agent_dir(&self, name: &str) -> PathBuf {
        self.legio_dir().join("agents").join(name)
    }

    #[must_use]
    pub fn identity_yaml(&self, name: &str) -> PathBuf {
        self.agent_dir(name).join("identity.yaml")
    }

    #[must_use]
    pub fn checkpoint_json(&self, name: &str) -> PathBuf {
        self.agent_dir(name).join("checkpoint.json")
    }

    #[must_use]
    pub fn worktrees_dir(&self) -> PathBuf {
        self.legio_dir().join("worktrees")
    }

    #[must_use]
    pub fn worktree_dir(&self, name: &str) -> PathBuf {
        self.worktrees_dir().join(name)
    }

    #[must_use]
    pub fn logs_dir(&self, name: &str) -> PathBuf {
        self.legio_dir().join("logs").join(name)
    }

    #[must_use]
    pub fn session_log_dir(&self, name: &str, session_ts: &str) -> PathBuf {
        self.logs_dir(name).join(session_ts)
    }

    #[must_use]
    pub fn sessions_db(&self) -> PathBuf {
        self.legio_dir().join("sessions.db")
    }

    /// The legacy JSON fallback tolerated for read-compat only (§4.D, §9).
    #[must_use]
    pub fn legacy_sessions_json(&self) -> PathBuf {
        self.legio_dir().join("sessions.json")
    }

    #[must_use]
    pub fn mail_db(&self) -> PathBuf {
        self.legio_dir().join("mail.db")
    }

    #[must_use]
    pub fn events_db(&self) -> PathBuf {
        self.legio_dir().join("events.db")
    }

    #[must_use]
    pub fn metrics_db(&self) -> PathBuf {
        self.legio_dir().join("metrics.db")
    }

    #[must_use]
    pub fn merge_queue_db(&self) -> PathBuf {
        self.legio_dir().join("merge-queue.db")
    }

    #[must_use]
    pub fn audit_db(&self) -> PathBuf {
        self.legio_dir().join("audit.db")
    }

    #[must_use]
    pub fn orchestrator_tmux_json(&self) -> PathBuf {
        self.legio_dir().join("orchestrator-tmux.json")
    }

    #[must_use]
    pub fn session_branch_txt(&self) -> PathBuf {
        self.legio_dir().join("session-branch.txt")
    }

    #[must_use]
    pub fn current_run_txt(&self) -> PathBuf {
        self.legio_dir().join("current-run.txt")
    }

    #[must_use]
    pub fn nudge_state_json(&self) -> PathBuf {
        self.legio_dir().join("nudge-state.json")
    }

    #[must_use]
    pub fn pending_nudges_dir(&self) -> PathBuf {
        self.legio_dir().join("pending-nudges")
    }

    /// Create the full `.legio/` skeleton for `legio init`.
    pub fn ensure_skeleton(&self) -> std::io::Result<()> {
        for dir in [
            self.legio_dir(),
            self.agent_defs_dir(),
            self.legio_dir().join("agents"),
            self.worktrees_dir(),
            self.legio_dir().join("logs"),
            self.pending_nudges_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
