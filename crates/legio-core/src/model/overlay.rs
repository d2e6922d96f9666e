//! §3 "Overlay & identity", §4.O — per-agent on-disk material under
//! `.legio/agents/{name}/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::Capability;

/// Exclusive file-ownership declaration for one agent's task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileScope {
    /// Glob patterns this agent may touch.
    pub include: Vec<String>,
    /// Glob patterns explicitly excluded even if matched by `include`.
    pub exclude: Vec<String>,
}

/// The Markdown/YAML overlay written into an agent's worktree at spawn,
/// narrowing its operating context (§4.L step "write the per-agent overlay").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overlay {
    pub agent_name: String,
    pub capability: Capability,
    pub task_id: String,
    pub parent_agent: Option<String>,
    pub depth: u32,
    pub file_scope: FileScope,
    /// Free-form activation context injected into the beacon.
    pub activation_context: String,
}

impl Overlay {
    /// Render as the Markdown body written into the worktree's instruction
    /// file; a YAML front-matter block followed by the activation context.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let front_matter = serde_yaml::to_string(self).unwrap_or_default();
        format!("---\n{front_matter}---\n\n{}\n", self.activation_context)
    }
}

/// Per-agent identity: capability, expertise, and history (`identity.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub agent_name: String,
    pub capability: Capability,
    #[serde(default)]
    pub expertise_domains: Vec<String>,
    #[serde(default)]
    pub recent_tasks: Vec<String>,
    #[serde(default)]
    pub sessions_completed: u32,
}

impl Identity {
    #[must_use]
    pub fn new(agent_name: impl Into<String>, capability: Capability) -> Self {
        Self {
            agent_name: agent_name.into(),
            capability,
            expertise_domains: Vec::new(),
            recent_tasks: Vec::new(),
            sessions_completed: 0,
        }
    }
}

/// Resume-after-compaction state (`checkpoint.json`), optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub agent_name: String,
    pub progress: String,
    pub files_modified: Vec<String>,
    pub pending_work: Vec<String>,
    pub branch: String,
    pub saved_at: DateTime<Utc>,
}
