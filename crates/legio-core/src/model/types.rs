use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of agent roles (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Scout,
    Builder,
    Reviewer,
    Lead,
    Merger,
    Coordinator,
    Supervisor,
    Monitor,
}

impl Capability {
    /// All known capabilities, for validation and `agents discover`.
    pub const ALL: &'static [Self] = &[
        Self::Scout,
        Self::Builder,
        Self::Reviewer,
        Self::Lead,
        Self::Merger,
        Self::Coordinator,
        Self::Supervisor,
        Self::Monitor,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scout => "scout",
            Self::Builder => "builder",
            Self::Reviewer => "reviewer",
            Self::Lead => "lead",
            Self::Merger => "merger",
            Self::Coordinator => "coordinator",
            Self::Supervisor => "supervisor",
            Self::Monitor => "monitor",
        }
    }
}

impl std::str::FromStr for Capability {
    type Err = crate::error::LegioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| crate::error::LegioError::validation("capability", format!("unknown capability '{s}'")))
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// §3 Agent session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Booting,
    Working,
    Stalled,
    Completed,
    Zombie,
}

impl SessionState {
    /// Invariant 1: `activeSessions` iff state not in {completed, zombie}.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Completed | Self::Zombie)
    }

    /// Terminal states are never mutated except for historical reads.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Zombie)
    }
}

/// One running agent instance (§3 "Agent session").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSession {
    pub id: String,
    pub agent_name: String,
    pub capability: Capability,
    pub worktree_path: String,
    pub branch: String,
    pub task_id: String,
    pub tmux_session: String,
    pub state: SessionState,
    pub root_pid: Option<i32>,
    pub parent_agent: Option<String>,
    pub depth: u32,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub stalled_since: Option<DateTime<Utc>>,
    pub escalation_level: u32,
}

impl AgentSession {
    /// `legio-{project}-{agent}` per §3's tmux naming invariant.
    #[must_use]
    pub fn tmux_name(project: &str, agent_name: &str) -> String {
        format!("legio-{project}-{agent_name}")
    }
}

/// §3 "Run": an orchestration episode rooted at a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Active,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub coordinator_session_id: String,
    pub status: RunStatus,
}

/// §3 "Event".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ToolStart,
    ToolEnd,
    SessionStart,
    SessionEnd,
    Error,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic id, assigned by the store on insert.
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub run_id: String,
    pub agent_name: String,
    pub session_id: String,
    pub event_type: EventType,
    pub tool_name: Option<String>,
    pub tool_args: Option<String>,
    pub tool_duration_ms: Option<i64>,
    pub level: EventLevel,
    /// Opaque JSON blob.
    pub data: Option<String>,
}

/// §3 "Mail message" type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailType {
    Status,
    Question,
    Result,
    Error,
    MergeReady,
    Merged,
    MergeFailed,
    WorkerDone,
    Escalation,
    HealthCheck,
    Dispatch,
    Assign,
    MulchLearn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailMessage {
    /// `msg-` + random suffix.
    pub id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(rename = "type")]
    pub mail_type: MailType,
    pub priority: Priority,
    pub thread_id: Option<String>,
    /// Opaque JSON, schema keyed by `mail_type`.
    pub payload: Option<serde_json::Value>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// §3 "Merge-queue entry".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Merging,
    Merged,
    Failed,
    Abandoned,
}

/// Rank of a merge-resolution strategy, 1 (clean) to 4 (manual).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    CleanMerge,
    AutoResolve,
    Reimagine,
    Manual,
}

impl Tier {
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::CleanMerge => 1,
            Self::AutoResolve => 2,
            Self::Reimagine => 3,
            Self::Manual => 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeQueueEntry {
    pub branch: String,
    pub bead_id: String,
    pub agent_name: String,
    pub files_modified: Vec<String>,
    pub enqueued_at: DateTime<Utc>,
    pub status: QueueStatus,
    pub resolved_tier: Option<Tier>,
}

/// §3 "Conflict history record" outcome for one (file, tier) attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictOutcome {
    Resolved,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictHistoryRecord {
    pub file_path: String,
    pub tier: Tier,
    pub outcome: ConflictOutcome,
    /// Free-form strategy hint recorded for future AI prompts.
    pub strategy_hint: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// **(added)** audit record backing `audit.db` / `POST /api/audit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub actor: String,
    pub action: String,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
