//! Typed `.legio/config.yaml` (§6). Mirrors the teacher's `ManifoldConfig`
//! shape: one struct per concern, `deny_unknown_fields` so a typo in the
//! file fails loudly instead of being silently ignored.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LegioError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProjectConfig {
    pub name: String,
    pub canonical_branch: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "legio-project".into(),
            canonical_branch: "main".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AgentsConfig {
    /// Maximum child depth a spawned agent may reach (root = 0).
    pub max_depth: u32,
    /// Maximum concurrent children per parent.
    pub max_children: u32,
    /// Minimum delay enforced between successive spawns (§4.L).
    pub spawn_stagger_ms: u64,
    /// Command template launching the external LLM binary, `{task}` substituted.
    pub launch_command: String,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_children: 4,
            spawn_stagger_ms: 1500,
            launch_command: "claude".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WorktreesConfig {
    /// Branch namespace prefix (§4.B: `legio/{agent}/{task}`).
    pub branch_prefix: String,
    pub auto_clean: bool,
}

impl Default for WorktreesConfig {
    fn default() -> Self {
        Self {
            branch_prefix: "legio".into(),
            auto_clean: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MergeConfig {
    /// Binary invoked for tier-3 "reimagine" resolution.
    pub reimagine_command: Option<String>,
    pub reimagine_timeout_secs: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            reimagine_command: None,
            reimagine_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WatchdogConfig {
    pub tier0_interval_ms: u64,
    pub stale_threshold_ms: u64,
    pub max_retries: u32,
    pub grace_ms: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            tier0_interval_ms: 10_000,
            stale_threshold_ms: 300_000,
            max_retries: 3,
            grace_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ModelsConfig {
    /// Binary invoked for triage classification (§4.I).
    pub triage_command: Option<String>,
    pub triage_timeout_secs: u64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            triage_command: None,
            triage_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AutopilotConfig {
    pub tick_interval_ms: u64,
    pub auto_merge: bool,
    pub auto_clean_worktrees: bool,
    pub actions_ring_size: usize,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 5_000,
            auto_merge: false,
            auto_clean_worktrees: false,
            actions_ring_size: 50,
        }
    }
}

/// Top-level `.legio/config.yaml` document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct LegioConfig {
    pub project: ProjectConfig,
    pub agents: AgentsConfig,
    pub worktrees: WorktreesConfig,
    pub merge: MergeConfig,
    pub watchdog: WatchdogConfig,
    pub models: ModelsConfig,
    pub logging: LoggingConfig,
    pub autopilot: AutopilotConfig,
}

impl LegioConfig {
    /// Load and parse `config_path`, wrapping any error as `LegioError::Config`.
    pub fn load(config_path: &Path) -> Result<Self, LegioError> {
        let text = std::fs::read_to_string(config_path).map_err(|err| LegioError::Config {
            path: config_path.to_path_buf(),
            detail: err.to_string(),
        })?;
        serde_yaml::from_str(&text).map_err(|err| LegioError::Config {
            path: config_path.to_path_buf(),
            detail: err.to_string(),
        })
    }

    /// Serialize for `legio init`'s freshly scaffolded config file.
    pub fn to_yaml(&self) -> Result<String, LegioError> {
        serde_yaml::to_string(self).map_err(|err| LegioError::Config {
            path: Path::new("config.yaml").to_path_buf(),
            detail: err.to_string(),
        })
    }
}
