//! The Legio error taxonomy (§7 of the design).
//!
//! A closed set of variants carried across every boundary: CLI, HTTP
//! handlers, and the periodic tasks all match on these instead of inventing
//! their own. Each variant's `Display` message is written to be actionable
//! by an agent reading stderr, not just a human.

use std::fmt;
use std::path::PathBuf;

/// Unified error type for all Legio operations.
#[derive(Debug)]
pub enum LegioError {
    /// Bad input from a human or an agent: an invalid capability name, a
    /// malformed mail address, a config value out of range.
    Validation {
        /// What failed validation.
        field: String,
        /// Why.
        reason: String,
    },

    /// An error scoped to one agent: spawn, nudge, triage, or the
    /// process/tmux adapter report their failures this way.
    Agent {
        /// The agent name involved.
        agent: String,
        /// Human-readable detail.
        detail: String,
    },

    /// A merge attempt failed, with the branch and tier it failed at.
    Merge {
        /// The branch being merged.
        branch: String,
        /// The tier that failed (1-4), if resolution had started.
        tier: Option<u8>,
        /// Human-readable detail.
        detail: String,
    },

    /// The HTTP/WS server failed to bind or accept.
    Server {
        /// Human-readable detail.
        detail: String,
    },

    /// A requested resource does not exist: unknown session, unknown run,
    /// missing store file, unknown merge-queue branch.
    NotFound {
        /// What kind of resource ("session", "run", "mail", "queue-entry" …).
        kind: String,
        /// Its identifier.
        id: String,
    },

    /// Configuration file could not be parsed.
    Config {
        /// Path to the offending file.
        path: PathBuf,
        /// Human-readable detail.
        detail: String,
    },

    /// An I/O error.
    Io(std::io::Error),

    /// A `rusqlite` error from one of the stores.
    Sqlite(rusqlite::Error),
}

impl fmt::Display for LegioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { field, reason } => {
                write!(f, "invalid {field}: {reason}")
            }
            Self::Agent { agent, detail } => {
                write!(f, "agent '{agent}': {detail}")
            }
            Self::Merge {
                branch,
                tier,
                detail,
            } => {
                if let Some(tier) = tier {
                    write!(f, "merge of '{branch}' failed at tier {tier}: {detail}")
                } else {
                    write!(f, "merge of '{branch}' failed: {detail}")
                }
            }
            Self::Server { detail } => write!(f, "server error: {detail}"),
            Self::NotFound { kind, id } => write!(f, "{kind} '{id}' not found"),
            Self::Config { path, detail } => {
                write!(f, "configuration error in '{}': {detail}", path.display())
            }
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Sqlite(err) => write!(f, "store error: {err}"),
        }
    }
}

impl std::error::Error for LegioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LegioError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<rusqlite::Error> for LegioError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

impl LegioError {
    /// The machine-readable `kind` string surfaced on the CLI's structured
    /// stderr block and the HTTP API's `{error: {kind, ...}}` envelope.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::Agent { .. } => "AgentError",
            Self::Merge { .. } => "MergeError",
            Self::Server { .. } => "ServerError",
            Self::NotFound { .. } => "NotFoundError",
            Self::Config { .. } => "ConfigError",
            Self::Io(_) => "IoError",
            Self::Sqlite(_) => "StoreError",
        }
    }

    /// Process exit code per §7: 2 for validation errors, 1 for everything else.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => 2,
            _ => 1,
        }
    }

    /// Convenience constructor for a validation error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for an agent-scoped error.
    pub fn agent(agent: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Agent {
            agent: agent.into(),
            detail: detail.into(),
        }
    }

    /// Convenience constructor for a not-found error.
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Result alias used throughout `legio-core`.
pub type LegioResult<T> = Result<T, LegioError>;
