//! Domain types (§3): agent session, run, event, mail message, merge-queue
//! entry, conflict history, overlay & identity.

mod overlay;
mod types;

pub use overlay::{Checkpoint, FileScope, Identity, Overlay};
pub use types::{
    AgentSession, AuditEntry, Capability, ConflictHistoryRecord, ConflictOutcome, Event,
    EventLevel, EventType, MailMessage, MailType, MergeQueueEntry, Priority, QueueStatus, Run,
    RunStatus, SessionState, Tier,
};
