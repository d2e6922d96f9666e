//! Durable stores (§4.C–F, added audit store). Each store is a thin wrapper
//! around a `rusqlite::Connection` opened in write-ahead journal mode with a
//! busy timeout, scoped open-use-close per §5/§9 "scoped resource
//! acquisition" — nothing here holds a connection across an await point or a
//! function boundary.

mod audit_store;
mod event_store;
mod mail_store;
mod merge_queue_store;
mod session_store;

pub use audit_store::AuditStore;
pub use event_store::{EventFilter, EventStore, ToolStats};
pub use mail_store::{MailFilter, MailStore};
pub use merge_queue_store::MergeQueueStore;
pub use session_store::SessionStore;

pub(crate) use crate::db::open_store;
