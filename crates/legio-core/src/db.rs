//! Shared helper for opening one of Legio's SQLite-backed stores.

use std::path::Path;

use rusqlite::Connection;

use crate::error::LegioResult;

/// Open `path`, set WAL journalling and a 5s busy timeout (§4.C/§4.D/§5).
/// Every store opens, uses, and drops its connection within one function
/// call — nothing here is held across an await point or shared for writes.
pub fn open_store(path: &Path) -> LegioResult<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    Ok(conn)
}
