use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use legio_core::model::{Event, EventLevel};
use legio_core::paths::ProjectPaths;
use legio_core::store::{EventFilter, EventStore};

use crate::output;

fn parse_level(raw: Option<&str>) -> Option<EventLevel> {
    match raw?.to_ascii_lowercase().as_str() {
        "debug" => Some(EventLevel::Debug),
        "info" => Some(EventLevel::Info),
        "warn" | "warning" => Some(EventLevel::Warn),
        "error" => Some(EventLevel::Error),
        _ => None,
    }
}

fn parse_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw {
        None => Ok(None),
        Some(text) => Ok(Some(text.parse::<DateTime<Utc>>()?)),
    }
}

pub fn run(
    agent: Option<String>,
    level: Option<String>,
    since: Option<String>,
    until: Option<String>,
    follow: bool,
    json: bool,
) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let store = EventStore::new(paths.events_db());
    let filter = EventFilter {
        since: parse_timestamp(since.as_deref())?,
        until: parse_timestamp(until.as_deref())?,
        level: parse_level(level.as_deref()),
        limit: 0,
    };

    let mut last_id = print_batch(&store, agent.as_deref(), &filter, json, None)?;
    if !follow {
        return Ok(());
    }
    loop {
        std::thread::sleep(Duration::from_secs(2));
        last_id = print_batch(&store, agent.as_deref(), &filter, json, Some(last_id))?;
    }
}

fn print_batch(
    store: &EventStore,
    agent: Option<&str>,
    filter: &EventFilter,
    json: bool,
    after_id: Option<i64>,
) -> Result<i64> {
    let events: Vec<Event> = match agent {
        Some(name) => store.get_by_agent(name, filter)?,
        None => store.get_timeline(filter)?,
    };
    let fresh: Vec<&Event> = events.iter().filter(|e| after_id.map_or(true, |id| e.id > id)).collect();
    let max_id = fresh.iter().map(|e| e.id).max().or(after_id).unwrap_or(0);
    if !fresh.is_empty() {
        output::emit(&fresh, json);
    }
    Ok(max_id)
}
