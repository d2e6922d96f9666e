use anyhow::Result;
use legio_core::paths::ProjectPaths;
use legio_core::store::{MailStore, MergeQueueStore, SessionStore};

use crate::output;

pub fn run(verbose: bool, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);

    let sessions = SessionStore::new(paths.sessions_db(), paths.legacy_sessions_json());
    let active = sessions.get_active()?;
    let active_run = sessions.get_active_run()?;

    let mail = MailStore::new(paths.mail_db());
    let unread = mail
        .get_all(&Default::default())
        .map(|all| all.into_iter().filter(|m| !m.read).count())
        .unwrap_or(0);

    let queue = MergeQueueStore::new(paths.merge_queue_db());
    let queue_entries = queue.list(None).unwrap_or_default();

    let summary = serde_json::json!({
        "root": paths.root(),
        "active_run": active_run,
        "active_agent_count": active.len(),
        "active_agents": if verbose { serde_json::json!(active) } else { serde_json::json!(active.iter().map(|s| &s.agent_name).collect::<Vec<_>>()) },
        "unread_mail": unread,
        "merge_queue_size": queue_entries.len(),
    });

    output::emit(&summary, json);
    Ok(())
}
