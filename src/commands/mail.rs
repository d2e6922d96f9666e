use anyhow::Result;
use chrono::Utc;
use legio_core::mail::resolve_group_address;
use legio_core::model::{MailMessage, MailType, Priority};
use legio_core::paths::ProjectPaths;
use legio_core::store::{MailFilter, MailStore, SessionStore};
use legio_core::util::random_suffix;

use crate::cli::MailCommands;
use crate::output;

pub fn run(cmd: MailCommands, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let store = MailStore::new(paths.mail_db());

    match cmd {
        MailCommands::Send {
            from,
            to,
            subject,
            body,
            r#type,
            thread,
        } => send(&paths, &store, from, to, subject, body, r#type, thread, json),
        MailCommands::Check { agent } => {
            let unread = store.get_unread(&agent)?;
            output::emit(&serde_json::json!({ "agent": agent, "unread": unread.len() }), json);
            Ok(())
        }
        MailCommands::List { from, to, unread_only } => {
            let filter = MailFilter { from, to, unread_only };
            let messages = store.get_all(&filter)?;
            output::emit(&messages, json);
            Ok(())
        }
        MailCommands::Read { id } => {
            let message = store.get_by_id(&id)?.ok_or_else(|| anyhow::anyhow!("no such message '{id}'"))?;
            store.mark_read(&id)?;
            output::emit(&message, json);
            Ok(())
        }
        MailCommands::Reply { id, from, body } => {
            let original = store.get_by_id(&id)?.ok_or_else(|| anyhow::anyhow!("no such message '{id}'"))?;
            let reply = MailMessage {
                id: String::new(),
                from: from.clone(),
                to: original.from.clone(),
                subject: format!("Re: {}", original.subject),
                body,
                mail_type: MailType::Status,
                priority: Priority::Normal,
                thread_id: original.thread_id.clone().or(Some(original.id.clone())),
                payload: None,
                read: false,
                created_at: Utc::now(),
            };
            let inserted = store.insert(&reply)?;
            output::emit(&inserted, json);
            Ok(())
        }
    }
}

fn parse_mail_type(raw: &str) -> Result<MailType> {
    let value = serde_json::Value::String(raw.to_string());
    serde_json::from_value(value).map_err(|_| anyhow::anyhow!("unknown mail type '{raw}'"))
}

#[allow(clippy::too_many_arguments)]
fn send(
    paths: &ProjectPaths,
    store: &MailStore,
    from: String,
    to: String,
    subject: String,
    body: String,
    mail_type: String,
    thread: Option<String>,
    json: bool,
) -> Result<()> {
    let mail_type = parse_mail_type(&mail_type)?;
    let sessions = SessionStore::new(paths.sessions_db(), paths.legacy_sessions_json()).get_active()?;
    let recipients = resolve_group_address(&to, &from, &sessions)?;

    let thread_id = thread.or_else(|| (recipients.len() > 1).then(|| format!("thread-{}", random_suffix(8))));

    let mut inserted = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        let message = MailMessage {
            id: String::new(),
            from: from.clone(),
            to: recipient,
            subject: subject.clone(),
            body: body.clone(),
            mail_type,
            priority: Priority::Normal,
            thread_id: thread_id.clone(),
            payload: None,
            read: false,
            created_at: Utc::now(),
        };
        inserted.push(store.insert(&message)?);
    }
    output::emit(&inserted, json);
    Ok(())
}
