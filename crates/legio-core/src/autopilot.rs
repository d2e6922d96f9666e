//! §4.K Autopilot: an in-process ticker that drains coordinator/orchestrator
//! mail and reacts to `merge_ready`/`error`/`escalation` without a human in
//! the loop, when enabled.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::AutopilotConfig;
use crate::merge::MergeResolver;
use crate::model::{MailMessage, MailType};
use crate::store::MailStore;
use crate::worktree::WorktreeManager;

const COORDINATOR_ALIASES: &[&str] = &["coordinator", "orchestrator"];

#[derive(Debug, Clone, Serialize)]
pub struct AutopilotAction {
    pub at: DateTime<Utc>,
    pub mail_id: String,
    pub kind: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutopilotSnapshot {
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub last_tick: Option<DateTime<Utc>>,
    pub tick_count: u64,
    pub actions: Vec<AutopilotAction>,
    pub config: AutopilotConfig,
}

struct State {
    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
    last_tick: Option<DateTime<Utc>>,
    tick_count: u64,
    actions: VecDeque<AutopilotAction>,
}

/// Drives §4.K's tick loop. `start()`/`stop()` are idempotent: calling
/// `start()` twice results in exactly one running daemon, observable through
/// `running` staying `true` and `started_at` not changing on the second call.
pub struct Autopilot {
    running: AtomicBool,
    state: Mutex<State>,
    config: AutopilotConfig,
}

impl Autopilot {
    #[must_use]
    pub fn new(config: AutopilotConfig) -> Self {
        Self {
            running: AtomicBool::new(false),
            state: Mutex::new(State {
                started_at: None,
                stopped_at: None,
                last_tick: None,
                tick_count: 0,
                actions: VecDeque::new(),
            }),
            config,
        }
    }

    /// Marks the autopilot running. A second call while already running is a
    /// no-op (idempotence).
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut state = self.state.lock().expect("autopilot state mutex poisoned");
        state.started_at = Some(Utc::now());
        state.stopped_at = None;
    }

    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut state = self.state.lock().expect("autopilot state mutex poisoned");
        state.stopped_at = Some(Utc::now());
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn snapshot(&self) -> AutopilotSnapshot {
        let state = self.state.lock().expect("autopilot state mutex poisoned");
        AutopilotSnapshot {
            running: self.is_running(),
            started_at: state.started_at,
            stopped_at: state.stopped_at,
            last_tick: state.last_tick,
            tick_count: state.tick_count,
            actions: state.actions.iter().cloned().collect(),
            config: self.config.clone(),
        }
    }

    /// One tick. Never panics out of a bad mail payload or a failed merge --
    /// absorbs the error into a recorded action and continues. No-op when
    /// not running.
    pub fn tick(&self, mail: &MailStore, resolver: &MergeResolver<'_>, target_branch: &str, worktrees: Option<(&WorktreeManager, &[String])>) {
        if !self.is_running() {
            return;
        }

        let mut unread = Vec::new();
        let mut seen_ids = std::collections::HashSet::new();
        for alias in COORDINATOR_ALIASES {
            match mail.get_unread(alias) {
                Ok(messages) => {
                    for message in messages {
                        if seen_ids.insert(message.id.clone()) {
                            unread.push(message);
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(?err, alias, "autopilot: failed to read mail this tick");
                }
            }
        }

        for message in unread {
            self.handle_mail(mail, resolver, target_branch, &message);
        }

        if self.config.auto_clean_worktrees {
            if let Some((manager, live_agents)) = worktrees {
                if let Err(err) = manager.clean(live_agents) {
                    tracing::warn!(?err, "autopilot: worktree cleanup failed this tick");
                }
            }
        }

        let mut state = self.state.lock().expect("autopilot state mutex poisoned");
        state.last_tick = Some(Utc::now());
        state.tick_count += 1;
    }

    fn handle_mail(&self, mail: &MailStore, resolver: &MergeResolver<'_>, target_branch: &str, message: &MailMessage) {
        match message.mail_type {
            MailType::MergeReady if self.config.auto_merge => {
                let branch = extract_branch(message);
                let outcome = branch.clone().and_then(|branch| {
                    resolver
                        .queue
                        .dequeue()
                        .ok()
                        .flatten()
                        .filter(|entry| entry.branch == branch)
                        .and_then(|entry| resolver.resolve(&entry, target_branch).ok())
                });
                match outcome {
                    Some(_outcome) => {
                        let branch = branch.unwrap_or_default();
                        self.record(message, "merge", format!("Merged branch: {branch}"))
                    }
                    None => self.record(message, "merge-skipped", "no matching queue entry or resolution failed".into()),
                }
            }
            MailType::Error | MailType::Escalation => {
                self.record(message, "escalation-noted", message.subject.clone());
            }
            _ => {}
        }
        let _ = mail.mark_read(&message.id);
    }

    fn record(&self, message: &MailMessage, kind: &str, detail: String) {
        let mut state = self.state.lock().expect("autopilot state mutex poisoned");
        if state.actions.len() >= self.config.actions_ring_size.max(1) {
            state.actions.pop_front();
        }
        state.actions.push_back(AutopilotAction {
            at: Utc::now(),
            mail_id: message.id.clone(),
            kind: kind.to_string(),
            detail,
        });
    }
}

/// Extracts a branch name from a `merge_ready` message: payload field first,
/// then a `branch: <name>` pattern in the subject, then the same pattern in
/// the body.
fn extract_branch(message: &MailMessage) -> Option<String> {
    if let Some(payload) = &message.payload {
        if let Some(branch) = payload.get("branch").and_then(|v| v.as_str()) {
            return Some(branch.to_string());
        }
    }
    extract_branch_pattern(&message.subject).or_else(|| extract_branch_pattern(&message.body))
}

fn extract_branch_pattern(text: &str) -> Option<String> {
    let idx = text.find("branch:")?;
    let rest = text[idx + "branch:".len()..].trim_start();
    let token = rest.split_whitespace().next()?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_idempotent() {
        let pilot = Autopilot::new(AutopilotConfig::default());
        pilot.start();
        let first = pilot.snapshot().started_at;
        pilot.start();
        let second = pilot.snapshot().started_at;
        assert_eq!(first, second);
        assert!(pilot.is_running());
    }

    #[test]
    fn branch_extraction_prefers_payload() {
        let message = MailMessage {
            id: "m1".into(),
            from: "agent-a".into(),
            to: "coordinator".into(),
            subject: "merge ready".into(),
            body: "branch: wrong-one".into(),
            mail_type: MailType::MergeReady,
            priority: crate::model::Priority::Normal,
            thread_id: None,
            payload: Some(serde_json::json!({ "branch": "legio/agent-a/t1" })),
            read: false,
            created_at: Utc::now(),
        };
        assert_eq!(extract_branch(&message), Some("legio/agent-a/t1".to_string()));
    }

    #[test]
    fn branch_extraction_falls_back_to_subject_pattern() {
        let message = MailMessage {
            id: "m2".into(),
            from: "agent-b".into(),
            to: "coordinator".into(),
            subject: "merge ready branch: legio/agent-b/t2".into(),
            body: String::new(),
            mail_type: MailType::MergeReady,
            priority: crate::model::Priority::Normal,
            thread_id: None,
            payload: None,
            read: false,
            created_at: Utc::now(),
        };
        assert_eq!(extract_branch(&message), Some("legio/agent-b/t2".to_string()));
    }

    #[test]
    fn ring_buffer_caps_actions() {
        let mut config = AutopilotConfig::default();
        config.actions_ring_size = 2;
        let pilot = Autopilot::new(config);
        pilot.start();
        for i in 0..5 {
            let message = MailMessage {
                id: format!("m{i}"),
                from: "a".into(),
                to: "coordinator".into(),
                subject: String::new(),
                body: String::new(),
                mail_type: MailType::Error,
                priority: crate::model::Priority::Normal,
                thread_id: None,
                payload: None,
                read: false,
                created_at: Utc::now(),
            };
            pilot.record(&message, "escalation-noted", String::new());
        }
        assert_eq!(pilot.snapshot().actions.len(), 2);
    }
}
