//! §4.H Watchdog: periodic liveness, stall detection, zombie reconciliation,
//! and the escalation ladder.

use chrono::Utc;

use crate::config::{ModelsConfig, WatchdogConfig};
use crate::error::LegioResult;
use crate::model::{AgentSession, Event, EventLevel, EventType, MailMessage, MailType, Priority, SessionState};
use crate::nudge::NudgeDispatcher;
use crate::proc::{kill_session_tree, TmuxAdapter};
use crate::store::{EventStore, MailStore, SessionStore};
use crate::triage::{classify_with, Verdict};

pub struct Watchdog<'a> {
    pub sessions: &'a SessionStore,
    pub events: &'a EventStore,
    pub mail: &'a MailStore,
    pub tmux: &'a TmuxAdapter,
    pub nudge: &'a NudgeDispatcher,
    pub config: &'a WatchdogConfig,
    pub models: &'a ModelsConfig,
}

impl<'a> Watchdog<'a> {
    /// One tick: for each active session, apply liveness -> stall ->
    /// zombie-reconciliation -> escalation. Tolerates per-session database
    /// errors by skipping that session for the tick; never deletes records.
    pub fn tick(&self) {
        let active = match self.sessions.get_active() {
            Ok(sessions) => sessions,
            Err(err) => {
                tracing::warn!(?err, "watchdog: failed to read active sessions this tick");
                return;
            }
        };
        for session in active {
            if let Err(err) = self.tick_one(&session) {
                tracing::warn!(?err, agent = %session.agent_name, "watchdog: skipping session for this tick");
            }
        }
    }

    fn tick_one(&self, session: &AgentSession) -> LegioResult<()> {
        let terminal_exists = self.tmux.has_session(&session.tmux_session).unwrap_or(false);
        let root_alive = session
            .root_pid
            .map(crate::proc::process_alive)
            .unwrap_or(false);
        let stale_threshold = chrono::Duration::milliseconds(
            i64::try_from(self.config.stale_threshold_ms).unwrap_or(i64::MAX),
        );
        let is_stale = Utc::now().signed_duration_since(session.last_activity) > stale_threshold;

        if !terminal_exists && session.state != SessionState::Zombie {
            return self.mark_zombie(session);
        }

        if terminal_exists && !root_alive && session.state != SessionState::Zombie {
            return self.mark_zombie(session);
        }

        if terminal_exists && root_alive && is_stale {
            if session.state != SessionState::Stalled {
                return self.mark_stalled(session);
            }
            return self.escalate(session);
        }

        Ok(())
    }

    fn mark_stalled(&self, session: &AgentSession) -> LegioResult<()> {
        let mut updated = session.clone();
        updated.state = SessionState::Stalled;
        updated.stalled_since = Some(Utc::now());
        updated.escalation_level = 1;
        self.sessions.upsert(&updated)?;
        self.nudge.nudge(
            &session.agent_name,
            &session.tmux_session,
            "check in: are you still working?",
            false,
        );
        Ok(())
    }

    fn mark_zombie(&self, session: &AgentSession) -> LegioResult<()> {
        let mut updated = session.clone();
        updated.state = SessionState::Zombie;
        self.sessions.upsert(&updated)?;
        let event = Event {
            id: 0,
            timestamp: Utc::now(),
            run_id: session.run_id.clone(),
            agent_name: session.agent_name.clone(),
            session_id: session.id.clone(),
            event_type: EventType::SessionEnd,
            tool_name: None,
            tool_args: None,
            tool_duration_ms: None,
            level: EventLevel::Warn,
            data: Some(serde_json::json!({"reason": "watchdog"}).to_string()),
        };
        self.events.insert(&event)?;
        Ok(())
    }

    fn escalate(&self, session: &AgentSession) -> LegioResult<()> {
        let mut updated = session.clone();
        match updated.escalation_level {
            0 | 1 => {
                updated.escalation_level = 2;
                self.sessions.upsert(&updated)?;
                let verdict = self.triage_verdict(session);
                self.apply_verdict(&updated, verdict)?;
            }
            level if level < self.config.max_retries => {
                updated.escalation_level = level + 1;
                self.sessions.upsert(&updated)?;
                let verdict = self.triage_verdict(session);
                self.apply_verdict(&updated, verdict)?;
            }
            _ => {
                // level >= max_retries: nudge/triage ladder exhausted, hand
                // off to the coordinator instead of retrying further.
                self.mail.insert(&MailMessage {
                    id: String::new(),
                    from: "watchdog".into(),
                    to: "coordinator".into(),
                    subject: format!("{} is unresponsive", session.agent_name),
                    body: format!(
                        "{} has stalled past {} retries and was not recovered by triage.",
                        session.agent_name, self.config.max_retries
                    ),
                    mail_type: MailType::Escalation,
                    priority: Priority::Urgent,
                    thread_id: None,
                    payload: Some(serde_json::json!({"agent": session.agent_name, "escalation_level": updated.escalation_level})),
                    read: false,
                    created_at: Utc::now(),
                })?;
            }
        }
        Ok(())
    }

    fn apply_verdict(&self, session: &AgentSession, verdict: Verdict) -> LegioResult<()> {
        match verdict {
            Verdict::Retry => {
                self.nudge.nudge(&session.agent_name, &session.tmux_session, "please continue", true);
            }
            Verdict::Extend => {
                let mut updated = session.clone();
                updated.stalled_since = Some(Utc::now());
                self.sessions.upsert(&updated)?;
            }
            Verdict::Terminate => {
                let grace = std::time::Duration::from_millis(self.config.grace_ms);
                if let Some(pid) = session.root_pid {
                    let _ = kill_session_tree(pid, grace);
                }
                let mut updated = session.clone();
                updated.state = SessionState::Zombie;
                self.sessions.upsert(&updated)?;
                let event = Event {
                    id: 0,
                    timestamp: Utc::now(),
                    run_id: session.run_id.clone(),
                    agent_name: session.agent_name.clone(),
                    session_id: session.id.clone(),
                    event_type: EventType::SessionEnd,
                    tool_name: None,
                    tool_args: None,
                    tool_duration_ms: None,
                    level: EventLevel::Warn,
                    data: Some(serde_json::json!({"reason": "watchdog"}).to_string()),
                };
                self.events.insert(&event)?;
            }
        }
        Ok(())
    }

    fn tail_log(&self, session: &AgentSession) -> String {
        self.tmux.capture(&session.tmux_session, 50).unwrap_or_default()
    }

    fn triage_verdict(&self, session: &AgentSession) -> Verdict {
        classify_with(
            self.models.triage_command.as_deref(),
            &session.agent_name,
            session.last_activity,
            self.tail_log(session),
        )
    }
}
