//! §4.E group-address resolution: a pure function over the sender name and
//! the current set of active sessions. Lives above `store::MailStore`,
//! which only ever inserts/reads individual messages.

use crate::error::LegioError;
use crate::model::{AgentSession, Capability};

/// Resolves `@all`, `@<capability>`, or `@<capability>s` (plural accepted)
/// into a deduplicated list of agent names, excluding `sender` (invariant 8).
/// Resolving to zero recipients is an error (S5).
pub fn resolve_group_address(
    address: &str,
    sender: &str,
    active_sessions: &[AgentSession],
) -> Result<Vec<String>, LegioError> {
    let Some(rest) = address.strip_prefix('@') else {
        return Ok(vec![address.to_string()]);
    };

    let mut names: Vec<String> = if rest.eq_ignore_ascii_case("all") {
        active_sessions.iter().map(|s| s.agent_name.clone()).collect()
    } else {
        let singular = rest.strip_suffix('s').unwrap_or(rest);
        let capability = singular
            .parse::<Capability>()
            .or_else(|_| rest.parse::<Capability>())?;
        active_sessions
            .iter()
            .filter(|s| s.capability == capability)
            .map(|s| s.agent_name.clone())
            .collect()
    };

    names.retain(|name| name != sender);
    names.sort();
    names.dedup();

    if names.is_empty() {
        return Err(LegioError::validation(
            "to",
            format!("group address '{address}' resolved to zero recipients"),
        ));
    }
    Ok(names)
}

/// Is this a group address at all (used by callers to decide whether to
/// expand into N inserts sharing one thread, vs. a single insert)?
#[must_use]
pub fn is_group_address(address: &str) -> bool {
    address.starts_with('@')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SessionState;
    use chrono::Utc;

    fn session(name: &str, capability: Capability) -> AgentSession {
        AgentSession {
            id: format!("sess-{name}"),
            agent_name: name.to_string(),
            capability,
            worktree_path: String::new(),
            branch: String::new(),
            task_id: String::new(),
            tmux_session: String::new(),
            state: SessionState::Working,
            root_pid: None,
            parent_agent: None,
            depth: 0,
            run_id: "run-1".into(),
            started_at: Utc::now(),
            last_activity: Utc::now(),
            stalled_since: None,
            escalation_level: 0,
        }
    }

    #[test]
    fn broadcast_to_capability_group_excludes_sender_and_other_capabilities() {
        let sessions = vec![
            session("b1", Capability::Builder),
            session("b2", Capability::Builder),
            session("r1", Capability::Reviewer),
        ];
        let mut recipients = resolve_group_address("@builders", "orchestrator", &sessions).expect("resolve");
        recipients.sort();
        assert_eq!(recipients, vec!["b1".to_string(), "b2".to_string()]);
    }

    #[test]
    fn sender_never_receives_its_own_broadcast() {
        let sessions = vec![session("b1", Capability::Builder), session("orchestrator", Capability::Coordinator)];
        let recipients = resolve_group_address("@all", "orchestrator", &sessions).expect("resolve");
        assert!(!recipients.contains(&"orchestrator".to_string()));
    }

    #[test]
    fn empty_group_resolution_is_an_error() {
        let sessions = vec![session("r1", Capability::Reviewer)];
        let err = resolve_group_address("@scouts", "orchestrator", &sessions).unwrap_err();
        assert!(matches!(err, LegioError::Validation { .. }));
    }
}
