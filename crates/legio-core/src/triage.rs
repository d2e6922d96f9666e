//! §4.I Triage: a bounded external LLM classification used by the watchdog's
//! level-2 escalation to decide between retrying, extending patience, or
//! terminating a stalled session.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use chrono::{DateTime, Utc};
use wait_timeout::ChildExt;

const TRIAGE_TIMEOUT: Duration = Duration::from_secs(30);
const TAIL_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Retry,
    Extend,
    Terminate,
}

/// Classifies a stalled session by invoking the configured triage command
/// with a prompt built from the agent name, last-activity timestamp, and the
/// tail of its terminal log. Any failure to launch, a timeout, or an
/// inconclusive response defaults to `Extend` — triage never terminates a
/// session by default, only on an explicit verdict.
#[must_use]
pub fn classify(agent_name: &str, last_activity: DateTime<Utc>, log_tail: String) -> Verdict {
    classify_with(None, agent_name, last_activity, log_tail)
}

/// Same as [`classify`] but takes an explicit triage command, for callers
/// that have one configured (falls back to `Extend` when `command` is
/// `None`, matching an unconfigured triage step).
#[must_use]
pub fn classify_with(
    command: Option<&str>,
    agent_name: &str,
    last_activity: DateTime<Utc>,
    log_tail: String,
) -> Verdict {
    let Some(command) = command else {
        return Verdict::Extend;
    };

    let tail: String = log_tail
        .lines()
        .rev()
        .take(TAIL_LINES)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "agent: {agent_name}\nlast activity: {}\n---\n{tail}\n---\nIs this agent stalled? Respond with one word: retry, terminate, or extend.",
        last_activity.to_rfc3339()
    );

    match run_triage(command, &prompt) {
        Ok(response) => lexical_verdict(&response),
        Err(err) => {
            tracing::warn!(?err, agent = agent_name, "triage command failed, defaulting to extend");
            Verdict::Extend
        }
    }
}

fn run_triage(command: &str, prompt: &str) -> Result<String, std::io::Error> {
    let mut child = Command::new(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(prompt.as_bytes())?;
    }

    let status = child.wait_timeout(TRIAGE_TIMEOUT)?;
    let Some(status) = status else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "triage command timed out"));
    };

    let output = child.wait_with_output()?;
    if !status.success() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("triage command exited with {status}"),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Lexical classification per §4.I: substring match, case-insensitive.
/// "retry"/"recoverable" -> retry, "terminate"/"fatal"/"failed" -> terminate,
/// else extend.
fn lexical_verdict(response: &str) -> Verdict {
    let lower = response.to_lowercase();
    if lower.contains("retry") || lower.contains("recoverable") {
        Verdict::Retry
    } else if lower.contains("terminate") || lower.contains("fatal") || lower.contains("failed") {
        Verdict::Terminate
    } else {
        Verdict::Extend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_language_classifies_as_retry() {
        assert_eq!(lexical_verdict("looks recoverable, please retry"), Verdict::Retry);
    }

    #[test]
    fn fatal_language_classifies_as_terminate() {
        assert_eq!(lexical_verdict("this agent has failed fatally"), Verdict::Terminate);
    }

    #[test]
    fn ambiguous_response_defaults_to_extend() {
        assert_eq!(lexical_verdict("not sure, give it more time"), Verdict::Extend);
    }

    #[test]
    fn unconfigured_command_defaults_to_extend() {
        let verdict = classify_with(None, "agent-1", Utc::now(), String::new());
        assert_eq!(verdict, Verdict::Extend);
    }
}
