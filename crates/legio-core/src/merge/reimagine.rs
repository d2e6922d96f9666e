//! Tier 3 "reimagine" (§4.G, §9 Open Question (c)): an opaque resolver
//! bounded around an external LLM CLI. Treated per `DESIGN.md`'s decision as
//! `(conflicts) -> resolved hunks or failure`, grounded on the bounded
//! subprocess pattern in `src/lock.rs`/`src/fork/orchestrators/tmux.rs`.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wait_timeout::ChildExt;

use crate::error::LegioError;

use super::tiers::ConflictHunk;

#[derive(Debug, Serialize)]
struct ReimagineRequest<'a> {
    file_path: &'a str,
    hunks: &'a [ConflictHunkWire],
}

#[derive(Debug, Serialize)]
struct ConflictHunkWire {
    ours: Vec<String>,
    base: Vec<String>,
    theirs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ResolvedHunkWire {
    index: usize,
    lines: Vec<String>,
}

/// Invokes `command` with the serialized conflict hunks on stdin, bounded by
/// `timeout`. On success, returns the resolved text per hunk in order;
/// `None` for any hunk the model declined to resolve (falls through to
/// tier 4). Any non-zero exit, timeout, or malformed response is a failure.
pub fn resolve(
    command: &str,
    file_path: &str,
    hunks: &[ConflictHunk],
    timeout: Duration,
) -> Result<Vec<Option<Vec<String>>>, LegioError> {
    let request = ReimagineRequest {
        file_path,
        hunks: &hunks
            .iter()
            .map(|h| ConflictHunkWire {
                ours: h.ours.clone(),
                base: h.base.clone(),
                theirs: h.theirs.clone(),
            })
            .collect::<Vec<_>>(),
    };
    let payload = serde_json::to_vec(&request).map_err(|err| LegioError::Merge {
        branch: String::new(),
        tier: Some(3),
        detail: format!("failed to serialize conflict hunks: {err}"),
    })?;

    let mut child = Command::new(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| LegioError::Merge {
            branch: String::new(),
            tier: Some(3),
            detail: format!("failed to launch reimagine command '{command}': {err}"),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(&payload);
    }

    let status = child.wait_timeout(timeout).map_err(|err| LegioError::Merge {
        branch: String::new(),
        tier: Some(3),
        detail: format!("reimagine command wait failed: {err}"),
    })?;

    let Some(status) = status else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(LegioError::Merge {
            branch: String::new(),
            tier: Some(3),
            detail: format!("reimagine command '{command}' timed out after {timeout:?}"),
        });
    };

    if !status.success() {
        return Err(LegioError::Merge {
            branch: String::new(),
            tier: Some(3),
            detail: format!("reimagine command '{command}' exited with {status}"),
        });
    }

    let output = child
        .wait_with_output()
        .map_err(|err| LegioError::Merge {
            branch: String::new(),
            tier: Some(3),
            detail: format!("failed to read reimagine command output: {err}"),
        })?;
    let resolved: Vec<ResolvedHunkWire> = serde_json::from_slice(&output.stdout).map_err(|err| LegioError::Merge {
        branch: String::new(),
        tier: Some(3),
        detail: format!("malformed reimagine response: {err}"),
    })?;

    let mut result = vec![None; hunks.len()];
    for wire in resolved {
        if let Some(slot) = result.get_mut(wire.index) {
            *slot = Some(wire.lines);
        }
    }
    Ok(result)
}
