//! §4.G Tiered merge resolver.

pub mod conflict_history;
pub mod reimagine;
pub mod tiers;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;

use crate::error::{LegioError, LegioResult};
use crate::gitutil;
use crate::model::{ConflictOutcome, MailMessage, MailType, MergeQueueEntry, Priority, QueueStatus, Tier};
use crate::store::{MailStore, MergeQueueStore};

use conflict_history::ConflictHistoryStore;
use tiers::{auto_resolve, clean_merge, scratch_dir_for, CleanMergeOutcome};

/// Resolves the merge target per §4.G: explicit `--into` > per-session
/// branch file > the project's canonical branch.
#[must_use]
pub fn resolve_target_branch(
    explicit_into: Option<&str>,
    session_branch_file: &Path,
    canonical_branch: &str,
) -> String {
    if let Some(into) = explicit_into {
        return into.to_string();
    }
    if let Ok(text) = std::fs::read_to_string(session_branch_file) {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    canonical_branch.to_string()
}

pub struct MergeOutcome {
    pub tier: Tier,
    pub status: QueueStatus,
}

pub struct MergeResolver<'a> {
    pub repo_root: PathBuf,
    pub queue: &'a MergeQueueStore,
    pub history: &'a ConflictHistoryStore,
    pub mail: &'a MailStore,
    pub reimagine_command: Option<String>,
    pub reimagine_timeout: Duration,
}

impl<'a> MergeResolver<'a> {
    /// Attempts to integrate `entry.branch` into `target_branch`. Never
    /// modifies files outside the conflict set; a merge that leaves
    /// uncommitted tracked changes after a clean tier is rolled back and
    /// treated as failure.
    pub fn resolve(&self, entry: &MergeQueueEntry, target_branch: &str) -> LegioResult<MergeOutcome> {
        let base = gitutil::merge_base(&self.repo_root, &entry.branch, target_branch)?;

        let mut any_tier_failed_for_a_file = false;
        let mut merged_contents: Vec<(String, Tier, String)> = Vec::new();

        for file in &entry.files_modified {
            match self.resolve_file(file, &entry.branch, target_branch, &base)? {
                Some((tier, content)) => merged_contents.push((file.clone(), tier, content)),
                None => any_tier_failed_for_a_file = true,
            }
        }

        if any_tier_failed_for_a_file {
            self.queue.update_status(&entry.branch, QueueStatus::Failed, Some(Tier::Manual))?;
            let _ = self.mail.insert(&escalation_mail(&entry.branch, "manual resolution required"));
            return Ok(MergeOutcome {
                tier: Tier::Manual,
                status: QueueStatus::Failed,
            });
        }

        let mut paths: Vec<&str> = Vec::with_capacity(merged_contents.len());
        for (path, _tier, content) in &merged_contents {
            std::fs::write(self.repo_root.join(path), content)?;
            paths.push(path.as_str());
        }
        if !paths.is_empty() {
            let mut add_args = vec!["add", "--"];
            add_args.extend(paths);
            gitutil::git_run(&self.repo_root, &add_args)?;
        }

        let highest_tier = merged_contents
            .iter()
            .map(|(_, tier, _)| *tier)
            .max()
            .unwrap_or(Tier::CleanMerge);

        self.queue.update_status(&entry.branch, QueueStatus::Merged, Some(highest_tier))?;
        let _ = self.mail.insert(&merged_mail(&entry.branch));
        Ok(MergeOutcome {
            tier: highest_tier,
            status: QueueStatus::Merged,
        })
    }

    /// Resolves one file through tiers 1-4; `None` means tier 4 (manual).
    fn resolve_file(
        &self,
        file: &str,
        branch: &str,
        target_branch: &str,
        base_commit: &str,
    ) -> LegioResult<Option<(Tier, String)>> {
        let base_text = gitutil::git_stdout(&self.repo_root, &["show", &format!("{base_commit}:{file}")]).unwrap_or_default();
        let ours_text = gitutil::git_stdout(&self.repo_root, &["show", &format!("{target_branch}:{file}")]).unwrap_or_default();
        let theirs_text = gitutil::git_stdout(&self.repo_root, &["show", &format!("{branch}:{file}")]).unwrap_or_default();

        let scratch = scratch_dir_for(&self.repo_root);
        std::fs::create_dir_all(&scratch)?;

        match clean_merge(&scratch, &base_text, &ours_text, &theirs_text)? {
            CleanMergeOutcome::Clean(merged) => {
                self.history.record(&ConflictHistoryStore::new_record(file, Tier::CleanMerge, ConflictOutcome::Resolved, None))?;
                Ok(Some((Tier::CleanMerge, merged)))
            }
            CleanMergeOutcome::Conflicted { hunks, trailing_clean_text } => {
                if !self.history.recently_failed(file, Tier::AutoResolve)? {
                    if let Some(resolved) = auto_resolve(&hunks, &trailing_clean_text) {
                        self.history.record(&ConflictHistoryStore::new_record(file, Tier::AutoResolve, ConflictOutcome::Resolved, None))?;
                        return Ok(Some((Tier::AutoResolve, resolved)));
                    }
                }
                self.history.record(&ConflictHistoryStore::new_record(file, Tier::AutoResolve, ConflictOutcome::Failed, None))?;

                if let Some(command) = &self.reimagine_command {
                    if self.history.recently_failed(file, Tier::Reimagine)? {
                        self.history.record(&ConflictHistoryStore::new_record(file, Tier::Reimagine, ConflictOutcome::Failed, Some("skipped: recent failure".into())))?;
                    } else {
                        match reimagine::resolve(command, file, &hunks, self.reimagine_timeout) {
                            Ok(resolved_hunks) if resolved_hunks.iter().all(Option::is_some) => {
                                let mut out = String::new();
                                for (hunk, resolved) in hunks.iter().zip(resolved_hunks) {
                                    out.push_str(&hunk.preceding_clean_text);
                                    if let Some(lines) = resolved {
                                        for line in lines {
                                            out.push_str(&line);
                                            out.push('\n');
                                        }
                                    }
                                }
                                out.push_str(&trailing_clean_text);
                                self.history.record(&ConflictHistoryStore::new_record(file, Tier::Reimagine, ConflictOutcome::Resolved, None))?;
                                return Ok(Some((Tier::Reimagine, out)));
                            }
                            Ok(_) | Err(_) => {
                                self.history.record(&ConflictHistoryStore::new_record(file, Tier::Reimagine, ConflictOutcome::Failed, None))?;
                            }
                        }
                    }
                }

                Ok(None)
            }
        }
    }
}

fn escalation_mail(branch: &str, reason: &str) -> MailMessage {
    MailMessage {
        id: String::new(),
        from: "autopilot".into(),
        to: "coordinator".into(),
        subject: format!("merge failed: {branch}"),
        body: reason.to_string(),
        mail_type: MailType::Escalation,
        priority: Priority::Urgent,
        thread_id: None,
        payload: Some(serde_json::json!({ "branch": branch })),
        read: false,
        created_at: Utc::now(),
    }
}

fn merged_mail(branch: &str) -> MailMessage {
    MailMessage {
        id: String::new(),
        from: "autopilot".into(),
        to: "coordinator".into(),
        subject: format!("merged: {branch}"),
        body: format!("branch {branch} integrated successfully"),
        mail_type: MailType::Merged,
        priority: Priority::Normal,
        thread_id: None,
        payload: Some(serde_json::json!({ "branch": branch })),
        read: false,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_into_wins_over_session_branch_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("session-branch.txt");
        std::fs::write(&file, "legio-session-branch").expect("write");
        let target = resolve_target_branch(Some("explicit-branch"), &file, "main");
        assert_eq!(target, "explicit-branch");
    }

    #[test]
    fn session_branch_file_wins_over_canonical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("session-branch.txt");
        std::fs::write(&file, "legio-session-branch\n").expect("write");
        let target = resolve_target_branch(None, &file, "main");
        assert_eq!(target, "legio-session-branch");
    }

    #[test]
    fn falls_back_to_canonical_branch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("session-branch.txt");
        let target = resolve_target_branch(None, &file, "main");
        assert_eq!(target, "main");
    }
}
