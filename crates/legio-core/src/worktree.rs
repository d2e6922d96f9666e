//! §4.B Worktree manager: thin wrapper over `git worktree`, namespacing
//! branches as `legio/{agent}/{task}` under `.legio/worktrees/{agent}`.
//! Ported from the teacher's `src/backend/git.rs`, which is the teacher's
//! only working worktree implementation (its trait-based `maw-git` crate is
//! an unfinished stub — see `DESIGN.md`).

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::LegioError;
use crate::gitutil;
use crate::paths::ProjectPaths;

/// One entry from `git worktree list --porcelain`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeEntry {
    pub path: String,
    pub head: Option<String>,
    pub branch: Option<String>,
}

pub struct WorktreeManager {
    repo_root: PathBuf,
    branch_prefix: String,
}

impl WorktreeManager {
    #[must_use]
    pub fn new(repo_root: impl Into<PathBuf>, branch_prefix: impl Into<String>) -> Self {
        Self {
            repo_root: repo_root.into(),
            branch_prefix: branch_prefix.into(),
        }
    }

    /// `legio/{agent}/{task}`.
    #[must_use]
    pub fn branch_name(&self, agent_name: &str, task_id: &str) -> String {
        format!("{}/{agent_name}/{task_id}", self.branch_prefix)
    }

    /// Creates a worktree at `paths.worktree_dir(agent_name)`, detached onto
    /// `base_ref`, then creates and checks out `branch`. Fails if the branch
    /// already exists or the base ref resolves to a dirty working tree.
    pub fn create(
        &self,
        paths: &ProjectPaths,
        agent_name: &str,
        branch: &str,
        base_ref: &str,
    ) -> Result<PathBuf, LegioError> {
        let worktree_path = paths.worktree_dir(agent_name);

        if worktree_path.exists() {
            std::fs::remove_dir_all(&worktree_path)?;
        }
        let _ = Command::new("git")
            .args(["worktree", "prune"])
            .current_dir(&self.repo_root)
            .output();

        if let Some(parent) = worktree_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let path_str = worktree_path.to_string_lossy().into_owned();
        let result = gitutil::git_run(
            &self.repo_root,
            &["worktree", "add", "-b", branch, &path_str, base_ref],
        );
        if let Err(err) = result {
            if worktree_path.exists() {
                let _ = std::fs::remove_dir_all(&worktree_path);
            }
            return Err(err);
        }
        Ok(worktree_path)
    }

    /// Removes the worktree at `path`, tolerating "already removed".
    /// `force` also discards uncommitted changes in the worktree.
    pub fn remove(&self, path: &Path, force: bool) -> Result<(), LegioError> {
        if path.exists() {
            let path_str = path.to_string_lossy().into_owned();
            let mut args = vec!["worktree", "remove"];
            if force {
                args.push("--force");
            }
            args.push(&path_str);
            if let Err(err) = gitutil::git_run(&self.repo_root, &args) {
                tracing::warn!(?err, path = %path.display(), "git worktree remove failed, falling back to manual cleanup");
                std::fs::remove_dir_all(path)?;
            }
        }
        let _ = Command::new("git")
            .args(["worktree", "prune"])
            .current_dir(&self.repo_root)
            .output();
        Ok(())
    }

    /// Entries whose branch starts with the legio namespace prefix.
    pub fn list(&self) -> Result<Vec<WorktreeEntry>, LegioError> {
        let raw = gitutil::git_stdout(&self.repo_root, &["worktree", "list", "--porcelain"])?;
        let entries = parse_worktree_porcelain(&raw);
        let prefix = format!("refs/heads/{}/", self.branch_prefix);
        Ok(entries
            .into_iter()
            .filter(|e| e.branch.as_deref().is_some_and(|b| b.starts_with(&prefix)))
            .collect())
    }

    /// Removes worktrees for agents no longer present in `live_agent_names`
    /// (autopilot's `autoCleanWorktrees`, §4.K).
    pub fn clean(&self, live_agent_names: &[String]) -> Result<Vec<String>, LegioError> {
        let mut cleaned = Vec::new();
        for entry in self.list()? {
            let name = Path::new(&entry.path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !live_agent_names.contains(&name) {
                self.remove(Path::new(&entry.path), true)?;
                cleaned.push(name);
            }
        }
        Ok(cleaned)
    }
}

/// Parse `git worktree list --porcelain` output (ported from the teacher's
/// `parse_worktree_porcelain`).
fn parse_worktree_porcelain(raw: &str) -> Vec<WorktreeEntry> {
    let mut entries = Vec::new();
    let mut current = WorktreeEntry::default();
    let mut in_entry = false;

    for line in raw.lines() {
        if line.is_empty() {
            if in_entry && !current.path.is_empty() {
                entries.push(current);
                current = WorktreeEntry::default();
                in_entry = false;
            }
            continue;
        }
        if let Some(path) = line.strip_prefix("worktree ") {
            current.path = path.trim().to_owned();
            in_entry = true;
        } else if let Some(head) = line.strip_prefix("HEAD ") {
            current.head = Some(head.trim().to_owned());
        } else if let Some(branch) = line.strip_prefix("branch ") {
            current.branch = Some(branch.trim().to_owned());
        }
    }
    if in_entry && !current.path.is_empty() {
        entries.push(current);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_worktree_entry() {
        let raw = "worktree /repo\nHEAD abc123\nbranch refs/heads/main\n";
        let entries = parse_worktree_porcelain(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "/repo");
        assert_eq!(entries[0].branch.as_deref(), Some("refs/heads/main"));
    }

    #[test]
    fn parses_multiple_worktree_entries() {
        let raw = "worktree /repo\nHEAD abc123\nbranch refs/heads/main\n\nworktree /repo/.legio/worktrees/b1\nHEAD def456\nbranch refs/heads/legio/b1/t1\n";
        let entries = parse_worktree_porcelain(raw);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].branch.as_deref(), Some("refs/heads/legio/b1/t1"));
    }

    #[test]
    fn branch_name_uses_namespace_prefix() {
        let manager = WorktreeManager::new("/repo", "legio");
        assert_eq!(manager.branch_name("b1", "t1"), "legio/b1/t1");
    }
}
