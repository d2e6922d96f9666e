//! Subprocess wrappers around the `git` binary. Every git operation in this
//! workspace goes through here or through `worktree` — no crate links a git
//! library; this mirrors the teacher's own shipped worktree backend
//! (`src/backend/git.rs`), which shells to `git` directly rather than going
//! through its unfinished `gix`-backed trait.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::LegioError;

/// Runs `git <args>` in `dir`, returning stdout on success.
pub fn git_stdout(dir: &Path, args: &[&str]) -> Result<String, LegioError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(LegioError::from)?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(LegioError::Agent {
            agent: String::new(),
            detail: format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        })
    }
}

/// Runs `git <args>` in `dir`, discarding stdout.
pub fn git_run(dir: &Path, args: &[&str]) -> Result<(), LegioError> {
    git_stdout(dir, args)?;
    Ok(())
}

/// `git rev-parse <rev>`, trimmed.
pub fn rev_parse(dir: &Path, rev: &str) -> Result<String, LegioError> {
    Ok(git_stdout(dir, &["rev-parse", rev])?.trim().to_owned())
}

/// `git merge-base <a> <b>`, trimmed.
pub fn merge_base(dir: &Path, a: &str, b: &str) -> Result<String, LegioError> {
    Ok(git_stdout(dir, &["merge-base", a, b])?.trim().to_owned())
}

/// Whether `dir`'s working tree is clean (no output from `status --porcelain`).
pub fn is_clean(dir: &Path) -> Result<bool, LegioError> {
    Ok(git_stdout(dir, &["status", "--porcelain"])?.trim().is_empty())
}

/// Parsed `git status --porcelain` v1: dirty file paths, quotes stripped.
pub fn dirty_paths(dir: &Path) -> Result<Vec<PathBuf>, LegioError> {
    let raw = git_stdout(dir, &["status", "--porcelain"])?;
    Ok(parse_porcelain_status(&raw))
}

/// Three-way merge of one file: `base`, `ours`, `theirs` are file contents.
/// Returns `Ok(merged)` on a clean merge, `Err` carrying the conflicted
/// output (with `<<<<<<<` markers) when `git merge-file` reports conflicts.
pub fn merge_file_three_way(
    scratch_dir: &Path,
    base: &str,
    ours: &str,
    theirs: &str,
) -> Result<String, MergeFileConflict> {
    let ours_path = scratch_dir.join("ours");
    let base_path = scratch_dir.join("base");
    let theirs_path = scratch_dir.join("theirs");
    std::fs::write(&ours_path, ours).map_err(MergeFileConflict::io)?;
    std::fs::write(&base_path, base).map_err(MergeFileConflict::io)?;
    std::fs::write(&theirs_path, theirs).map_err(MergeFileConflict::io)?;

    let output = Command::new("git")
        .args(["merge-file", "-p"])
        .arg(&ours_path)
        .arg(&base_path)
        .arg(&theirs_path)
        .output()
        .map_err(MergeFileConflict::io)?;

    let merged = String::from_utf8_lossy(&output.stdout).into_owned();
    // git merge-file exits >0 (the conflict count) when conflicts remain,
    // but still writes the best-effort merge (with markers) to stdout.
    if output.status.success() {
        Ok(merged)
    } else {
        Err(MergeFileConflict::Conflicted(merged))
    }
}

/// Outcome of a failed three-way file merge.
#[derive(Debug)]
pub enum MergeFileConflict {
    /// Merge produced conflict markers; payload is the marked-up text.
    Conflicted(String),
    /// The merge tool itself could not run.
    Io(std::io::Error),
}

impl MergeFileConflict {
    fn io(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Parse `git status --porcelain` v1 output into dirty file paths (ported
/// from the teacher's `parse_porcelain_status`).
fn parse_porcelain_status(output: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for line in output.lines() {
        if line.len() < 4 {
            continue;
        }
        let path_str = &line[3..];
        if path_str.is_empty() {
            continue;
        }
        let path_str = path_str
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(path_str);
        paths.push(PathBuf::from(path_str));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_porcelain_status_lines() {
        let raw = " M src/lib.rs\n?? new_file.rs\nA  \"quoted path.rs\"\n";
        let paths = parse_porcelain_status(raw);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("src/lib.rs"),
                PathBuf::from("new_file.rs"),
                PathBuf::from("quoted path.rs"),
            ]
        );
    }
}
