//! Tier 1 (clean-merge) and tier 2 (auto-resolve) strategies (§4.G).

use crate::gitutil::MergeFileConflict;

/// One `<<<<<<<`/`|||||||`/`=======`/`>>>>>>>` conflict region from a
/// `git merge-file --diff3` output, plus the clean text immediately
/// preceding it (so hunks can be reassembled in order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictHunk {
    pub preceding_clean_text: String,
    pub ours: Vec<String>,
    pub base: Vec<String>,
    pub theirs: Vec<String>,
}

/// Outcome of attempting tier 1 against one file's three versions.
pub enum CleanMergeOutcome {
    Clean(String),
    Conflicted { hunks: Vec<ConflictHunk>, trailing_clean_text: String },
}

/// Tier 1: a plain three-way merge via `git merge-file --diff3 -p`.
pub fn clean_merge(scratch_dir: &std::path::Path, base: &str, ours: &str, theirs: &str) -> Result<CleanMergeOutcome, crate::error::LegioError> {
    match merge_file_diff3(scratch_dir, base, ours, theirs) {
        Ok(merged) => Ok(CleanMergeOutcome::Clean(merged)),
        Err(MergeFileConflict::Conflicted(marked_up)) => {
            let (hunks, trailing) = parse_diff3_conflicts(&marked_up);
            Ok(CleanMergeOutcome::Conflicted {
                hunks,
                trailing_clean_text: trailing,
            })
        }
        Err(MergeFileConflict::Io(err)) => Err(err.into()),
    }
}

fn merge_file_diff3(
    scratch_dir: &std::path::Path,
    base: &str,
    ours: &str,
    theirs: &str,
) -> Result<String, MergeFileConflict> {
    // `gitutil::merge_file_three_way` uses plain (non-diff3) markers; tier 2
    // needs the base text inline to classify hunks, so this tier calls
    // `git merge-file` directly with `--diff3`.
    use std::process::Command;
    let ours_path = scratch_dir.join("ours");
    let base_path = scratch_dir.join("base");
    let theirs_path = scratch_dir.join("theirs");
    std::fs::write(&ours_path, ours).map_err(MergeFileConflict::Io)?;
    std::fs::write(&base_path, base).map_err(MergeFileConflict::Io)?;
    std::fs::write(&theirs_path, theirs).map_err(MergeFileConflict::Io)?;

    let output = Command::new("git")
        .args(["merge-file", "--diff3", "-p"])
        .arg(&ours_path)
        .arg(&base_path)
        .arg(&theirs_path)
        .output()
        .map_err(MergeFileConflict::Io)?;
    let merged = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        Ok(merged)
    } else {
        Err(MergeFileConflict::Conflicted(merged))
    }
}

/// Parses `git merge-file --diff3 -p` output into clean segments and
/// conflict hunks, in document order.
fn parse_diff3_conflicts(text: &str) -> (Vec<ConflictHunk>, String) {
    let mut hunks = Vec::new();
    let mut clean = String::new();
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        if line.starts_with("<<<<<<<") {
            let mut ours = Vec::new();
            let mut base = Vec::new();
            let mut theirs = Vec::new();
            let mut section = 0u8; // 0=ours, 1=base, 2=theirs

            for inner in lines.by_ref() {
                if inner.starts_with("|||||||") {
                    section = 1;
                } else if inner.starts_with("=======") {
                    section = 2;
                } else if inner.starts_with(">>>>>>>") {
                    break;
                } else {
                    match section {
                        0 => ours.push(inner.to_string()),
                        1 => base.push(inner.to_string()),
                        _ => theirs.push(inner.to_string()),
                    }
                }
            }

            hunks.push(ConflictHunk {
                preceding_clean_text: std::mem::take(&mut clean),
                ours,
                base,
                theirs,
            });
        } else {
            clean.push_str(line);
            clean.push('\n');
        }
    }
    (hunks, clean)
}

/// Tier 2 deterministic classification of one hunk. Returns the resolved
/// text for the hunk's region, or `None` if it doesn't fit a known shape.
#[must_use]
pub fn auto_resolve_hunk(hunk: &ConflictHunk) -> Option<Vec<String>> {
    if hunk.ours == hunk.theirs {
        return Some(hunk.ours.clone());
    }

    let strip_ws = |lines: &[String]| -> Vec<String> {
        lines
            .iter()
            .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect()
    };
    if strip_ws(&hunk.ours) == strip_ws(&hunk.theirs) {
        return Some(hunk.ours.clone());
    }

    // Strict additions in disjoint regions: base is empty (pure insertion on
    // both sides) and the two insertions don't share any line.
    if hunk.base.is_empty() && !hunk.ours.is_empty() && !hunk.theirs.is_empty() {
        let overlap = hunk.ours.iter().any(|l| hunk.theirs.contains(l));
        if !overlap {
            let mut combined = hunk.ours.clone();
            combined.extend(hunk.theirs.clone());
            return Some(combined);
        }
    }

    None
}

/// Applies tier 2 across every hunk; `None` if any hunk resists classification.
#[must_use]
pub fn auto_resolve(hunks: &[ConflictHunk], trailing_clean_text: &str) -> Option<String> {
    let mut out = String::new();
    for hunk in hunks {
        out.push_str(&hunk.preceding_clean_text);
        let resolved = auto_resolve_hunk(hunk)?;
        for line in resolved {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.push_str(trailing_clean_text);
    Some(out)
}

/// Used by the worktree manager to stage scratch files for one merge attempt.
#[must_use]
pub fn scratch_dir_for(worktree: &std::path::Path) -> std::path::PathBuf {
    worktree.join(".legio-merge-scratch")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_both_sides_resolves() {
        let hunk = ConflictHunk {
            preceding_clean_text: String::new(),
            ours: vec!["x = 1".into()],
            base: vec!["x = 0".into()],
            theirs: vec!["x = 1".into()],
        };
        assert_eq!(auto_resolve_hunk(&hunk), Some(vec!["x = 1".into()]));
    }

    #[test]
    fn whitespace_only_difference_resolves() {
        let hunk = ConflictHunk {
            preceding_clean_text: String::new(),
            ours: vec!["fn f(a, b)".into()],
            base: vec!["fn f()".into()],
            theirs: vec!["fn  f(a,  b)".into()],
        };
        assert!(auto_resolve_hunk(&hunk).is_some());
    }

    #[test]
    fn disjoint_additions_are_concatenated() {
        let hunk = ConflictHunk {
            preceding_clean_text: String::new(),
            ours: vec!["add_a();".into()],
            base: vec![],
            theirs: vec!["add_b();".into()],
        };
        let resolved = auto_resolve_hunk(&hunk).expect("should resolve");
        assert_eq!(resolved, vec!["add_a();".to_string(), "add_b();".to_string()]);
    }

    #[test]
    fn overlapping_non_whitespace_changes_are_not_resolved() {
        let hunk = ConflictHunk {
            preceding_clean_text: String::new(),
            ours: vec!["return 1;".into()],
            base: vec!["return 0;".into()],
            theirs: vec!["return 2;".into()],
        };
        assert_eq!(auto_resolve_hunk(&hunk), None);
    }
}
