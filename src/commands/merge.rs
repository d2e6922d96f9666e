use std::time::Duration;

use anyhow::{bail, Result};
use legio_core::merge::conflict_history::ConflictHistoryStore;
use legio_core::merge::{resolve_target_branch, MergeResolver};
use legio_core::model::QueueStatus;
use legio_core::paths::ProjectPaths;
use legio_core::store::{MailStore, MergeQueueStore};

use crate::output;

pub fn run(branch: Option<String>, into: Option<String>, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let config = legio_core::config::LegioConfig::load(&paths.config_yaml()).unwrap_or_default();

    let queue = MergeQueueStore::new(paths.merge_queue_db());
    let mail = MailStore::new(paths.mail_db());
    let history = ConflictHistoryStore::new(paths.merge_queue_db());

    let entry = match branch {
        Some(ref b) => queue
            .list(None)?
            .into_iter()
            .find(|e| &e.branch == b && e.status == QueueStatus::Pending)
            .ok_or_else(|| anyhow::anyhow!("branch '{b}' is not pending in the merge queue"))?,
        None => queue.dequeue()?.ok_or_else(|| anyhow::anyhow!("merge queue is empty"))?,
    };

    let target = resolve_target_branch(
        into.as_deref(),
        &paths.session_branch_txt(),
        &config.project.canonical_branch,
    );

    let resolver = MergeResolver {
        repo_root: paths.root().to_path_buf(),
        queue: &queue,
        history: &history,
        mail: &mail,
        reimagine_command: config.merge.reimagine_command.clone(),
        reimagine_timeout: Duration::from_secs(config.merge.reimagine_timeout_secs),
    };

    let outcome = resolver.resolve(&entry, &target)?;
    if outcome.status == QueueStatus::Failed {
        output::emit(&serde_json::json!({ "branch": entry.branch, "tier": outcome.tier, "status": "failed" }), json);
        bail!("merge of '{}' failed at tier {:?}", entry.branch, outcome.tier);
    }

    output::emit(
        &serde_json::json!({ "branch": entry.branch, "target": target, "tier": outcome.tier, "status": outcome.status }),
        json,
    );
    Ok(())
}
