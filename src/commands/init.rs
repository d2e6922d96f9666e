use anyhow::{bail, Result};
use legio_core::config::LegioConfig;
use legio_core::paths::ProjectPaths;

use crate::output;

pub fn run(force: bool, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);

    if paths.config_yaml().exists() && !force {
        bail!(".legio/config.yaml already exists (pass --force to overwrite)");
    }

    paths.ensure_skeleton()?;
    let config = LegioConfig::default();
    std::fs::write(paths.config_yaml(), config.to_yaml()?)?;

    if !paths.agent_manifest().exists() {
        std::fs::write(paths.agent_manifest(), "{}\n")?;
    }
    if !paths.hooks_json().exists() {
        std::fs::write(paths.hooks_json(), "{}\n")?;
    }

    let gitignore = paths.legio_dir().join(".gitignore");
    if !gitignore.exists() {
        std::fs::write(
            &gitignore,
            "*\n!config.yaml\n!agent-manifest.json\n!hooks.json\n!agent-defs/\n",
        )?;
    }

    output::emit(
        &serde_json::json!({ "initialized": true, "root": paths.root() }),
        json,
    );
    Ok(())
}
