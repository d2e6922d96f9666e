use anyhow::{bail, Result};
use legio_core::paths::ProjectPaths;
use serde_json::json;

use crate::cli::HooksCommands;
use crate::output;

const EVENTS: &[&str] = &[
    "SessionStart",
    "UserPromptSubmit",
    "PreToolUse",
    "PostToolUse",
    "Stop",
    "PreCompact",
];

fn hook_command(event: &str) -> String {
    let subcommand = event
        .chars()
        .enumerate()
        .map(|(i, c)| if i > 0 && c.is_uppercase() { format!("-{c}") } else { c.to_string() })
        .collect::<String>()
        .to_lowercase();
    format!("legio hook {subcommand}")
}

pub fn run(cmd: HooksCommands, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let paths = ProjectPaths::discover(&cwd);
    let hooks_path = paths.hooks_json();

    match cmd {
        HooksCommands::Install { force } => {
            if hooks_path.exists() && !force {
                bail!("hooks.json already exists; pass --force to overwrite");
            }
            let mut table = serde_json::Map::new();
            for event in EVENTS {
                table.insert((*event).to_string(), serde_json::Value::String(hook_command(event)));
            }
            std::fs::write(&hooks_path, serde_json::to_string_pretty(&table)?)?;
            output::emit(&json!({ "installed": EVENTS }), json);
        }
        HooksCommands::Uninstall => {
            let _ = std::fs::remove_file(&hooks_path);
            output::emit(&json!({ "uninstalled": true }), json);
        }
        HooksCommands::Status => {
            let installed = hooks_path.exists();
            let table: serde_json::Value = if installed {
                serde_json::from_str(&std::fs::read_to_string(&hooks_path)?)?
            } else {
                json!({})
            };
            output::emit(&json!({ "installed": installed, "hooks": table }), json);
        }
    }
    Ok(())
}
