//! `legio` — local multi-agent coding orchestrator CLI and server.

mod cli;
mod commands;
mod output;
mod telemetry;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use legio_core::error::LegioError;

fn main() {
    let cli = Cli::parse();
    let _guard = telemetry::init();

    if let Some(shell) = cli.completions {
        print_completions(shell);
        return;
    }

    let Some(command) = cli.command else {
        Cli::command().print_help().ok();
        println!();
        return;
    };

    if let Err(err) = dispatch(command, cli.json) {
        report_error(&err);
        std::process::exit(exit_code(&err));
    }
}

fn print_completions(shell: cli::Shell) {
    use clap_complete::{generate, Shell as ClapShell};
    let clap_shell = match shell {
        cli::Shell::Bash => ClapShell::Bash,
        cli::Shell::Zsh => ClapShell::Zsh,
        cli::Shell::Fish => ClapShell::Fish,
    };
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(clap_shell, &mut cmd, name, &mut std::io::stdout());
}

fn dispatch(command: Commands, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Init { force } => commands::init_run(force, json),
        Commands::Up { port, host, no_open, force } => commands::up_run(port, host, no_open, force, json),
        Commands::Down => commands::down_run(json),
        Commands::Sling { capability, task, parent } => commands::sling_run(capability, task, parent, json),
        Commands::Prime { agent, compact } => commands::prime_run(agent, compact, json),
        Commands::Status { verbose } => commands::status_run(verbose, json),
        Commands::Inspect { agent, follow } => commands::inspect_run(agent, follow, json),
        Commands::Doctor => commands::doctor_run(json),
        Commands::Agents(cmd) => match cmd {
            cli::AgentsCommands::Discover { capability, all } => commands::agents_run(capability, all, json),
        },
        Commands::Mail(cmd) => commands::mail_run(cmd, json),
        Commands::Nudge { agent, message, from, force } => commands::nudge_run(agent, message, from, force, json),
        Commands::Merge { branch, into } => commands::merge_run(branch, into, json),
        Commands::Worktree(cmd) => commands::worktree_run(cmd, json),
        Commands::Coordinator(cmd) => commands::coordinator_run(cmd, json),
        Commands::Autopilot(cmd) => commands::autopilot_run(cmd, json),
        Commands::Run(cmd) => commands::run_run(cmd, json),
        Commands::Trace => commands::trace_run(json),
        Commands::Logs { agent, level, since, until, follow } => {
            commands::logs_run(agent, level, since, until, follow, json)
        }
        Commands::Events => commands::events_run(json),
        Commands::Costs { live } => commands::costs_run(live, json),
        Commands::Feed { follow } => commands::feed_run(follow, json),
        Commands::Clean { all, mail, sessions, metrics, logs, worktrees, branches, agents, specs } => {
            commands::clean_run(all, mail, sessions, metrics, logs, worktrees, branches, agents, specs, json)
        }
        Commands::Hooks(cmd) => commands::hooks_run(cmd, json),
        Commands::Hook(cmd) => commands::hook_run(cmd),
        Commands::HiddenInternalLoop { watchdog, monitor } => commands::coordinator_internal_loop(watchdog, monitor),
    }
}

fn report_error(err: &anyhow::Error) {
    if let Some(legio_err) = err.downcast_ref::<LegioError>() {
        let (kind, fields) = classify(legio_err);
        eprintln!("{}", serde_json::json!({ "error": legio_err.to_string(), "kind": kind, "fields": fields }));
    } else {
        eprintln!("{}", serde_json::json!({ "error": err.to_string(), "kind": "Error" }));
    }
}

fn classify(err: &LegioError) -> (&'static str, serde_json::Value) {
    match err {
        LegioError::Validation { field, reason } => {
            ("ValidationError", serde_json::json!({ "field": field, "reason": reason }))
        }
        LegioError::Agent { agent, detail } => ("AgentError", serde_json::json!({ "agent": agent, "detail": detail })),
        LegioError::Merge { branch, tier, detail } => {
            ("MergeError", serde_json::json!({ "branch": branch, "tier": tier, "detail": detail }))
        }
        LegioError::Server { detail } => ("ServerError", serde_json::json!({ "detail": detail })),
        LegioError::NotFound { kind, id } => ("NotFoundError", serde_json::json!({ "kind": kind, "id": id })),
        LegioError::Config { path, detail } => {
            ("ConfigError", serde_json::json!({ "path": path.display().to_string(), "detail": detail }))
        }
        LegioError::Io(e) => ("IoError", serde_json::json!({ "detail": e.to_string() })),
        LegioError::Sqlite(e) => ("StoreError", serde_json::json!({ "detail": e.to_string() })),
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<LegioError>() {
        Some(LegioError::Validation { .. }) => 2,
        _ => 1,
    }
}
