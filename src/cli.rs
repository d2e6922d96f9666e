use clap::{Parser, Subcommand, ValueEnum};

/// Local multi-agent coding orchestrator.
///
/// legio spawns interactive LLM coding-agent processes into isolated git
/// worktrees, routes typed mail between them, supervises liveness with a
/// watchdog, and serialises integration back into a canonical branch
/// through a tiered merge pipeline.
#[derive(Parser)]
#[command(name = "legio")]
#[command(version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Print shell completions for the given shell and exit.
    #[arg(long, value_enum, global = true)]
    pub completions: Option<Shell>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scaffold `.legio/` in the current repository.
    Init {
        /// Overwrite an existing `.legio/` directory.
        #[arg(long)]
        force: bool,
    },

    /// Start the HTTP/WebSocket server and the background coordinator tasks.
    Up {
        #[arg(long, default_value_t = 4317)]
        port: u16,
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long)]
        no_open: bool,
        #[arg(long)]
        force: bool,
    },

    /// Stop a running `legio up` instance.
    Down,

    /// Spawn a new agent session with the given capability.
    Sling {
        capability: String,
        #[arg(long)]
        task: String,
        #[arg(long)]
        parent: Option<String>,
    },

    /// Print an agent's activation context (overlay + identity) to stdout.
    Prime {
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        compact: bool,
    },

    /// Summarise active sessions, mail, and the merge queue.
    Status {
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show one agent's session record and recent terminal output.
    Inspect {
        agent: String,
        #[arg(long)]
        follow: bool,
    },

    /// Check that required external tools are reachable.
    Doctor,

    /// Capability catalogue operations.
    #[command(subcommand)]
    Agents(AgentsCommands),

    /// Typed mail operations.
    #[command(subcommand)]
    Mail(MailCommands),

    /// Deliver text into an agent's terminal session.
    Nudge {
        agent: String,
        message: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        force: bool,
    },

    /// Dequeue and integrate one branch from the merge queue.
    Merge {
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        into: Option<String>,
    },

    /// Git worktree operations.
    #[command(subcommand)]
    Worktree(WorktreeCommands),

    /// The in-process watchdog + mail-routing coordinator.
    #[command(subcommand)]
    Coordinator(CoordinatorCommands),

    /// The autopilot daemon (auto-merge on `merge_ready` mail).
    #[command(subcommand)]
    Autopilot(AutopilotCommands),

    /// Orchestration-run operations.
    #[command(subcommand)]
    Run(RunCommands),

    /// Print the active run's coordinator/agent tree.
    Trace,

    /// Print the event log.
    Logs {
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        until: Option<String>,
        #[arg(long)]
        follow: bool,
    },

    /// Alias for `logs` without session-scoped filters.
    Events,

    /// Tool-use cost/latency summary.
    Costs {
        #[arg(long)]
        live: bool,
    },

    /// Stream the observability snapshot to the terminal.
    Feed {
        #[arg(long)]
        follow: bool,
    },

    /// Remove durable state under `.legio/`.
    Clean {
        #[arg(long)]
        all: bool,
        #[arg(long)]
        mail: bool,
        #[arg(long)]
        sessions: bool,
        #[arg(long)]
        metrics: bool,
        #[arg(long)]
        logs: bool,
        #[arg(long)]
        worktrees: bool,
        #[arg(long)]
        branches: bool,
        #[arg(long)]
        agents: bool,
        #[arg(long)]
        specs: bool,
    },

    /// Lifecycle-hook command registration for the external agent runtime.
    #[command(subcommand)]
    Hooks(HooksCommands),

    /// Internal: invoked by the external agent runtime at a lifecycle hook,
    /// reading the hook JSON from stdin.
    #[command(hide = true, subcommand)]
    Hook(HookCommands),

    /// Internal: runs the watchdog/autopilot tick loops in the foreground,
    /// launched by `coordinator start` inside its tmux session.
    #[command(hide = true, name = "hidden-internal-loop")]
    HiddenInternalLoop {
        #[arg(long)]
        watchdog: bool,
        #[arg(long)]
        monitor: bool,
    },
}

#[derive(Subcommand)]
pub enum AgentsCommands {
    /// List known or active capabilities.
    Discover {
        #[arg(long)]
        capability: Option<String>,
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum MailCommands {
    /// Send a message, expanding `@group` recipients.
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
        #[arg(long, default_value = "status")]
        r#type: String,
        #[arg(long)]
        thread: Option<String>,
    },
    /// Count unread mail for an agent.
    Check {
        #[arg(long)]
        agent: String,
    },
    /// List mail, optionally filtered.
    List {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        unread_only: bool,
    },
    /// Print one message and mark it read.
    Read { id: String },
    /// Reply to a message, inheriting its thread.
    Reply {
        id: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        body: String,
    },
}

#[derive(Subcommand)]
pub enum WorktreeCommands {
    List,
    Clean,
}

#[derive(Subcommand)]
pub enum CoordinatorCommands {
    Start {
        #[arg(long)]
        attach: bool,
        #[arg(long)]
        watchdog: bool,
        #[arg(long)]
        monitor: bool,
    },
    Stop,
    Status,
}

#[derive(Subcommand)]
pub enum AutopilotCommands {
    Start,
    Stop,
    Status,
}

#[derive(Subcommand)]
pub enum RunCommands {
    List,
    Show { id: String },
    Complete { id: String },
}

#[derive(Subcommand)]
pub enum HooksCommands {
    Install {
        #[arg(long)]
        force: bool,
    },
    Uninstall,
    Status,
}

#[derive(Subcommand)]
pub enum HookCommands {
    SessionStart,
    UserPromptSubmit,
    PreToolUse,
    PostToolUse,
    Stop,
    PreCompact,
}
