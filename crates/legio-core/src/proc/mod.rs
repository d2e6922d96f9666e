//! §4.A Process & terminal-multiplexer adapter.

mod tmux;
mod tree_kill;

pub use tmux::TmuxAdapter;
pub use tree_kill::{descendant_pids, kill_session_tree, process_alive};
