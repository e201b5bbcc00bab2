use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about = "lvlup - arkade CLI tool manager", long_about = None)]
pub struct CLI {
    #[command(subcommand)]
    pub(crate) command: Option<LvlupCommand>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub(crate) verbose: u8,
    /// Only log errors
    #[clap(short, long, global = true)]
    pub(crate) quiet: bool,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum LvlupCommand {
    /// Sync the arkade bin directory with `lvlup.yaml`. Installs declared tools that are missing
    Sync {
        /// Prune tools not in `lvlup.yaml` and re-install every declared tool
        #[clap(short, long)]
        force: bool,
        /// Show arkade outputs
        #[clap(short, long)]
        passthrough: bool,
    },
    /// Add tools to `lvlup.yaml` and install them. Names may also be comma separated
    Get {
        #[clap(required = true, num_args = 1..)]
        tools: Vec<String>,
        /// Re-install tools that are already present
        #[clap(short, long)]
        force: bool,
        /// Show arkade outputs
        #[clap(short, long)]
        passthrough: bool,
    },
    /// Remove tools from `lvlup.yaml` and delete their binaries
    Remove {
        #[clap(required = true, num_args = 1..)]
        tools: Vec<String>,
    },
    /// Show the PATH setup for your shell's rc file
    ConfigShell,
}
