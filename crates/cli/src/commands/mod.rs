use clap::Subcommand;

pub mod task;

use self::task::TaskCommands;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the targets in the bolt inventory
    #[command(visible_alias = "i")]
    Inventory,

    /// Gather facts from a node
    Facts {
        /// Target name
        node: String,
    },

    /// Run a shell command on a node
    Run {
        /// Target name
        node: String,

        /// Command to run; remaining arguments are joined with spaces
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// List, describe or run tasks
    #[command(visible_alias = "t")]
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Trigger a puppet agent run on a node
    Puppet {
        /// Target name
        node: String,

        /// Simulate changes only
        #[arg(long)]
        noop: bool,

        /// Enforce changes even where the node defaults to noop
        #[arg(long, conflicts_with = "noop")]
        no_noop: bool,

        /// Only apply resources with these tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Puppet environment to use
        #[arg(long)]
        environment: Option<String>,

        /// Run the agent with debug output
        #[arg(long)]
        debug: bool,
    },

    /// Install a package on a node
    Package {
        /// Target name
        node: String,

        /// Package name
        name: String,

        /// Version to install
        #[arg(long)]
        version: Option<String>,
    },
}
