use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Provision the runtime account, fix ownership, and start the unit
    Install,

    /// Stop and remove the unit, then remove the runtime account
    Uninstall {
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,

        /// Fail instead of prompting (requires --yes)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Show account, data directory, and unit state
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Snapshot the remote data directory into the local backup directory
    Backup {
        /// List local archives instead of taking a backup
        #[arg(long, conflicts_with = "verify")]
        list: bool,

        /// Decode an archive and list its contents
        #[arg(long, value_name = "FILE")]
        verify: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the service's lint tool
    Lint,

    /// Run the service's test suite
    Test,

    /// Fail if a secret appears in tracked files outside the allow list
    CheckSecrets,
}
