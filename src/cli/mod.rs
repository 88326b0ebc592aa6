mod backup;
mod checks;
mod commands;
mod lifecycle;

pub use backup::{run_backup, run_backup_list, run_backup_verify};
pub use checks::{run_check_secrets, run_lint, run_test};
pub use commands::Commands;
pub use lifecycle::{run_install, run_status, run_uninstall};

/// Ask before a destructive operation unless `--yes` was given.
pub fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        anyhow::bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}

fn require_root(operation: &str) -> anyhow::Result<()> {
    if !nix::unistd::geteuid().is_root() {
        anyhow::bail!("'{operation}' must be run as root (try sudo)");
    }
    Ok(())
}
