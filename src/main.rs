use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hostward::cli::{
    Commands, run_backup, run_backup_list, run_backup_verify, run_check_secrets, run_install,
    run_lint, run_status, run_test, run_uninstall,
};
use hostward::config::ServiceConfig;

#[derive(Parser)]
#[command(name = "hostward")]
#[command(about = "Install, remove, and back up a supervised service", long_about = None)]
struct Cli {
    /// Path to hostward.toml (defaults to ./hostward.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("hostward=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Install => run_install(&config)?,
        Commands::Uninstall {
            yes,
            non_interactive,
        } => run_uninstall(&config, yes, non_interactive)?,
        Commands::Status { json } => run_status(&config, json)?,
        Commands::Backup { list, verify, json } => match verify {
            Some(path) => run_backup_verify(&path, json)?,
            None if list => run_backup_list(&config, json)?,
            None => run_backup(&config)?,
        },
        Commands::Lint => run_lint(&config)?,
        Commands::Test => run_test(&config)?,
        Commands::CheckSecrets => run_check_secrets(&config)?,
    }

    Ok(())
}
