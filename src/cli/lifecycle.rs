use crate::config::ServiceConfig;
use crate::exec::SystemRunner;
use crate::identity::SystemAccounts;
use crate::lifecycle::Lifecycle;
use crate::supervisor::Systemctl;

use super::{confirm_action, require_root};

pub fn run_install(config: &ServiceConfig) -> anyhow::Result<()> {
    require_root("install")?;

    let runner = SystemRunner;
    let accounts = SystemAccounts::new(&runner);
    let systemctl = Systemctl::new(&runner);
    let report = Lifecycle::new(config, &accounts, &systemctl).install()?;

    println!();
    println!("Installed {}", config.unit_name());
    print!("{report}");
    println!();

    Ok(())
}

pub fn run_uninstall(config: &ServiceConfig, yes: bool, non_interactive: bool) -> anyhow::Result<()> {
    require_root("uninstall")?;

    let message = format!(
        "Stop {} and remove account '{}'?",
        config.unit_name(),
        config.account
    );
    if !confirm_action(&message, yes, non_interactive)? {
        println!("Aborted.");
        return Ok(());
    }

    let runner = SystemRunner;
    let accounts = SystemAccounts::new(&runner);
    let systemctl = Systemctl::new(&runner);
    let report = Lifecycle::new(config, &accounts, &systemctl).uninstall();

    println!();
    if report.is_clean() {
        println!("Uninstalled {}", config.unit_name());
    } else {
        println!(
            "Uninstalled {} ({} step(s) failed, see above)",
            config.unit_name(),
            report.failures().count()
        );
    }
    print!("{report}");
    println!("Data directory kept at {}", config.data_dir.display());
    println!();

    Ok(())
}

pub fn run_status(config: &ServiceConfig, json: bool) -> anyhow::Result<()> {
    let runner = SystemRunner;
    let accounts = SystemAccounts::new(&runner);
    let systemctl = Systemctl::new(&runner);
    let status = Lifecycle::new(config, &accounts, &systemctl).status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let yes_no = |flag: bool| if flag { "yes" } else { "no" };

    println!();
    println!("Service {}", status.name);
    println!("{}", "─".repeat(20));
    match &status.account {
        Some(account) => println!(
            "Account:     {} (uid {}, gid {})",
            account.name, account.uid, account.gid
        ),
        None => println!("Account:     {} (absent)", config.account),
    }
    println!(
        "Data dir:    {} ({})",
        status.data_dir.display(),
        if status.data_dir_exists { "present" } else { "absent" }
    );
    match status.config_file_mode {
        Some(mode) if mode.is_owner_only() => {
            println!("Config:      {} (mode {mode})", status.config_file.display());
        }
        Some(mode) => println!(
            "Config:      {} (mode {mode}, readable by others; run install)",
            status.config_file.display()
        ),
        None => println!("Config:      {} (absent)", status.config_file.display()),
    }
    println!("Unit:        {}", status.unit.unit);
    println!("  loaded:    {}", yes_no(status.unit.registered));
    println!("  enabled:   {}", yes_no(status.unit.enabled));
    println!("  running:   {}", yes_no(status.unit.running));
    println!();

    Ok(())
}
