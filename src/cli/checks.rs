use crate::config::ServiceConfig;
use crate::error::Error;
use crate::exec::{Cmd, SystemRunner, run_interactive};
use crate::secrets;

pub fn run_lint(config: &ServiceConfig) -> anyhow::Result<()> {
    run_tool("lint", &config.checks.lint, config)
}

pub fn run_test(config: &ServiceConfig) -> anyhow::Result<()> {
    run_tool("test", &config.checks.test, config)
}

fn run_tool(label: &str, argv: &[String], config: &ServiceConfig) -> anyhow::Result<()> {
    let Some(cmd) = Cmd::from_argv(argv) else {
        anyhow::bail!("No {label} command configured (checks.{label})");
    };
    let status = run_interactive(&cmd, &config.home_dir)?;
    if !status.success() {
        anyhow::bail!("{label} failed: `{cmd}` exited with {status}");
    }
    Ok(())
}

pub fn run_check_secrets(config: &ServiceConfig) -> anyhow::Result<()> {
    let files = secrets::tracked_files(&SystemRunner, &config.home_dir)?;
    let findings = secrets::scan(
        &config.home_dir,
        &files,
        &config.checks.patterns,
        &config.checks.allow,
    )?;

    if findings.is_empty() {
        println!("No secrets found in {} file(s)", files.len());
        return Ok(());
    }

    for finding in &findings {
        println!(
            "{}:{}: contains '{}'",
            finding.path.display(),
            finding.line,
            finding.pattern
        );
    }
    Err(Error::SecretsFound(findings.len()).into())
}
