//! Registration of the service unit with systemd.

use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::exec::{Cmd, CommandRunner, run_checked};
use crate::types::{Outcome, StepOutcome, SupervisorUnit};

/// Primitive verbs of the process supervisor.
pub trait Supervisor {
    /// Makes the descriptor at `descriptor` known to the supervisor.
    fn link(&self, descriptor: &Path) -> Result<()>;
    fn daemon_reload(&self) -> Result<()>;
    fn enable(&self, unit: &str) -> Result<()>;
    fn start(&self, unit: &str) -> Result<()>;
    /// Fails with `Error::UnitNotFound` when the unit is unknown.
    fn stop(&self, unit: &str) -> Result<()>;
    /// Fails with `Error::UnitNotFound` when the unit is unknown.
    fn disable(&self, unit: &str) -> Result<()>;
    fn is_registered(&self, unit: &str) -> Result<bool>;
    fn is_enabled(&self, unit: &str) -> Result<bool>;
    fn is_active(&self, unit: &str) -> Result<bool>;
}

pub struct Systemctl<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Systemctl<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    fn systemctl(&self, args: &[&str]) -> Result<()> {
        run_checked(self.runner, &Cmd::new("systemctl").args(args))
            .map(|_| ())
            .map_err(classify)
    }

    fn query(&self, args: &[&str]) -> Result<String> {
        let output = self.runner.run(&Cmd::new("systemctl").args(args))?;
        Ok(output.stdout.trim().to_string())
    }
}

/// Maps systemctl's "no such unit" failures to `Error::UnitNotFound`.
fn classify(err: Error) -> Error {
    match err {
        Error::CommandFailed {
            command, stderr, ..
        } if is_missing_unit(&stderr) => Error::UnitNotFound(format!("{command}: {stderr}")),
        Error::CommandFailed {
            command,
            status,
            stderr,
        } => Error::Supervisor(format!("`{command}` exited with {status}: {stderr}")),
        other => other,
    }
}

fn is_missing_unit(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    stderr.contains("not loaded") || stderr.contains("not found") || stderr.contains("does not exist")
}

impl Supervisor for Systemctl<'_> {
    fn link(&self, descriptor: &Path) -> Result<()> {
        let descriptor = descriptor.to_string_lossy();
        self.systemctl(&["link", descriptor.as_ref()])
    }

    fn daemon_reload(&self) -> Result<()> {
        self.systemctl(&["daemon-reload"])
    }

    fn enable(&self, unit: &str) -> Result<()> {
        self.systemctl(&["enable", unit])
    }

    fn start(&self, unit: &str) -> Result<()> {
        self.systemctl(&["start", unit])
    }

    fn stop(&self, unit: &str) -> Result<()> {
        self.systemctl(&["stop", unit])
    }

    fn disable(&self, unit: &str) -> Result<()> {
        self.systemctl(&["disable", unit])
    }

    fn is_registered(&self, unit: &str) -> Result<bool> {
        let state = self.query(&["show", "--property=LoadState", "--value", unit])?;
        Ok(state == "loaded")
    }

    fn is_enabled(&self, unit: &str) -> Result<bool> {
        let state = self.query(&["is-enabled", unit])?;
        Ok(matches!(state.as_str(), "enabled" | "enabled-runtime"))
    }

    fn is_active(&self, unit: &str) -> Result<bool> {
        Ok(self.query(&["is-active", unit])? == "active")
    }
}

/// Links, reloads, enables, and starts the unit, stopping at the first
/// failure. The reload always precedes enable and start.
pub fn register(supervisor: &dyn Supervisor, unit: &str, descriptor: &Path) -> Result<()> {
    if !descriptor.is_file() {
        return Err(Error::at_step(
            "link unit",
            Error::Supervisor(format!("descriptor not found: {}", descriptor.display())),
        ));
    }

    supervisor
        .link(descriptor)
        .map_err(|e| Error::at_step("link unit", e))?;
    supervisor
        .daemon_reload()
        .map_err(|e| Error::at_step("reload units", e))?;
    supervisor
        .enable(unit)
        .map_err(|e| Error::at_step("enable unit", e))?;
    supervisor
        .start(unit)
        .map_err(|e| Error::at_step("start unit", e))?;

    info!("Registered and started {unit}");
    Ok(())
}

/// Stops, disables, and reloads. Every step is attempted regardless of
/// earlier failures; an unknown unit counts as already torn down.
pub fn deregister(supervisor: &dyn Supervisor, unit: &str) -> Vec<StepOutcome> {
    let tolerate_missing = |result: Result<()>| match result {
        Ok(()) => Ok(Outcome::Done),
        Err(Error::UnitNotFound(detail)) => Ok(Outcome::Skipped(detail)),
        Err(e) => Err(e),
    };

    let stop = StepOutcome::from_result("stop unit", tolerate_missing(supervisor.stop(unit)));
    let disable =
        StepOutcome::from_result("disable unit", tolerate_missing(supervisor.disable(unit)));
    let reload = StepOutcome::from_result(
        "reload units",
        supervisor.daemon_reload().map(|()| Outcome::Done),
    );

    vec![stop, disable, reload]
}

/// Queries the supervisor for the unit's current state.
pub fn unit_state(supervisor: &dyn Supervisor, unit: &str, descriptor: &Path) -> Result<SupervisorUnit> {
    Ok(SupervisorUnit {
        unit: unit.to_string(),
        descriptor: descriptor.to_path_buf(),
        registered: supervisor.is_registered(unit)?,
        enabled: supervisor.is_enabled(unit)?,
        running: supervisor.is_active(unit)?,
    })
}
