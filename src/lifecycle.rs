//! Install and uninstall of the service as fixed step sequences.
//!
//! `install` is all-or-nothing up to supervisor registration and may be
//! re-run from any failure point. `uninstall` attempts every step and
//! always completes, collecting outcomes into a [`Report`].

use tracing::info;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::identity::{self, AccountDb};
use crate::permissions;
use crate::supervisor::{self, Supervisor};
use crate::types::{Report, ServiceStatus, StepOutcome};

pub struct Lifecycle<'a> {
    config: &'a ServiceConfig,
    accounts: &'a dyn AccountDb,
    supervisor: &'a dyn Supervisor,
}

impl<'a> Lifecycle<'a> {
    pub fn new(
        config: &'a ServiceConfig,
        accounts: &'a dyn AccountDb,
        supervisor: &'a dyn Supervisor,
    ) -> Self {
        Self {
            config,
            accounts,
            supervisor,
        }
    }

    pub fn install(&self) -> Result<Report> {
        let unit = self.config.unit_name();
        let identity = self.config.identity();
        let mut report = Report::new();

        info!("Installing {unit}");

        // Start from a clean slate; leftovers of an earlier run are torn
        // down best-effort.
        if self.is_present(&unit)? {
            report.extend(supervisor::deregister(self.supervisor, &unit));
        } else {
            report.push(StepOutcome::skipped("deregister", "unit not present"));
        }

        let created = identity::provision(self.accounts, &identity)
            .map_err(|e| Error::at_step("provision account", e))?;
        report.push(if created {
            StepOutcome::done("provision account")
        } else {
            StepOutcome::skipped("provision account", "account exists")
        });

        identity::ensure_dir(&identity.data_dir)
            .map_err(|e| Error::at_step("create data directory", e))?;
        report.push(StepOutcome::done("create data directory"));

        let owner = self
            .accounts
            .lookup(&identity.account)
            .and_then(|found| {
                found.ok_or_else(|| {
                    Error::Provision(format!("account '{}' not found", identity.account))
                })
            })
            .map_err(|e| Error::at_step("set permissions", e))?;
        permissions::apply(&permissions::ownership_specs(self.config), &owner)
            .map_err(|e| Error::at_step("set permissions", e))?;
        report.push(StepOutcome::done("set permissions"));

        supervisor::register(self.supervisor, &unit, &self.config.unit_file)?;
        report.push(StepOutcome::done("register unit"));

        info!("Installed {unit}");
        Ok(report)
    }

    /// Never fails: each step's outcome lands in the report.
    pub fn uninstall(&self) -> Report {
        let unit = self.config.unit_name();
        let mut report = Report::new();

        info!("Uninstalling {unit}");
        report.extend(supervisor::deregister(self.supervisor, &unit));
        report.push(identity::deprovision(self.accounts, &self.config.account));

        if report.is_clean() {
            info!("Uninstalled {unit}");
        } else {
            tracing::warn!(
                "Uninstalled {unit} with {} failed step(s)",
                report.failures().count()
            );
        }
        report
    }

    pub fn status(&self) -> Result<ServiceStatus> {
        let unit = self.config.unit_name();
        Ok(ServiceStatus {
            name: self.config.name.clone(),
            account: self.accounts.lookup(&self.config.account)?,
            data_dir: self.config.data_dir.clone(),
            data_dir_exists: self.config.data_dir.is_dir(),
            config_file: self.config.config_file.clone(),
            config_file_mode: permissions::file_mode(&self.config.config_file),
            unit: supervisor::unit_state(self.supervisor, &unit, &self.config.unit_file)?,
        })
    }

    fn is_present(&self, unit: &str) -> Result<bool> {
        let registered = self
            .supervisor
            .is_registered(unit)
            .map_err(|e| Error::at_step("inspect unit", e))?;
        let enabled = self
            .supervisor
            .is_enabled(unit)
            .map_err(|e| Error::at_step("inspect unit", e))?;
        Ok(registered || enabled)
    }
}
