//! Runtime account provisioning.
//!
//! The account database is external shared state, so every mutation is
//! preceded by a lookup and the calls are safe to repeat.

use std::fs;
use std::path::Path;

use nix::unistd;
use tracing::info;

use crate::error::{Error, Result};
use crate::exec::{Cmd, CommandRunner, run_checked};
use crate::types::{Account, Outcome, ServiceIdentity, StepOutcome};

pub trait AccountDb {
    fn lookup(&self, name: &str) -> Result<Option<Account>>;

    /// Creates a system account with its own group, no login shell, and
    /// `identity.home_dir` as home.
    fn create(&self, identity: &ServiceIdentity) -> Result<()>;

    /// Removes the account and its primary group. Never touches the home
    /// or data directories.
    fn remove(&self, name: &str) -> Result<()>;
}

/// Account database of the local host: lookups through `getpwnam`,
/// mutations through `useradd`/`userdel`.
pub struct SystemAccounts<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> SystemAccounts<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }
}

fn nologin_shell() -> &'static str {
    if Path::new("/usr/sbin/nologin").exists() {
        "/usr/sbin/nologin"
    } else {
        "/usr/bin/nologin"
    }
}

impl AccountDb for SystemAccounts<'_> {
    fn lookup(&self, name: &str) -> Result<Option<Account>> {
        let user = unistd::User::from_name(name).map_err(|source| Error::AccountLookup {
            name: name.to_string(),
            source,
        })?;
        Ok(user.map(|u| Account {
            name: u.name,
            uid: u.uid.as_raw(),
            gid: u.gid.as_raw(),
            home_dir: u.dir,
        }))
    }

    fn create(&self, identity: &ServiceIdentity) -> Result<()> {
        let cmd = Cmd::new("useradd")
            .args(["--system", "--user-group", "--home-dir"])
            .arg(identity.home_dir.to_string_lossy())
            .args(["--shell", nologin_shell()])
            .arg(&identity.account);
        run_checked(self.runner, &cmd)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        run_checked(self.runner, &Cmd::new("userdel").arg(name))?;
        Ok(())
    }
}

/// Ensures the account exists. Returns true if it had to be created.
pub fn provision(accounts: &dyn AccountDb, identity: &ServiceIdentity) -> Result<bool> {
    ensure_dir(&identity.home_dir)?;

    if let Some(existing) = accounts.lookup(&identity.account)? {
        info!(
            "Account '{}' already exists (uid {})",
            existing.name, existing.uid
        );
        return Ok(false);
    }

    accounts
        .create(identity)
        .map_err(|e| Error::Provision(format!("cannot create account '{}': {e}", identity.account)))?;

    let created = accounts.lookup(&identity.account)?;
    if created.is_none() {
        return Err(Error::Provision(format!(
            "account '{}' still unresolved after creation",
            identity.account
        )));
    }

    info!("Created account '{}'", identity.account);
    Ok(true)
}

/// Removes the account if present. Failures are reported, not raised.
pub fn deprovision(accounts: &dyn AccountDb, account: &str) -> StepOutcome {
    let result = accounts.lookup(account).and_then(|found| match found {
        None => Ok(Outcome::Skipped(format!("account '{account}' absent"))),
        Some(_) => {
            accounts.remove(account)?;
            info!("Removed account '{account}'");
            Ok(Outcome::Done)
        }
    });
    StepOutcome::from_result("remove account", result)
}

/// Creates `path` and its parents if missing.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(Error::Provision(format!(
            "path exists but is not a directory: {}",
            path.display()
        )));
    }
    fs::create_dir_all(path)
        .map_err(|e| Error::Provision(format!("cannot create {}: {e}", path.display())))?;
    info!("Created directory {}", path.display());
    Ok(())
}
