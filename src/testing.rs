//! In-memory stand-ins for the host's account database, supervisor, and
//! command execution.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use nix::unistd::{getgid, getuid};

use crate::error::{Error, Result};
use crate::exec::{Cmd, CmdOutput, CommandRunner};
use crate::identity::AccountDb;
use crate::supervisor::Supervisor;
use crate::types::{Account, ServiceIdentity};

/// Shared, ordered log of calls made against the fakes.
pub type Trace = Rc<RefCell<Vec<String>>>;

#[derive(Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<String>>,
    failures: RefCell<Vec<(String, String)>>,
    responses: RefCell<Vec<(String, String)>>,
}

impl RecordingRunner {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Commands whose rendering starts with `prefix` exit 1 with `stderr`.
    pub fn fail_with(&self, prefix: &str, stderr: &str) {
        self.failures
            .borrow_mut()
            .push((prefix.to_string(), stderr.to_string()));
    }

    /// Commands whose rendering starts with `prefix` print `stdout`.
    pub fn respond(&self, prefix: &str, stdout: &str) {
        self.responses
            .borrow_mut()
            .push((prefix.to_string(), stdout.to_string()));
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &Cmd) -> Result<CmdOutput> {
        let rendered = cmd.to_string();
        self.calls.borrow_mut().push(rendered.clone());

        if let Some((_, stderr)) = self
            .failures
            .borrow()
            .iter()
            .find(|(prefix, _)| rendered.starts_with(prefix))
        {
            return Ok(CmdOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.clone(),
            });
        }

        let stdout = self
            .responses
            .borrow()
            .iter()
            .find(|(prefix, _)| rendered.starts_with(prefix))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(CmdOutput {
            success: true,
            code: Some(0),
            stdout,
            stderr: String::new(),
        })
    }
}

/// Accounts are created with the test process's own uid/gid so ownership
/// changes succeed without privileges.
#[derive(Default)]
pub struct FakeAccounts {
    accounts: RefCell<BTreeMap<String, Account>>,
    creates: Cell<usize>,
    fail_create: Cell<bool>,
    fail_remove: Cell<bool>,
    trace: Trace,
}

impl FakeAccounts {
    pub fn with_trace(trace: Trace) -> Self {
        Self {
            trace,
            ..Self::default()
        }
    }

    pub fn create_calls(&self) -> usize {
        self.creates.get()
    }

    pub fn fail_create(&self) {
        self.fail_create.set(true);
    }

    pub fn fail_remove(&self) {
        self.fail_remove.set(true);
    }

    pub fn names(&self) -> Vec<String> {
        self.accounts.borrow().keys().cloned().collect()
    }
}

impl AccountDb for FakeAccounts {
    fn lookup(&self, name: &str) -> Result<Option<Account>> {
        Ok(self.accounts.borrow().get(name).cloned())
    }

    fn create(&self, identity: &ServiceIdentity) -> Result<()> {
        self.trace.borrow_mut().push("useradd".to_string());
        self.creates.set(self.creates.get() + 1);
        if self.fail_create.get() {
            return Err(Error::Provision("useradd: permission denied".into()));
        }
        if self.accounts.borrow().contains_key(&identity.account) {
            return Err(Error::Provision(format!(
                "useradd: user '{}' already exists",
                identity.account
            )));
        }
        self.accounts.borrow_mut().insert(
            identity.account.clone(),
            Account {
                name: identity.account.clone(),
                uid: getuid().as_raw(),
                gid: getgid().as_raw(),
                home_dir: identity.home_dir.clone(),
            },
        );
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.trace.borrow_mut().push("userdel".to_string());
        if self.fail_remove.get() {
            return Err(Error::Provision("userdel: user is logged in".into()));
        }
        if self.accounts.borrow_mut().remove(name).is_none() {
            return Err(Error::Provision(format!("userdel: user '{name}' does not exist")));
        }
        Ok(())
    }
}

#[derive(Default, Clone, Copy)]
struct UnitFlags {
    linked: bool,
    enabled: bool,
    running: bool,
}

/// Models a systemd that only sees linked units after a daemon-reload.
#[derive(Default)]
pub struct FakeSupervisor {
    loaded: Cell<bool>,
    units: RefCell<BTreeMap<String, UnitFlags>>,
    failing: RefCell<HashSet<&'static str>>,
    trace: Trace,
}

impl FakeSupervisor {
    pub fn with_trace(trace: Trace) -> Self {
        Self {
            trace,
            ..Self::default()
        }
    }

    pub fn trace(&self) -> Vec<String> {
        self.trace.borrow().clone()
    }

    pub fn fail_on(&self, verb: &'static str) {
        self.failing.borrow_mut().insert(verb);
    }

    pub fn clear_failures(&self) {
        self.failing.borrow_mut().clear();
    }

    fn call(&self, verb: &'static str) -> Result<()> {
        self.trace.borrow_mut().push(verb.to_string());
        if self.failing.borrow().contains(verb) {
            return Err(Error::Supervisor(format!("{verb} failed")));
        }
        Ok(())
    }

    fn loaded_unit(&self, unit: &str) -> Result<UnitFlags> {
        match self.units.borrow().get(unit) {
            Some(flags) if flags.linked && self.loaded.get() => Ok(*flags),
            _ => Err(Error::UnitNotFound(format!("Unit {unit} not loaded."))),
        }
    }

    fn update(&self, unit: &str, f: impl FnOnce(&mut UnitFlags)) {
        if let Some(flags) = self.units.borrow_mut().get_mut(unit) {
            f(flags);
        }
    }
}

impl Supervisor for FakeSupervisor {
    fn link(&self, descriptor: &Path) -> Result<()> {
        self.call("link")?;
        let unit = descriptor
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.units.borrow_mut().entry(unit).or_default().linked = true;
        self.loaded.set(false);
        Ok(())
    }

    fn daemon_reload(&self) -> Result<()> {
        self.call("daemon-reload")?;
        self.units.borrow_mut().retain(|_, flags| flags.linked);
        self.loaded.set(true);
        Ok(())
    }

    fn enable(&self, unit: &str) -> Result<()> {
        self.call("enable")?;
        self.loaded_unit(unit)?;
        self.update(unit, |f| f.enabled = true);
        Ok(())
    }

    fn start(&self, unit: &str) -> Result<()> {
        self.call("start")?;
        self.loaded_unit(unit)?;
        self.update(unit, |f| f.running = true);
        Ok(())
    }

    fn stop(&self, unit: &str) -> Result<()> {
        self.call("stop")?;
        self.loaded_unit(unit)?;
        self.update(unit, |f| f.running = false);
        Ok(())
    }

    fn disable(&self, unit: &str) -> Result<()> {
        self.call("disable")?;
        if !self.units.borrow().contains_key(unit) {
            return Err(Error::UnitNotFound(format!("Unit file {unit} does not exist.")));
        }
        self.update(unit, |f| {
            f.enabled = false;
            f.linked = false;
        });
        Ok(())
    }

    fn is_registered(&self, unit: &str) -> Result<bool> {
        Ok(self.loaded_unit(unit).is_ok())
    }

    fn is_enabled(&self, unit: &str) -> Result<bool> {
        Ok(self.units.borrow().get(unit).is_some_and(|f| f.enabled))
    }

    fn is_active(&self, unit: &str) -> Result<bool> {
        Ok(self.units.borrow().get(unit).is_some_and(|f| f.running))
    }
}
