use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus};

use crate::error::{Error, Result};

/// An external command: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Builds a command from an argv vector; `None` when it is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args))
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "signal".to_string(),
        }
    }
}

/// Seam for every mutating call into the host (systemctl, useradd, ...).
pub trait CommandRunner {
    fn run(&self, cmd: &Cmd) -> Result<CmdOutput>;
}

/// Runs commands on the local host, capturing their output.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &Cmd) -> Result<CmdOutput> {
        tracing::debug!("exec: {cmd}");
        let output = cmd
            .to_command()
            .output()
            .map_err(|source| Error::CommandSpawn {
                command: cmd.to_string(),
                source,
            })?;
        Ok(CmdOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Runs `cmd` and turns a non-zero exit into `Error::CommandFailed`.
pub fn run_checked(runner: &dyn CommandRunner, cmd: &Cmd) -> Result<CmdOutput> {
    let output = runner.run(cmd)?;
    if !output.success {
        return Err(Error::CommandFailed {
            command: cmd.to_string(),
            status: output.status_text(),
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}

/// Runs `cmd` in `dir` with the terminal attached, for operator-facing tools.
pub fn run_interactive(cmd: &Cmd, dir: &Path) -> Result<ExitStatus> {
    tracing::debug!("exec in {}: {cmd}", dir.display());
    cmd.to_command()
        .current_dir(dir)
        .status()
        .map_err(|source| Error::CommandSpawn {
            command: cmd.to_string(),
            source,
        })
}
