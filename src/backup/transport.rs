use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::error::{Error, Result};

/// Opaque remote-execution channel.
pub trait RemoteShell {
    /// Starts `command` on `host` with its standard output piped back.
    fn spawn(&self, host: &str, command: &str) -> Result<Child>;
}

/// `ssh`-compatible transport. The configured argv is followed by the host
/// and the remote command, as in `ssh [opts] host command`.
pub struct Ssh {
    argv: Vec<String>,
}

impl Ssh {
    pub fn new(argv: Vec<String>) -> Result<Self> {
        if argv.is_empty() {
            return Err(Error::Config("ssh command cannot be empty".into()));
        }
        Ok(Self { argv })
    }

    fn command(&self, host: &str, remote_command: &str) -> Command {
        let mut command = Command::new(&self.argv[0]);
        command.args(&self.argv[1..]).arg(host).arg(remote_command);
        command
    }
}

impl RemoteShell for Ssh {
    fn spawn(&self, host: &str, command: &str) -> Result<Child> {
        tracing::debug!("exec: {} {host} {command}", self.argv.join(" "));
        self.command(host, command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Transport(format!("cannot start {}: {e}", self.argv[0])))
    }
}

/// Remote command that writes a gzipped tarball of `remote_dir` to stdout.
/// Entries are rooted at the directory's own name.
pub fn remote_archive_command(remote_dir: &Path) -> Result<String> {
    let (parent, name) = match (remote_dir.parent(), remote_dir.file_name()) {
        (Some(parent), Some(name)) => (parent, name),
        _ => {
            return Err(Error::Config(format!(
                "cannot archive {}: need a named directory",
                remote_dir.display()
            )));
        }
    };
    Ok(format!(
        "tar -czf - -C {} {}",
        shell_quote(&parent.to_string_lossy()),
        shell_quote(&name.to_string_lossy())
    ))
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
