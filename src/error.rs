use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to execute `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("account lookup failed for '{name}': {source}")]
    AccountLookup {
        name: String,
        #[source]
        source: nix::Error,
    },

    #[error("provisioning failed: {0}")]
    Provision(String),

    #[error("permission setup failed for {path}: {reason}")]
    Permission { path: PathBuf, reason: String },

    #[error("supervisor error: {0}")]
    Supervisor(String),

    #[error("unit not found: {0}")]
    UnitNotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("found {0} secret occurrence(s) in tracked files")]
    SecretsFound(usize),

    #[error("{step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps an error with the name of the lifecycle step that produced it.
    pub fn at_step(step: &'static str, source: Error) -> Self {
        Self::Step {
            step,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
