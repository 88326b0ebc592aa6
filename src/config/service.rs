use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::ServiceIdentity;

pub const DEFAULT_CONFIG_FILE: &str = "hostward.toml";
const DEFAULT_NAME: &str = "tzero";
const MAX_ACCOUNT_NAME_LEN: usize = 32;

/// On-disk layout of `hostward.toml`. Every field is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub name: Option<String>,
    pub account: Option<String>,
    pub home_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub unit_file: Option<PathBuf>,
    pub backup: BackupFileConfig,
    pub checks: ChecksFileConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupFileConfig {
    pub remote_host: Option<String>,
    pub remote_dir: Option<PathBuf>,
    pub local_dir: Option<PathBuf>,
    pub ssh_command: Option<Vec<String>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChecksFileConfig {
    pub patterns: Option<Vec<String>>,
    pub allow: Option<Vec<String>>,
    pub lint: Option<Vec<String>>,
    pub test: Option<Vec<String>>,
}

/// Fully resolved configuration: defaults applied, paths absolute.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    pub name: String,
    pub account: String,
    /// Working tree of the deployed service, also the account's home.
    pub home_dir: PathBuf,
    pub data_dir: PathBuf,
    /// Sensitive application config, kept at mode 0600 after install.
    pub config_file: PathBuf,
    /// Supervisor descriptor linked into systemd on install.
    pub unit_file: PathBuf,
    pub backup: BackupConfig,
    pub checks: ChecksConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupConfig {
    pub remote_host: String,
    pub remote_dir: PathBuf,
    pub local_dir: PathBuf,
    pub ssh_command: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecksConfig {
    pub patterns: Vec<String>,
    pub allow: Vec<String>,
    pub lint: Vec<String>,
    pub test: Vec<String>,
}

impl ServiceConfig {
    /// Loads configuration from `explicit`, or from `hostward.toml` in the
    /// current directory. Only an explicitly named file is required to exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let cwd = env::current_dir()?;
        let user_home = env::var_os("HOME").map(PathBuf::from);

        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Some(absolutize(&cwd, path))
            }
            None => {
                let candidate = cwd.join(DEFAULT_CONFIG_FILE);
                candidate.exists().then_some(candidate)
            }
        };

        match path {
            Some(path) => {
                let content = fs::read_to_string(&path)?;
                let file: ConfigFile =
                    toml::from_str(&content).map_err(|source| Error::ConfigParse {
                        path: path.clone(),
                        source,
                    })?;
                let base = path.parent().map_or_else(|| cwd.clone(), Path::to_path_buf);
                tracing::debug!("Loaded configuration from {}", path.display());
                Self::resolve(file, &base, user_home.as_deref())
            }
            None => Self::resolve(ConfigFile::default(), &cwd, user_home.as_deref()),
        }
    }

    /// Applies defaults to `file`. Relative paths resolve against `home_dir`,
    /// which itself defaults to `base`.
    pub fn resolve(file: ConfigFile, base: &Path, user_home: Option<&Path>) -> Result<Self> {
        let name = file.name.unwrap_or_else(|| DEFAULT_NAME.to_string());
        validate_account_name("name", &name)?;
        let account = file.account.unwrap_or_else(|| name.clone());
        validate_account_name("account", &account)?;

        let home_dir = match file.home_dir {
            Some(dir) => absolutize(base, &expand_tilde(&dir, user_home)?),
            None => base.to_path_buf(),
        };
        let resolve_path = |path: PathBuf| -> Result<PathBuf> {
            Ok(absolutize(&home_dir, &expand_tilde(&path, user_home)?))
        };

        let data_dir = match file.data_dir {
            Some(dir) => resolve_path(dir)?,
            None => PathBuf::from("/opt/data").join(&name),
        };
        let config_file = resolve_path(
            file.config_file
                .unwrap_or_else(|| PathBuf::from(format!("{name}.json"))),
        )?;
        let unit_name = format!("{name}.service");
        let unit_file = resolve_path(
            file.unit_file
                .unwrap_or_else(|| PathBuf::from("etc").join(&unit_name)),
        )?;
        // systemctl link registers the descriptor under its own file name.
        if unit_file.file_name().is_none_or(|f| f != unit_name.as_str()) {
            return Err(Error::Config(format!(
                "unit_file must be named {unit_name}: {}",
                unit_file.display()
            )));
        }

        let backup = BackupConfig {
            remote_host: file.backup.remote_host.unwrap_or_else(|| name.clone()),
            remote_dir: file.backup.remote_dir.unwrap_or_else(|| data_dir.clone()),
            local_dir: resolve_path(
                file.backup
                    .local_dir
                    .unwrap_or_else(|| PathBuf::from("~/bkp")),
            )?,
            ssh_command: file
                .backup
                .ssh_command
                .unwrap_or_else(|| vec!["ssh".to_string()]),
        };
        if backup.remote_host.trim().is_empty() {
            return Err(Error::Config("backup.remote_host cannot be empty".into()));
        }
        if !backup.remote_dir.is_absolute() || backup.remote_dir.file_name().is_none() {
            return Err(Error::Config(format!(
                "backup.remote_dir must be an absolute path to a named directory: {}",
                backup.remote_dir.display()
            )));
        }
        if backup.ssh_command.is_empty() {
            return Err(Error::Config("backup.ssh_command cannot be empty".into()));
        }

        let checks = ChecksConfig {
            patterns: file
                .checks
                .patterns
                .unwrap_or_else(|| vec!["password".to_string()]),
            allow: file.checks.allow.unwrap_or_else(|| {
                vec![DEFAULT_CONFIG_FILE.to_string(), "*.md".to_string()]
            }),
            lint: file.checks.lint.unwrap_or_else(|| {
                vec![
                    "python3".to_string(),
                    "-m".to_string(),
                    "pylint".to_string(),
                    format!("{name}.py"),
                ]
            }),
            test: file.checks.test.unwrap_or_else(|| {
                ["python3", "-m", "unittest", "-v"]
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            }),
        };

        Ok(Self {
            name,
            account,
            home_dir,
            data_dir,
            config_file,
            unit_file,
            backup,
            checks,
        })
    }

    /// Name of the systemd unit, e.g. `tzero.service`.
    #[must_use]
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.name)
    }

    #[must_use]
    pub fn identity(&self) -> ServiceIdentity {
        ServiceIdentity {
            account: self.account.clone(),
            home_dir: self.home_dir.clone(),
            data_dir: self.data_dir.clone(),
        }
    }
}

fn validate_account_name(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::Config(format!("{field} cannot be empty")));
    }
    if value.len() > MAX_ACCOUNT_NAME_LEN {
        return Err(Error::Config(format!(
            "{field} cannot exceed {MAX_ACCOUNT_NAME_LEN} characters"
        )));
    }

    let mut chars = value.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !first_ok || !rest_ok {
        return Err(Error::Config(format!(
            "{field} '{value}' must match [a-z_][a-z0-9_-]*"
        )));
    }

    Ok(())
}

fn expand_tilde(path: &Path, user_home: Option<&Path>) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = user_home.ok_or_else(|| {
        Error::Config(format!("cannot expand {}: $HOME is not set", path.display()))
    })?;
    Ok(home.join(rest))
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
