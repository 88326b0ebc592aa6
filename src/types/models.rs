use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::FileMode;

/// Runtime identity of the service: the account it runs as and the
/// directories it owns. The data directory outlives the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    pub account: String,
    pub home_dir: PathBuf,
    pub data_dir: PathBuf,
}

/// An OS account as resolved from the account database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipSpec {
    pub path: PathBuf,
    pub owner: String,
    /// Descend into directories.
    pub recursive: bool,
    /// Mode to set on `path` itself; `None` leaves modes untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<FileMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorUnit {
    pub unit: String,
    /// Descriptor the unit was linked from.
    pub descriptor: PathBuf,
    pub registered: bool,
    pub enabled: bool,
    pub running: bool,
}

/// One completed backup. Never modified after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupArchive {
    pub remote_host: String,
    pub remote_dir: PathBuf,
    pub path: PathBuf,
    pub created_at: DateTime<Local>,
    pub size_bytes: u64,
    pub sha256: String,
}

/// An archive file found in the local backup directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveFile {
    pub name: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Local>>,
}

/// A file inside a backup archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub is_dir: bool,
}

/// Point-in-time view of everything install touches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    pub data_dir: PathBuf,
    pub data_dir_exists: bool,
    pub config_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file_mode: Option<FileMode>,
    pub unit: SupervisorUnit,
}
