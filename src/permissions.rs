//! Ownership and mode setup for everything the runtime account touches.

use std::fs;
use std::os::unix::fs::{PermissionsExt, lchown};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::types::{Account, FileMode, OwnershipSpec};

/// Paths handed to the runtime account on install. The config file comes
/// last so its owner-only mode is the final word on that path.
#[must_use]
pub fn ownership_specs(config: &ServiceConfig) -> Vec<OwnershipSpec> {
    vec![
        OwnershipSpec {
            path: config.home_dir.clone(),
            owner: config.account.clone(),
            recursive: true,
            mode: None,
        },
        OwnershipSpec {
            path: config.data_dir.clone(),
            owner: config.account.clone(),
            recursive: true,
            mode: None,
        },
        OwnershipSpec {
            path: config.config_file.clone(),
            owner: config.account.clone(),
            recursive: false,
            mode: Some(FileMode::OWNER_RW),
        },
    ]
}

/// Applies every spec, failing on the first path that is missing or
/// cannot be changed.
pub fn apply(specs: &[OwnershipSpec], owner: &Account) -> Result<()> {
    for spec in specs {
        if fs::symlink_metadata(&spec.path).is_err() {
            return Err(Error::Permission {
                path: spec.path.clone(),
                reason: "path does not exist".to_string(),
            });
        }

        if spec.recursive {
            chown_tree(&spec.path, owner.uid, owner.gid)?;
        } else {
            chown_one(&spec.path, owner.uid, owner.gid)?;
        }

        if let Some(mode) = spec.mode {
            fs::set_permissions(&spec.path, fs::Permissions::from_mode(mode.bits())).map_err(
                |e| Error::Permission {
                    path: spec.path.clone(),
                    reason: format!("cannot set mode {mode}: {e}"),
                },
            )?;
        }

        info!(
            "Set owner of {} to {}{}",
            spec.path.display(),
            spec.owner,
            spec.mode.map(|m| format!(" (mode {m})")).unwrap_or_default()
        );
    }
    Ok(())
}

/// Current permission bits of `path`, if it exists.
#[must_use]
pub fn file_mode(path: &Path) -> Option<FileMode> {
    fs::metadata(path)
        .ok()
        .map(|m| FileMode::new(m.permissions().mode()))
}

fn chown_one(path: &Path, uid: u32, gid: u32) -> Result<()> {
    lchown(path, Some(uid), Some(gid)).map_err(|e| Error::Permission {
        path: path.to_path_buf(),
        reason: format!("cannot change owner to {uid}:{gid}: {e}"),
    })
}

/// Depth-first walk that changes symlinks themselves and never follows them.
fn chown_tree(root: &Path, uid: u32, gid: u32) -> Result<()> {
    let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];
    let mut count = 0usize;

    while let Some(current) = stack.pop() {
        let metadata = fs::symlink_metadata(&current).map_err(|e| Error::Permission {
            path: current.clone(),
            reason: format!("cannot stat: {e}"),
        })?;

        chown_one(&current, uid, gid)?;
        count += 1;

        if metadata.is_dir() {
            let entries = fs::read_dir(&current).map_err(|e| Error::Permission {
                path: current.clone(),
                reason: format!("cannot read directory: {e}"),
            })?;
            for entry in entries {
                stack.push(entry?.path());
            }
        }
    }

    debug!("Changed owner of {count} path(s) under {}", root.display());
    Ok(())
}
