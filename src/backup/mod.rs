//! Remote data directory snapshots.
//!
//! The remote side streams a gzipped tarball to stdout; it is copied
//! straight into a new timestamped file without buffering the whole
//! archive. A failed or interrupted copy leaves the partial file in place.

mod archive;
mod transport;

pub use archive::{
    ARCHIVE_EXTENSION, archive_file_name, format_size, list_archives, verify_archive,
};
pub use transport::{RemoteShell, Ssh, remote_archive_command};

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::types::BackupArchive;

#[derive(Debug, Clone)]
pub struct BackupRequest {
    /// Archive file name prefix.
    pub name: String,
    pub remote_host: String,
    pub remote_dir: PathBuf,
    pub local_dir: PathBuf,
}

impl BackupRequest {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            name: config.name.clone(),
            remote_host: config.backup.remote_host.clone(),
            remote_dir: config.backup.remote_dir.clone(),
            local_dir: config.backup.local_dir.clone(),
        }
    }
}

/// Writer that hashes and counts everything passed through it.
struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
    written: u64,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            written: 0,
        }
    }

    fn finish(self) -> (W, String, u64) {
        (self.inner, hex::encode(self.hasher.finalize()), self.written)
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Pulls one archive of `request.remote_dir` into `request.local_dir`.
pub fn extract(shell: &dyn RemoteShell, request: &BackupRequest) -> Result<BackupArchive> {
    let command = remote_archive_command(&request.remote_dir)?;
    fs::create_dir_all(&request.local_dir)?;

    let created_at = Local::now();
    let path = request
        .local_dir
        .join(archive_file_name(&request.name, &created_at));
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| Error::Transport(format!("cannot create {}: {e}", path.display())))?;

    info!(
        "Archiving {}:{} into {}",
        request.remote_host,
        request.remote_dir.display(),
        path.display()
    );

    let mut child = shell.spawn(&request.remote_host, &command)?;
    let Some(mut stdout) = child.stdout.take() else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(Error::Transport("remote command has no output stream".into()));
    };

    let mut writer = HashingWriter::new(BufWriter::new(file));
    let copied = io::copy(&mut stdout, &mut writer).and_then(|_| writer.flush());
    drop(stdout);

    if let Err(e) = copied {
        let _ = child.kill();
        let _ = child.wait();
        return Err(transport_failure(&path, &format!("stream interrupted: {e}")));
    }

    let status = child
        .wait()
        .map_err(|e| transport_failure(&path, &format!("cannot wait for remote command: {e}")))?;
    if !status.success() {
        return Err(transport_failure(
            &path,
            &format!("remote archiving command exited with {status}"),
        ));
    }

    let (buffered, sha256, size_bytes) = writer.finish();
    let file = buffered
        .into_inner()
        .map_err(|e| transport_failure(&path, &e.to_string()))?;
    file.sync_all()?;

    info!("Wrote {} ({size_bytes} bytes, sha256 {sha256})", path.display());
    Ok(BackupArchive {
        remote_host: request.remote_host.clone(),
        remote_dir: request.remote_dir.clone(),
        path,
        created_at,
        size_bytes,
        sha256,
    })
}

fn transport_failure(path: &Path, reason: &str) -> Error {
    Error::Transport(format!(
        "{reason}; partial archive left at {}",
        path.display()
    ))
}
