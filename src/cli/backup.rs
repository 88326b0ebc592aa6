use std::path::Path;

use crate::backup::{self, BackupRequest, Ssh, format_size};
use crate::config::ServiceConfig;
use crate::types::ArchiveFile;

pub fn run_backup(config: &ServiceConfig) -> anyhow::Result<()> {
    let ssh = Ssh::new(config.backup.ssh_command.clone())?;
    let archive = backup::extract(&ssh, &BackupRequest::from_config(config))?;

    println!();
    println!("Created {}", archive.path.display());
    println!("  size:   {}", format_size(archive.size_bytes));
    println!("  sha256: {}", archive.sha256);
    println!();

    print_listing(&config.backup.local_dir, &backup::list_archives(&config.backup.local_dir)?);
    Ok(())
}

pub fn run_backup_list(config: &ServiceConfig, json: bool) -> anyhow::Result<()> {
    let archives = backup::list_archives(&config.backup.local_dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&archives)?);
    } else {
        print_listing(&config.backup.local_dir, &archives);
    }
    Ok(())
}

pub fn run_backup_verify(path: &Path, json: bool) -> anyhow::Result<()> {
    let entries = backup::verify_archive(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let files = entries.iter().filter(|e| !e.is_dir).count();
    let bytes: u64 = entries.iter().map(|e| e.size_bytes).sum();
    for entry in &entries {
        if entry.is_dir {
            println!("{:>8}  {}/", "-", entry.path.display().to_string().trim_end_matches('/'));
        } else {
            println!("{:>8}  {}", format_size(entry.size_bytes), entry.path.display());
        }
    }
    println!();
    println!(
        "{} is valid: {files} file(s), {} uncompressed",
        path.display(),
        format_size(bytes)
    );
    Ok(())
}

fn print_listing(dir: &Path, archives: &[ArchiveFile]) {
    println!("{}:", dir.display());
    if archives.is_empty() {
        println!("  (no archives)");
        return;
    }
    let total: u64 = archives.iter().map(|a| a.size_bytes).sum();
    for archive in archives {
        let modified = archive
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:>8}  {:16}  {}",
            format_size(archive.size_bytes),
            modified,
            archive.name
        );
    }
    println!("total {}", format_size(total));
}
