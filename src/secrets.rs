//! Detection of literal secrets in tracked files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::exec::{Cmd, CommandRunner};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Relative to the scanned root.
    pub path: PathBuf,
    pub line: usize,
    pub pattern: String,
}

/// Files tracked by git under `root`, or every file when `root` is not a
/// git checkout. Paths are relative to `root`.
pub fn tracked_files(runner: &dyn CommandRunner, root: &Path) -> Result<Vec<PathBuf>> {
    let cmd = Cmd::new("git")
        .arg("-C")
        .arg(root.to_string_lossy())
        .args(["ls-files", "-z"]);

    match runner.run(&cmd) {
        Ok(output) if output.success => Ok(output
            .stdout
            .split('\0')
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect()),
        _ => {
            tracing::debug!("{} is not a git checkout, walking it", root.display());
            walk_files(root)
        }
    }
}

fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();
            if file_type.is_dir() {
                if entry.file_name() != ".git" {
                    stack.push(path);
                }
            } else if file_type.is_file() {
                if let Ok(relative) = path.strip_prefix(root) {
                    files.push(relative.to_path_buf());
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Scans `files` (relative to `root`) for case-insensitive occurrences of
/// `patterns`, skipping files matched by an `allow` glob.
pub fn scan(
    root: &Path,
    files: &[PathBuf],
    patterns: &[String],
    allow: &[String],
) -> Result<Vec<Finding>> {
    let allow = allow
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| Error::Config(format!("invalid allow pattern '{p}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;
    let needles: Vec<(String, &String)> = patterns
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| (p.to_lowercase(), p))
        .collect();
    let options = MatchOptions::new();

    let mut findings = Vec::new();
    for file in files {
        if allow.iter().any(|p| p.matches_path_with(file, options)) {
            continue;
        }

        let bytes = match fs::read(root.join(file)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) if e.kind() == ErrorKind::IsADirectory => continue,
            Err(e) => return Err(e.into()),
        };
        let content = String::from_utf8_lossy(&bytes);

        for (index, line) in content.lines().enumerate() {
            let line = line.to_lowercase();
            for (needle, pattern) in &needles {
                if line.contains(needle.as_str()) {
                    findings.push(Finding {
                        path: file.clone(),
                        line: index + 1,
                        pattern: (*pattern).clone(),
                    });
                }
            }
        }
    }

    Ok(findings)
}
