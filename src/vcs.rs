//! Version-control snapshot provider.
//!
//! Reports which files the repository tracks and what their bytes are in
//! the *working tree* - uncommitted edits count, untracked files do not.
//! When no repository is present the provider signals "unavailable" and
//! the caller falls back to enumerating everything under the root (minus
//! a fixed ignore set).

use crate::process::Cmd;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories skipped by the no-repository fallback walk.
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    "build",
];

/// Read-only view of the version-controlled working tree.
///
/// Injectable so tests can substitute a fake without touching a real
/// repository.
pub trait SnapshotProvider {
    /// Tracked paths relative to `root`, or `None` when the directory is
    /// not a repository (or the VCS tooling is unavailable).
    fn list_tracked(&self, root: &Path) -> Result<Option<Vec<PathBuf>>>;

    /// Bytes of a tracked path as they are in the working tree. The
    /// default reads straight from disk, which by definition includes
    /// uncommitted modifications.
    fn read(&self, root: &Path, relative: &Path) -> Result<Vec<u8>> {
        fs::read(root.join(relative))
            .with_context(|| format!("Failed to read source file {}", relative.display()))
    }
}

/// Snapshot provider backed by the `git` executable.
pub struct GitSnapshot;

impl SnapshotProvider for GitSnapshot {
    fn list_tracked(&self, root: &Path) -> Result<Option<Vec<PathBuf>>> {
        let tracked = match git_ls_files(root, &[]) {
            Some(paths) => paths,
            None => return Ok(None),
        };

        // `ls-files` still lists paths deleted from the working tree but
        // not yet committed; drop them so the set matches what is on disk.
        let deleted: HashSet<PathBuf> = git_ls_files(root, &["--deleted"])
            .unwrap_or_default()
            .into_iter()
            .collect();

        let mut paths: Vec<PathBuf> = tracked
            .into_iter()
            .filter(|p| !deleted.contains(p))
            .collect();
        paths.sort();
        Ok(Some(paths))
    }
}

/// Run `git ls-files -z` in `root`. Returns `None` when git is missing or
/// the directory is not a repository - both degrade to the fallback walk.
fn git_ls_files(root: &Path, extra_args: &[&str]) -> Option<Vec<PathBuf>> {
    let result = Cmd::new("git")
        .dir(root)
        .arg("ls-files")
        .arg("-z")
        .args(extra_args.iter().copied())
        .allow_fail()
        .run()
        .ok()?;

    if !result.success() {
        return None;
    }
    Some(parse_z_paths(&result.stdout))
}

/// Split NUL-separated `ls-files -z` output into relative paths.
fn parse_z_paths(raw: &str) -> Vec<PathBuf> {
    raw.split('\0')
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Fallback enumeration for roots without a repository: every regular
/// file under `root`, relative paths, sorted.
pub fn enumerate_all(root: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && is_ignored(e.file_name())));

    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("Path outside walk root: {}", entry.path().display()))?;
        paths.push(relative.to_path_buf());
    }
    paths.sort();
    Ok(paths)
}

fn is_ignored(name: &std::ffi::OsStr) -> bool {
    IGNORED_DIRS.iter().any(|d| name == *d)
}
