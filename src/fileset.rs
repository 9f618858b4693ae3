//! File-set resolution: one ordered, deduplicated set of archive members.
//!
//! Tracked paths come first, then build-generated paths overwrite on
//! collision. The build description (`meson.build`) and packaging
//! configuration (`pyproject.toml`) are force-included when present on
//! disk - the archive is useless as a build input without them, tracked
//! or not.

use crate::introspect::GeneratedFile;
use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Files required for the archive to be usable as a build input.
const REQUIRED_FILES: &[&str] = &["meson.build", "pyproject.toml"];

/// Where a member's bytes come from at archive time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Relative to the project root, read through the snapshot provider.
    WorkingTree(PathBuf),
    /// Build-generated file. The source may live outside the project
    /// root (typically a scratch build directory); only the archive path
    /// has to be root-relative and clean.
    Generated(PathBuf),
}

/// Ordered set of archive-relative path -> content source.
///
/// Keys are normalized POSIX-style relative paths; iteration order is
/// lexicographic, which makes archive member order deterministic.
#[derive(Debug, Default)]
pub struct FileSet {
    entries: BTreeMap<String, Source>,
}

impl FileSet {
    /// Merge tracked and generated paths into one resolved set.
    pub fn resolve(
        root: &Path,
        tracked: &[PathBuf],
        generated: &[GeneratedFile],
    ) -> Result<Self> {
        let mut set = FileSet::default();

        for relative in tracked {
            set.entries
                .insert(archive_path(relative)?, Source::WorkingTree(relative.clone()));
        }

        // Generated files win on path collision.
        for file in generated {
            set.entries.insert(
                archive_path(&file.archive_path)?,
                Source::Generated(file.source.clone()),
            );
        }

        for name in REQUIRED_FILES {
            if !set.entries.contains_key(*name) && root.join(name).is_file() {
                set.entries
                    .insert((*name).to_string(), Source::WorkingTree(PathBuf::from(name)));
            }
        }

        Ok(set)
    }

    /// Number of resolved members.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a normalized archive-relative path is in the set.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Members in lexicographic archive-path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Source)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Normalize a relative path for use inside the archive: forward slashes,
/// no absolute, parent, or non-UTF-8 components.
fn archive_path(path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(s) => parts.push(s),
                None => bail!("Non-UTF-8 path in file set: {}", path.display()),
            },
            Component::CurDir => {}
            _ => bail!(
                "Path escapes the project root: {}",
                path.display()
            ),
        }
    }
    if parts.is_empty() {
        bail!("Empty path in file set");
    }
    Ok(parts.join("/"))
}
