//! The sdist pipeline: introspect, snapshot, resolve, package.
//!
//! Strictly left-to-right, single-threaded, no state kept between
//! invocations. Every call recomputes the file set from scratch and
//! produces one complete archive or nothing at all.

use crate::archive::{self, SdistBuilder};
use crate::config::Config;
use crate::fileset::FileSet;
use crate::introspect::{Introspector, MesonIntrospector};
use crate::vcs::{self, GitSnapshot, SnapshotProvider};
use anyhow::{Context, Result};
use std::path::Path;

/// Build a source distribution for the project at `root`, writing the
/// archive into `destination`. Returns the archive's basename.
///
/// Uses the real collaborators: meson introspection (honoring the `MESON`
/// environment variable) and a git working-tree snapshot, degrading to a
/// full directory walk when `root` is not a repository.
pub fn build_sdist(root: &Path, destination: &Path) -> Result<String> {
    let config = Config::load();
    let introspector = MesonIntrospector::new(&config.meson_program);
    build_sdist_with(root, destination, &introspector, &GitSnapshot, &config)
}

/// [`build_sdist`] with injectable collaborators.
///
/// The introspector is consulted exactly once; its failure aborts before
/// any archive I/O. A snapshot provider returning `None` is not an error
/// and falls back to enumerating everything under the root.
pub fn build_sdist_with(
    root: &Path,
    destination: &Path,
    introspector: &dyn Introspector,
    snapshot: &dyn SnapshotProvider,
    config: &Config,
) -> Result<String> {
    archive::ensure_writable(destination)?;

    let scratch = tempfile::Builder::new()
        .prefix("srcpack-build-")
        .tempdir()
        .context("Failed to create scratch build directory")?;

    let info = introspector.introspect(root, scratch.path())?;

    let tracked = match snapshot.list_tracked(root)? {
        Some(paths) => paths,
        None => vcs::enumerate_all(root)?,
    };

    let files = FileSet::resolve(root, &tracked, &info.generated_files)?;

    println!(
        "Packaging {} ({} members)",
        info.identity.dist_prefix(),
        files.len() + 1 // plus PKG-INFO
    );

    SdistBuilder::new(root, &info.identity)
        .mtime(config.source_date_epoch)
        .build(snapshot, &files, destination)
}
