//! Deterministic tar.gz assembly.
//!
//! Two builds from identical inputs must produce byte-identical archives,
//! so every piece of real-world entropy is erased in one place
//! ([`SdistBuilder::append`]): member mtimes are a fixed synthetic epoch,
//! uid/gid/owner strings are canonical constants, and permission bits are
//! normalized to 0644/0755 - only the source file's user-executable bit
//! survives. The gzip header gets mtime 0 and OS byte 255 for the same
//! reason.
//!
//! # Atomicity
//!
//! The archive is written to a `.work` file next to the final path and
//! renamed only on success. A source file vanishing between resolution
//! and read aborts the build and leaves nothing at the destination.

use crate::fileset::{FileSet, Source};
use crate::metadata::{self, ProjectIdentity, PKG_INFO_NAME};
use crate::vcs::SnapshotProvider;
use anyhow::{bail, Context, Result};
use flate2::{Compression, GzBuilder};
use std::fs;
use std::io::Write;
use std::path::Path;
use tar::{Builder, Header};

/// Canonical owner/group recorded on every member.
const ARCHIVE_OWNER: &str = "root";

const MODE_REGULAR: u32 = 0o644;
const MODE_EXECUTABLE: u32 = 0o755;

/// Streams a resolved file set into a reproducible `<name>-<version>.tar.gz`.
pub struct SdistBuilder<'a> {
    root: &'a Path,
    identity: &'a ProjectIdentity,
    mtime: u64,
}

impl<'a> SdistBuilder<'a> {
    /// Create a builder for a project root and resolved identity.
    pub fn new(root: &'a Path, identity: &'a ProjectIdentity) -> Self {
        Self {
            root,
            identity,
            mtime: 0,
        }
    }

    /// Set the synthetic timestamp shared by all members (default 0).
    pub fn mtime(mut self, mtime: u64) -> Self {
        self.mtime = mtime;
        self
    }

    /// Build the archive in `destination` and return its basename.
    pub fn build(
        &self,
        snapshot: &dyn SnapshotProvider,
        files: &FileSet,
        destination: &Path,
    ) -> Result<String> {
        ensure_writable(destination)?;

        let archive_name = self.identity.archive_name();
        let final_path = destination.join(&archive_name);
        let work_path = destination.join(format!(".{archive_name}.work"));

        if let Err(e) = self.write_archive(snapshot, files, &work_path) {
            let _ = fs::remove_file(&work_path);
            return Err(e);
        }

        fs::rename(&work_path, &final_path).with_context(|| {
            format!("Failed to move finished archive to {}", final_path.display())
        })?;

        Ok(archive_name)
    }

    fn write_archive(
        &self,
        snapshot: &dyn SnapshotProvider,
        files: &FileSet,
        work_path: &Path,
    ) -> Result<()> {
        let file = fs::File::create(work_path)
            .with_context(|| format!("Failed to create archive at {}", work_path.display()))?;

        let encoder = GzBuilder::new()
            .mtime(0)
            .operating_system(255) // unknown, deterministic
            .write(file, Compression::best());

        let mut tar = Builder::new(encoder);
        tar.mode(tar::HeaderMode::Deterministic);

        let prefix = self.identity.dist_prefix();

        // PKG-INFO is synthesized, never taken from disk, and wins over
        // any same-named file-set entry.
        let pkg_info = metadata::render_pkg_info(self.identity);
        self.append(
            &mut tar,
            &format!("{prefix}/{PKG_INFO_NAME}"),
            pkg_info.as_bytes(),
            false,
        )?;

        for (relative, source) in files.iter() {
            if relative == PKG_INFO_NAME {
                continue;
            }

            let (bytes, executable) = match source {
                Source::WorkingTree(path) => (
                    snapshot.read(self.root, path)?,
                    is_user_executable(&self.root.join(path))?,
                ),
                Source::Generated(path) => (
                    fs::read(path).with_context(|| {
                        format!("Failed to read generated file {}", path.display())
                    })?,
                    is_user_executable(path)?,
                ),
            };

            self.append(&mut tar, &format!("{prefix}/{relative}"), &bytes, executable)?;
        }

        let encoder = tar.into_inner().context("Failed to finalize tar archive")?;
        encoder.finish().context("Failed to finish gzip stream")?;
        Ok(())
    }

    /// Append one member with fully normalized metadata.
    fn append<W: Write>(
        &self,
        tar: &mut Builder<W>,
        path: &str,
        data: &[u8],
        executable: bool,
    ) -> Result<()> {
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(if executable {
            MODE_EXECUTABLE
        } else {
            MODE_REGULAR
        });
        header.set_uid(0);
        header.set_gid(0);
        header.set_mtime(self.mtime);
        header.set_username(ARCHIVE_OWNER)?;
        header.set_groupname(ARCHIVE_OWNER)?;

        tar.append_data(&mut header, path, data)
            .with_context(|| format!("Failed to write archive member {path}"))?;
        Ok(())
    }
}

/// Fail fast when the destination cannot take the archive. Checked before
/// any other work so a bad output directory never wastes an introspection
/// run.
pub(crate) fn ensure_writable(destination: &Path) -> Result<()> {
    fs::create_dir_all(destination).with_context(|| {
        format!(
            "Failed to create destination directory {}",
            destination.display()
        )
    })?;
    let metadata = fs::metadata(destination)
        .with_context(|| format!("Failed to stat {}", destination.display()))?;
    if metadata.permissions().readonly() {
        bail!(
            "Destination directory {} is not writable",
            destination.display()
        );
    }
    Ok(())
}

/// Does the source file grant execute to its owner?
///
/// On platforms without a meaningful executable bit this is always false.
#[cfg(unix)]
fn is_user_executable(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to stat source file {}", path.display()))?;
    Ok(metadata.permissions().mode() & 0o100 != 0)
}

#[cfg(not(unix))]
fn is_user_executable(_path: &Path) -> Result<bool> {
    Ok(false)
}
