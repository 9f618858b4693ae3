//! Shared test utilities for srcpack tests.
#![allow(dead_code)]

use anyhow::Result;
use flate2::read::GzDecoder;
use srcpack::config::Config;
use srcpack::introspect::{GeneratedFile, Introspector, ProjectInfo};
use srcpack::metadata::ProjectIdentity;
use srcpack::vcs::SnapshotProvider;
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment with a temporary project root and output directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Project root to package
    pub root: PathBuf,
    /// Destination directory for archives
    pub dist: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("project");
        let dist = temp_dir.path().join("dist");
        fs::create_dir_all(&root).expect("Failed to create project root");
        fs::create_dir_all(&dist).expect("Failed to create dist dir");
        Self {
            _temp_dir: temp_dir,
            root,
            dist,
        }
    }
}

/// Write a file under a root, creating parent directories as needed.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(&path, content).expect("Failed to write file");
}

/// Write a file and mark it user-executable.
#[cfg(unix)]
pub fn write_executable(root: &Path, relative: &str, content: &str) {
    use std::os::unix::fs::PermissionsExt;
    write_file(root, relative, content);
    let path = root.join(relative);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("Failed to set executable bit");
}

/// Write the minimal required build inputs into a project root.
pub fn write_build_files(root: &Path, name: &str) {
    write_file(
        root,
        "meson.build",
        &format!("project('{name}', version: '1.0.0')\n"),
    );
    write_file(
        root,
        "pyproject.toml",
        "[build-system]\nbuild-backend = 'mesonpy'\n",
    );
}

/// Introspector stub returning fixed metadata, no subprocess involved.
pub struct FakeIntrospector {
    name: String,
    version: String,
    generated: Vec<(String, PathBuf)>,
}

impl FakeIntrospector {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            generated: Vec::new(),
        }
    }

    pub fn with_generated(mut self, archive_path: &str, source: &Path) -> Self {
        self.generated
            .push((archive_path.to_string(), source.to_path_buf()));
        self
    }
}

impl Introspector for FakeIntrospector {
    fn introspect(&self, _root: &Path, _build_dir: &Path) -> Result<ProjectInfo> {
        Ok(ProjectInfo {
            identity: ProjectIdentity::new(&self.name, &self.version)?,
            generated_files: self
                .generated
                .iter()
                .map(|(archive_path, source)| GeneratedFile {
                    archive_path: PathBuf::from(archive_path),
                    source: source.clone(),
                })
                .collect(),
        })
    }
}

/// Snapshot provider for roots without a repository: always unavailable,
/// forcing the full-directory fallback.
pub struct NoRepository;

impl SnapshotProvider for NoRepository {
    fn list_tracked(&self, _root: &Path) -> Result<Option<Vec<PathBuf>>> {
        Ok(None)
    }
}

/// Snapshot provider with a fixed tracked-path list.
pub struct FixedSnapshot {
    pub tracked: Vec<PathBuf>,
}

impl FixedSnapshot {
    pub fn new(tracked: &[&str]) -> Self {
        Self {
            tracked: tracked.iter().map(PathBuf::from).collect(),
        }
    }
}

impl SnapshotProvider for FixedSnapshot {
    fn list_tracked(&self, _root: &Path) -> Result<Option<Vec<PathBuf>>> {
        Ok(Some(self.tracked.clone()))
    }
}

/// Build an sdist with default configuration, failing the test on error.
pub fn build(env: &TestEnv, introspector: &dyn Introspector, snapshot: &dyn SnapshotProvider) -> String {
    srcpack::build_sdist_with(&env.root, &env.dist, introspector, snapshot, &Config::default())
        .expect("sdist build should succeed")
}

/// One extracted archive member.
pub struct ArchiveEntry {
    pub path: String,
    pub bytes: Vec<u8>,
    pub mode: u32,
    pub mtime: u64,
    pub uid: u64,
    pub gid: u64,
}

/// Read every member of a tar.gz archive.
pub fn read_archive(path: &Path) -> Vec<ArchiveEntry> {
    let file = fs::File::open(path).expect("Failed to open archive");
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut entries = Vec::new();
    for entry in archive.entries().expect("Failed to read tar entries") {
        let mut entry = entry.expect("Failed to read tar entry");
        let header = entry.header();
        let path = entry
            .path()
            .expect("Failed to read entry path")
            .to_string_lossy()
            .into_owned();
        let mode = header.mode().expect("Failed to read mode");
        let mtime = header.mtime().expect("Failed to read mtime");
        let uid = header.uid().expect("Failed to read uid");
        let gid = header.gid().expect("Failed to read gid");

        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .expect("Failed to read entry content");

        entries.push(ArchiveEntry {
            path,
            bytes,
            mode,
            mtime,
            uid,
            gid,
        });
    }
    entries
}

/// Member names of an archive as a set.
pub fn archive_names(entries: &[ArchiveEntry]) -> BTreeSet<String> {
    entries.iter().map(|e| e.path.clone()).collect()
}

/// Find one member by full archive path.
pub fn find_entry<'a>(entries: &'a [ArchiveEntry], path: &str) -> &'a ArchiveEntry {
    entries
        .iter()
        .find(|e| e.path == path)
        .unwrap_or_else(|| panic!("Archive member {path} not found"))
}
