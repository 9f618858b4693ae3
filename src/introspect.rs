//! Build-system introspection boundary.
//!
//! The introspector is the one external collaborator whose failure is
//! terminal: without a resolvable project name and version there is no
//! sdist. It is invoked exactly once per build and its output is
//! authoritative for naming.
//!
//! The real implementation drives Meson: `meson setup` into a scratch
//! build directory, then parse `meson-info/intro-projectinfo.json`. Meson
//! has no introspection entry for dist-generated files, so the default
//! implementation reports none; build frontends that synthesize files
//! (version generators and the like) provide their own [`Introspector`]
//! and extend `generated_files`.

use crate::metadata::ProjectIdentity;
use crate::process::Cmd;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A build-generated file to include in the archive.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    /// Where the file lives inside the archive, relative to the prefix.
    pub archive_path: PathBuf,
    /// Where the bytes come from. May live outside the project root,
    /// typically in the scratch build directory.
    pub source: PathBuf,
}

/// Everything the core needs from the build system.
#[derive(Debug, Clone)]
pub struct ProjectInfo {
    /// Resolved distribution name and version.
    pub identity: ProjectIdentity,
    /// Build-generated files, in declaration order.
    pub generated_files: Vec<GeneratedFile>,
}

/// Build-system introspection interface.
///
/// Injectable so tests can substitute a fake without spawning real
/// subprocesses.
pub trait Introspector {
    /// Configure the project into `build_dir` and report its metadata.
    fn introspect(&self, root: &Path, build_dir: &Path) -> Result<ProjectInfo>;
}

/// Real introspector backed by the `meson` executable.
pub struct MesonIntrospector {
    program: String,
}

impl MesonIntrospector {
    /// Create an introspector invoking the given meson executable.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
        }
    }
}

impl Introspector for MesonIntrospector {
    fn introspect(&self, root: &Path, build_dir: &Path) -> Result<ProjectInfo> {
        Cmd::new(&self.program)
            .arg("setup")
            .arg_path(build_dir)
            .arg_path(root)
            .error_msg("meson setup failed")
            .run()?;

        let info_path = build_dir.join("meson-info/intro-projectinfo.json");
        let raw = fs::read_to_string(&info_path)
            .with_context(|| format!("Failed to read {}", info_path.display()))?;
        let info: MesonProjectInfo = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed project info in {}", info_path.display()))?;

        let identity = ProjectIdentity::new(&info.descriptive_name, &info.version)?;

        Ok(ProjectInfo {
            identity,
            generated_files: Vec::new(),
        })
    }
}

/// Subset of `intro-projectinfo.json` the core cares about.
#[derive(Debug, Deserialize)]
struct MesonProjectInfo {
    descriptive_name: String,
    version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_project_info_json() {
        let raw = r#"{
            "version": "1.0.0",
            "descriptive_name": "library",
            "subproject_dir": "subprojects",
            "subprojects": []
        }"#;
        let info: MesonProjectInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.descriptive_name, "library");
        assert_eq!(info.version, "1.0.0");
    }

    #[test]
    fn missing_version_is_an_error() {
        let raw = r#"{"descriptive_name": "library"}"#;
        assert!(serde_json::from_str::<MesonProjectInfo>(raw).is_err());
    }
}
