//! Project identity and package-metadata synthesis.
//!
//! The identity (normalized name + version) names the archive, prefixes
//! every member, and is interpolated into the synthesized PKG-INFO
//! document. It is resolved once per build from the introspector and never
//! mutated afterwards.

use anyhow::{bail, Result};

/// Archive member name of the synthesized metadata document.
pub const PKG_INFO_NAME: &str = "PKG-INFO";

/// Metadata schema version written into PKG-INFO.
pub const METADATA_VERSION: &str = "2.1";

/// Normalized distribution name and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    name: String,
    version: String,
}

impl ProjectIdentity {
    /// Build an identity from raw introspection output.
    ///
    /// The name is normalized for distribution filenames: lowercased, with
    /// every run of `-`, `_` and `.` collapsed to a single underscore. The
    /// version is taken as-is, trimmed. An empty name or version is a
    /// configuration error (no sdist without both).
    pub fn new(name: &str, version: &str) -> Result<Self> {
        let name = normalize_name(name);
        let version = version.trim().to_string();
        if name.is_empty() {
            bail!("Project name is empty after normalization");
        }
        if version.is_empty() {
            bail!("Project version is empty");
        }
        Ok(Self { name, version })
    }

    /// Normalized distribution name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Top-level directory every archive member lives under.
    pub fn dist_prefix(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Basename of the output archive.
    pub fn archive_name(&self) -> String {
        format!("{}.tar.gz", self.dist_prefix())
    }
}

/// Render the PKG-INFO document for an identity.
///
/// Pure function, no filesystem interaction. The document is injected into
/// the archive as an in-memory member; it never exists on disk.
pub fn render_pkg_info(identity: &ProjectIdentity) -> String {
    format!(
        "Metadata-Version: {}\nName: {}\nVersion: {}\n",
        METADATA_VERSION,
        identity.name(),
        identity.version()
    )
}

/// Lowercase and collapse runs of `-`/`_`/`.` to a single underscore.
fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.trim().chars() {
        if c == '-' || c == '_' || c == '.' {
            pending_sep = true;
        } else {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        }
    }
    out
}
