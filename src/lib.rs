//! srcpack - deterministic source-distribution (sdist) assembler for
//! Meson projects.
//!
//! Given a project root, srcpack computes the authoritative set of files
//! for a release archive (VCS-tracked files merged with build-generated
//! files), synthesizes PKG-INFO metadata, and packages everything into a
//! reproducible gzip-compressed tarball under a normalized
//! `<name>-<version>/` prefix.
//!
//! Pipeline (left to right, per invocation):
//! - `introspect` - resolve name/version and generated files via meson
//! - `vcs` - snapshot the git working tree, or walk the root without one
//! - `fileset` - merge into one ordered, deduplicated member set
//! - `metadata` - render PKG-INFO
//! - `archive` - stream everything into a deterministic tar.gz
//!
//! Both external collaborators (introspector and snapshot provider) are
//! traits so embedders and tests can substitute their own.

pub mod archive;
pub mod config;
pub mod fileset;
pub mod introspect;
pub mod metadata;
pub mod process;
pub mod sdist;
pub mod vcs;

pub use config::Config;
pub use metadata::ProjectIdentity;
pub use sdist::{build_sdist, build_sdist_with};
