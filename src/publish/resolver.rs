//! Destination container resolution.
//!
//! The destination repository is consumed only through this narrow
//! capability: resolve an existing container for a rewritten relative
//! path, and upload bytes into it. Containers are never created here;
//! resolution of a missing path reports absence and the publisher treats
//! that as fatal.

use super::content::ContentClass;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Reference to an existing destination container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    /// Destination-root-relative path, `/`-separated, empty for the root.
    pub path: String,
}

/// One binary upload into a resolved container.
#[derive(Debug)]
pub struct ArtifactUpload<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
    pub mime: &'static str,
    pub class: ContentClass,
}

pub trait ContainerResolver {
    /// Resolve the container at `relative_path`, or `None` when no such
    /// container exists.
    fn resolve(&self, relative_path: &str) -> Result<Option<ContainerHandle>>;

    /// Upload into a previously resolved container, returning the
    /// resulting address.
    fn upload(&self, container: &ContainerHandle, upload: &ArtifactUpload<'_>) -> Result<String>;
}

/// Resolver over a destination directory tree.
///
/// Containers are pre-existing directories under the root; addresses are
/// root-relative `/…` paths.
#[derive(Debug)]
pub struct FsContainerResolver {
    root: PathBuf,
}

impl FsContainerResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir_for(&self, relative_path: &str) -> PathBuf {
        if relative_path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative_path)
        }
    }
}

impl ContainerResolver for FsContainerResolver {
    fn resolve(&self, relative_path: &str) -> Result<Option<ContainerHandle>> {
        let relative_path = relative_path.trim_matches('/');
        if self.dir_for(relative_path).is_dir() {
            Ok(Some(ContainerHandle {
                path: relative_path.to_string(),
            }))
        } else {
            Ok(None)
        }
    }

    fn upload(&self, container: &ContainerHandle, upload: &ArtifactUpload<'_>) -> Result<String> {
        let dir = self.dir_for(&container.path);
        let target = dir.join(upload.name);
        fs::write(&target, upload.bytes)
            .with_context(|| format!("uploading '{}' to '{}'", upload.name, dir.display()))?;

        if container.path.is_empty() {
            Ok(format!("/{}", upload.name))
        } else {
            Ok(format!("/{}/{}", container.path, upload.name))
        }
    }
}
