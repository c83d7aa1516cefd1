//! Short-lived per-run working directory.
//!
//! Design archives carry long internal paths, so workspaces live under a
//! deliberately short root (the system temp dir by default) to stay clear
//! of path-length limits once everything is unpacked.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use tracing::{debug, warn};

static WORKSPACE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Unique working directory for one pipeline run.
///
/// The directory is removed when the value is dropped, on every exit path,
/// unless [`Workspace::keep`] was called first.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    keep: bool,
}

impl Workspace {
    /// Create a new empty workspace under `parent`.
    ///
    /// The name combines a UTC millisecond timestamp with the process id
    /// and a process-local counter, so concurrent runs on one host cannot
    /// collide.
    pub fn create(parent: &Path) -> Result<Self> {
        let root = parent.join(unique_name());
        fs::create_dir_all(&root)
            .with_context(|| format!("creating workspace directory '{}'", root.display()))?;
        debug!("created workspace {}", root.display());
        Ok(Self { root, keep: false })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Leave the directory on disk when this value is dropped.
    pub fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.keep {
            debug!("did not clean up workspace {}", self.root.display());
            return;
        }
        match fs::remove_dir_all(&self.root) {
            Ok(()) => debug!("removed workspace {}", self.root.display()),
            Err(err) => warn!(
                "failed to remove workspace {}: {err}",
                self.root.display()
            ),
        }
    }
}

fn unique_name() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "d{:04}{:02}{:02}{:02}{:02}{:02}{:03}-{}-{}",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.millisecond(),
        std::process::id(),
        WORKSPACE_SEQ.fetch_add(1, Ordering::Relaxed),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_makes_empty_directory() {
        let tmp = TempDir::new().unwrap();
        let workspace = Workspace::create(tmp.path()).unwrap();
        assert!(workspace.path().is_dir());
        assert_eq!(fs::read_dir(workspace.path()).unwrap().count(), 0);
    }

    #[test]
    fn drop_removes_directory() {
        let tmp = TempDir::new().unwrap();
        let path = {
            let workspace = Workspace::create(tmp.path()).unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn keep_leaves_directory_on_disk() {
        let tmp = TempDir::new().unwrap();
        let path = {
            let mut workspace = Workspace::create(tmp.path()).unwrap();
            workspace.keep();
            workspace.path().to_path_buf()
        };
        assert!(path.is_dir());
    }

    #[test]
    fn consecutive_workspaces_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let first = Workspace::create(tmp.path()).unwrap();
        let second = Workspace::create(tmp.path()).unwrap();
        assert_ne!(first.path(), second.path());
    }
}
