//! Module override merging.
//!
//! Each active module may ship an override archive that is extracted over
//! the workspace. A fixed set of mergeable files is special: instead of
//! letting the last module win, their lines are unioned across all modules,
//! first occurrence first, and flushed back after all extraction is done.

use crate::archive;
use crate::config::ActiveModule;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Relative paths whose lines are unioned across module override archives.
pub const MERGE_FILES: [&str; 3] = [
    "src/system/assets/less/_modules.less",
    "src/templates/partials/module-scripts-header.hbs",
    "src/templates/partials/module-scripts-footer.hbs",
];

/// Accumulated line sets for the fixed mergeable files.
///
/// Lines are stored trimmed, in first-encountered order; a line already
/// present for a file is never added again. The key set is fixed at
/// construction and never grows.
#[derive(Debug)]
pub struct MergeFileSet {
    files: Vec<MergeFile>,
}

#[derive(Debug)]
pub struct MergeFile {
    pub relative_path: &'static str,
    pub lines: Vec<String>,
}

impl Default for MergeFileSet {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeFileSet {
    pub fn new() -> Self {
        Self {
            files: MERGE_FILES
                .into_iter()
                .map(|path| MergeFile {
                    relative_path: path,
                    lines: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn files(&self) -> &[MergeFile] {
        &self.files
    }

    /// Fold the workspace's current copy of each mergeable file into the
    /// accumulated line sets. Files absent from the workspace are skipped.
    fn collect_from(&mut self, workspace: &Path) -> Result<()> {
        for file in &mut self.files {
            let path = workspace.join(file.relative_path);
            if !path.is_file() {
                continue;
            }
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading mergeable file '{}'", path.display()))?;
            for line in content.lines() {
                let trimmed = line.trim();
                if !file.lines.iter().any(|existing| existing == trimmed) {
                    file.lines.push(trimmed.to_string());
                }
            }
        }
        Ok(())
    }
}

/// Extract each module's override archive over the workspace and fold its
/// mergeable files into `set`, in module order.
///
/// The result is fully determined by module order, the fixed path order and
/// line order within each file. Modules without an override archive are
/// skipped.
pub fn merge_modules(
    modules: &[ActiveModule],
    workspace: &Path,
    set: &mut MergeFileSet,
) -> Result<()> {
    for module in modules {
        let Some(override_archive) = module.override_archive() else {
            debug!("module {} has no override archive", module.name);
            continue;
        };
        archive::extract(&override_archive.bytes, workspace)
            .with_context(|| format!("extracting override archive for module '{}'", module.name))?;
        set.collect_from(workspace)
            .with_context(|| format!("merging files from module '{}'", module.name))?;
    }
    Ok(())
}
