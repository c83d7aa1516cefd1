//! End-to-end assemble, build and publish pipeline.
//!
//! Stages run strictly in sequence: merge module overrides, unpack the base
//! design over them, write the customization overlay, run the build tool,
//! publish the output tree. Any failure aborts immediately; the workspace
//! is removed on both terminal states unless cleanup is suppressed.

use crate::archive;
use crate::build;
use crate::config::DesignSource;
use crate::error::PipelineError;
use crate::merge::{self, MergeFileSet};
use crate::overlay;
use crate::publish;
use crate::publish::content::ContentClass;
use crate::publish::resolver::{ArtifactUpload, ContainerResolver};
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Directory the build tool writes its compiled output into.
pub const OUTPUT_DIR: &str = "dist";

/// Setting key suppressing workspace removal when equal to `"false"`.
pub const CLEANUP_SETTING: &str = "cleanup";

/// Setting key overriding the workspace parent directory.
pub const WORKSPACE_ROOT_SETTING: &str = "workspace_root";

/// Name the version report is uploaded under.
const VERSION_REPORT_NAME: &str = "version";

#[derive(Serialize)]
struct SuccessPayload<'a> {
    status: &'static str,
    files: &'a [String],
}

#[derive(Serialize)]
struct VersionReport<'a> {
    version: &'a str,
}

/// Ordered addresses of all published artifacts.
#[derive(Debug)]
pub struct PipelineResult {
    pub addresses: Vec<String>,
}

impl PipelineResult {
    /// Fixed-shape success payload. There is no failure-shaped payload; a
    /// failed run propagates its error and emits nothing.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&SuccessPayload {
            status: "Success",
            files: &self.addresses,
        })
        .context("serializing result payload")
    }
}

/// Fixed-shape version report payload.
pub fn version_report(version: &str) -> Result<String> {
    serde_json::to_string(&VersionReport { version }).context("serializing version report")
}

/// Run the whole pipeline against a design source and a destination.
///
/// The workspace is removed on every exit path unless the `cleanup`
/// setting is the string `"false"` (case-insensitive); any other value,
/// including absence, means cleanup runs.
pub fn run(source: &dyn DesignSource, resolver: &dyn ContainerResolver) -> Result<PipelineResult> {
    let package = source.design_package().context("reading design package")?;
    let modules = source.active_modules().context("reading active modules")?;

    publish_version_report(&package.version, resolver)?;

    let tool = package.resolve_build_tool();

    let mut workspace = Workspace::create(&workspace_root(source))?;
    if cleanup_suppressed(source) {
        workspace.keep();
    }

    // Module overrides go in first; the base design archive is unpacked
    // over them and wins every straight file collision. The merge files
    // and overlay are flushed last so no extraction can clobber them.
    let mut merge_set = MergeFileSet::new();
    merge::merge_modules(&modules, workspace.path(), &mut merge_set)?;

    archive::extract(&package.archive, workspace.path())
        .context("extracting base design archive")?;

    overlay::write_overlay(
        workspace.path(),
        &package.variables,
        package.code_block.as_deref(),
    )?;
    overlay::flush_merge_files(workspace.path(), &merge_set)?;

    let outcome = build::invoke_build(workspace.path(), &tool)?;
    if !outcome.stdout.is_empty() {
        info!("{}", outcome.stdout);
    }
    build::check_outcome(&outcome, &tool)?;

    let out_dir = workspace.path().join(OUTPUT_DIR);
    let artifacts = publish::publish_all(&out_dir, package.favicon.as_deref(), resolver)?;

    Ok(PipelineResult {
        addresses: artifacts
            .into_iter()
            .map(|artifact| artifact.address)
            .collect(),
    })
}

fn workspace_root(source: &dyn DesignSource) -> PathBuf {
    source
        .setting(WORKSPACE_ROOT_SETTING)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

fn cleanup_suppressed(source: &dyn DesignSource) -> bool {
    source
        .setting(CLEANUP_SETTING)
        .is_some_and(|value| value.eq_ignore_ascii_case("false"))
}

/// Upload the version report to the destination root, ahead of the
/// pipeline proper.
fn publish_version_report(version: &str, resolver: &dyn ContainerResolver) -> Result<()> {
    let payload = version_report(version)?;
    let root = resolver
        .resolve("")
        .context("resolving destination root container")?
        .ok_or_else(|| PipelineError::MissingDestinationContainer(String::new()))?;
    let address = resolver
        .upload(
            &root,
            &ArtifactUpload {
                name: VERSION_REPORT_NAME,
                bytes: payload.as_bytes(),
                mime: "application/json",
                class: ContentClass::Text,
            },
        )
        .context("uploading version report")?;
    info!("published {address}");
    Ok(())
}
