//! Built artifact publication.
//!
//! Walks the build output tree and uploads every file into its resolved
//! destination container, in deterministic walk order. Container existence
//! is mandatory: nothing is auto-created, and a missing container aborts
//! the remaining walk. A failure partway does not roll back artifacts
//! already published.

pub mod content;
pub mod resolver;

use crate::error::PipelineError;
use anyhow::{anyhow, Context, Result};
use self::content::{content_class, mime_type, ContentClass};
use self::resolver::{ArtifactUpload, ContainerHandle, ContainerResolver};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Destination folder name substituted for path segments named `system`.
pub const SYSTEM_FOLDER: &str = "_System";

/// Filename the favicon payload is written under before the walk.
pub const FAVICON_FILENAME: &str = "favicon.ico";

/// Prefix applied to uploaded names to disambiguate built output from
/// source assets.
pub const PUBLISH_PREFIX: &str = "dist-";

/// One published build artifact.
#[derive(Debug)]
pub struct PublishedArtifact {
    pub source: PathBuf,
    pub filename: String,
    pub extension: String,
    pub class: ContentClass,
    pub mime: &'static str,
    pub container: ContainerHandle,
    pub address: String,
}

/// Publish every file under `out_dir` into its destination container.
///
/// The favicon payload, when present, is written into `out_dir` first so
/// it publishes alongside the built output. An absent `out_dir` means the
/// build silently produced nothing and is fatal.
pub fn publish_all(
    out_dir: &Path,
    favicon: Option<&[u8]>,
    resolver: &dyn ContainerResolver,
) -> Result<Vec<PublishedArtifact>> {
    if !out_dir.is_dir() {
        return Err(PipelineError::BuildOutputMissing(out_dir.to_path_buf()).into());
    }

    if let Some(bytes) = favicon {
        let path = out_dir.join(FAVICON_FILENAME);
        fs::write(&path, bytes)
            .with_context(|| format!("writing favicon '{}'", path.display()))?;
        debug!("saved {}", path.display());
    }

    let mut published = Vec::new();
    for entry in WalkDir::new(out_dir).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("walking build output '{}'", out_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        published.push(publish_file(entry.path(), out_dir, resolver)?);
    }
    Ok(published)
}

fn publish_file(
    file: &Path,
    out_dir: &Path,
    resolver: &dyn ContainerResolver,
) -> Result<PublishedArtifact> {
    let filename = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("non-UTF-8 filename in build output '{}'", file.display()))?
        .to_string();
    // Substring after the last dot; a dotless filename is its own
    // extension token and falls through to the binary classification.
    let extension = filename.rsplit('.').next().unwrap_or("").to_string();
    debug!("found {}", file.display());

    let relative_dir = file
        .parent()
        .unwrap_or(out_dir)
        .strip_prefix(out_dir)
        .with_context(|| format!("computing relative path of '{}'", file.display()))?;
    let container_path = rewrite_destination_path(relative_dir);

    let container = resolver
        .resolve(&container_path)
        .with_context(|| format!("resolving destination container '{container_path}'"))?
        .ok_or_else(|| PipelineError::MissingDestinationContainer(container_path.clone()))?;

    let bytes =
        fs::read(file).with_context(|| format!("reading built file '{}'", file.display()))?;
    let class = content_class(&extension);
    let mime = mime_type(&extension);
    let name = format!("{PUBLISH_PREFIX}{filename}");
    let address = resolver
        .upload(
            &container,
            &ArtifactUpload {
                name: &name,
                bytes: &bytes,
                mime,
                class,
            },
        )
        .with_context(|| format!("uploading '{name}' to container '{}'", container.path))?;
    info!("published {address}");

    Ok(PublishedArtifact {
        source: file.to_path_buf(),
        filename,
        extension,
        class,
        mime,
        container,
        address,
    })
}

/// Rewrite a build-output relative directory into destination addressing:
/// forward-slash separators, with any segment exactly named `system`
/// replaced by the reserved system folder.
pub fn rewrite_destination_path(relative: &Path) -> String {
    let mut segments = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            let part = part.to_string_lossy();
            if part == "system" {
                segments.push(SYSTEM_FOLDER.to_string());
            } else {
                segments.push(part.into_owned());
            }
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::resolver::FsContainerResolver;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn system_segments_map_to_reserved_folder() {
        assert_eq!(
            rewrite_destination_path(Path::new("system/assets")),
            "_System/assets"
        );
        assert_eq!(
            rewrite_destination_path(Path::new("css/system")),
            "css/_System"
        );
    }

    #[test]
    fn non_system_segments_pass_through() {
        assert_eq!(rewrite_destination_path(Path::new("css/fonts")), "css/fonts");
        assert_eq!(
            rewrite_destination_path(Path::new("mysystem/assets")),
            "mysystem/assets"
        );
        assert_eq!(rewrite_destination_path(Path::new("")), "");
    }

    #[test]
    fn missing_output_directory_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let resolver = FsContainerResolver::new(tmp.path());
        let missing = tmp.path().join("dist");

        let err = publish_all(&missing, None, &resolver).unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::BuildOutputMissing(path)) => assert_eq!(path, &missing),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn publishes_walk_in_order_with_prefixed_names() {
        let tmp = TempDir::new().unwrap();
        let out_dir = tmp.path().join("dist");
        fs::create_dir_all(out_dir.join("system")).unwrap();
        fs::write(out_dir.join("style.css"), "body{}").unwrap();
        fs::write(out_dir.join("system/core.js"), "var x;").unwrap();

        let destination = tmp.path().join("site");
        fs::create_dir_all(destination.join("_System")).unwrap();
        let resolver = FsContainerResolver::new(&destination);

        let published = publish_all(&out_dir, None, &resolver).unwrap();

        let addresses: Vec<&str> = published
            .iter()
            .map(|artifact| artifact.address.as_str())
            .collect();
        assert_eq!(addresses, vec!["/dist-style.css", "/_System/dist-core.js"]);
        assert!(destination.join("dist-style.css").is_file());
        assert!(destination.join("_System/dist-core.js").is_file());

        assert_eq!(published[0].class, ContentClass::Text);
        assert_eq!(published[0].mime, "text/css");
        assert_eq!(published[1].extension, "js");
    }

    #[test]
    fn favicon_is_written_and_published_with_the_output() {
        let tmp = TempDir::new().unwrap();
        let out_dir = tmp.path().join("dist");
        fs::create_dir_all(&out_dir).unwrap();
        fs::write(out_dir.join("style.css"), "body{}").unwrap();

        let destination = tmp.path().join("site");
        fs::create_dir_all(&destination).unwrap();
        let resolver = FsContainerResolver::new(&destination);

        let published = publish_all(&out_dir, Some(b"icon-bytes"), &resolver).unwrap();

        let addresses: Vec<&str> = published
            .iter()
            .map(|artifact| artifact.address.as_str())
            .collect();
        assert_eq!(addresses, vec!["/dist-favicon.ico", "/dist-style.css"]);
        assert_eq!(
            fs::read(destination.join("dist-favicon.ico")).unwrap(),
            b"icon-bytes"
        );
    }

    #[test]
    fn missing_container_aborts_the_walk() {
        let tmp = TempDir::new().unwrap();
        let out_dir = tmp.path().join("dist");
        fs::create_dir_all(out_dir.join("fonts")).unwrap();
        fs::write(out_dir.join("fonts/icons.woff"), "woff").unwrap();

        let destination = tmp.path().join("site");
        fs::create_dir_all(&destination).unwrap();
        let resolver = FsContainerResolver::new(&destination);

        let err = publish_all(&out_dir, None, &resolver).unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::MissingDestinationContainer(path)) => {
                assert_eq!(path, "fonts");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn dotless_filenames_publish_as_binary() {
        let tmp = TempDir::new().unwrap();
        let out_dir = tmp.path().join("dist");
        fs::create_dir_all(&out_dir).unwrap();
        fs::write(out_dir.join("LICENSE"), "MIT").unwrap();

        let destination = tmp.path().join("site");
        fs::create_dir_all(&destination).unwrap();
        let resolver = FsContainerResolver::new(&destination);

        let published = publish_all(&out_dir, None, &resolver).unwrap();
        assert_eq!(published[0].class, ContentClass::Binary);
        assert_eq!(published[0].mime, "application/octet-stream");
        assert_eq!(published[0].address, "/dist-LICENSE");
    }
}
