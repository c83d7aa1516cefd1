//! Pipeline inputs: the design package, active modules and settings.
//!
//! The pipeline never talks to a content repository directly. It consumes
//! everything through the narrow [`DesignSource`] capability; the bundled
//! [`FileDesignSource`] implementation reads a TOML manifest with binary
//! payloads stored as files next to it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Build tool resolved from `PATH` when the package does not name one.
pub const DEFAULT_BUILD_TOOL: &str = "npm";

/// A single ordered style variable rendered into the overrides file.
#[derive(Debug, Clone)]
pub struct StyleVariable {
    pub name: String,
    pub value: String,
}

/// The base design package plus user customization.
#[derive(Debug, Clone)]
pub struct DesignPackage {
    /// Base design archive payload (zip).
    pub archive: Vec<u8>,
    pub favicon: Option<Vec<u8>>,
    /// Ordered style variables; empty values are skipped when rendering.
    pub variables: Vec<StyleVariable>,
    /// Raw code block appended verbatim after the variables.
    pub code_block: Option<String>,
    pub version: String,
    /// Path of the build tool executable; blank falls back to the default.
    pub build_tool: Option<String>,
}

impl DesignPackage {
    /// The build tool to invoke: the configured path when present and
    /// non-blank, otherwise [`DEFAULT_BUILD_TOOL`] looked up on `PATH`.
    pub fn resolve_build_tool(&self) -> String {
        match self.build_tool.as_deref().map(str::trim) {
            Some(tool) if !tool.is_empty() => tool.to_string(),
            _ => which::which(DEFAULT_BUILD_TOOL)
                .map(|path| path.display().to_string())
                .unwrap_or_else(|_| DEFAULT_BUILD_TOOL.to_string()),
        }
    }
}

/// A named binary configuration entry attached to a module.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A unit of optional front-end customization.
#[derive(Debug, Clone)]
pub struct ActiveModule {
    pub name: String,
    pub attachments: Vec<Attachment>,
}

impl ActiveModule {
    /// The module's override archive: the first attachment whose filename
    /// ends in `.zip`. Modules without one contribute nothing.
    pub fn override_archive(&self) -> Option<&Attachment> {
        self.attachments
            .iter()
            .find(|attachment| attachment.filename.ends_with(".zip"))
    }
}

/// Narrow capability for reading pipeline inputs.
pub trait DesignSource {
    fn design_package(&self) -> Result<DesignPackage>;

    /// Active modules in iteration order. Order matters: it fixes the merge
    /// result.
    fn active_modules(&self) -> Result<Vec<ActiveModule>>;

    /// Free-form pipeline setting (e.g. `cleanup`); absent keys yield None.
    fn setting(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestToml {
    version: String,
    archive: String,
    favicon: Option<String>,
    code: Option<String>,
    build_tool: Option<String>,
    #[serde(default)]
    variables: Vec<VariableToml>,
    #[serde(default)]
    modules: Vec<ModuleToml>,
    #[serde(default)]
    settings: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariableToml {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleToml {
    name: String,
    #[serde(default)]
    attachments: Vec<String>,
}

/// Design source backed by a TOML manifest on disk.
///
/// Archive, favicon and attachment values are paths relative to the
/// manifest file; their bytes are read when the package is requested.
#[derive(Debug)]
pub struct FileDesignSource {
    base_dir: PathBuf,
    manifest: ManifestToml,
}

impl FileDesignSource {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading design manifest '{}'", path.display()))?;
        let manifest: ManifestToml = toml::from_str(&raw)
            .with_context(|| format!("parsing design manifest '{}'", path.display()))?;
        let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Ok(Self { base_dir, manifest })
    }

    fn read_payload(&self, relative: &str) -> Result<Vec<u8>> {
        let path = self.base_dir.join(relative);
        fs::read(&path).with_context(|| format!("reading design payload '{}'", path.display()))
    }
}

impl DesignSource for FileDesignSource {
    fn design_package(&self) -> Result<DesignPackage> {
        let archive = self.read_payload(&self.manifest.archive)?;
        let favicon = self
            .manifest
            .favicon
            .as_deref()
            .map(|relative| self.read_payload(relative))
            .transpose()?;
        let variables = self
            .manifest
            .variables
            .iter()
            .map(|variable| StyleVariable {
                name: variable.name.clone(),
                value: variable.value.clone(),
            })
            .collect();

        Ok(DesignPackage {
            archive,
            favicon,
            variables,
            code_block: self.manifest.code.clone(),
            version: self.manifest.version.clone(),
            build_tool: self.manifest.build_tool.clone(),
        })
    }

    fn active_modules(&self) -> Result<Vec<ActiveModule>> {
        self.manifest
            .modules
            .iter()
            .map(|module| {
                let attachments = module
                    .attachments
                    .iter()
                    .map(|relative| {
                        Ok(Attachment {
                            filename: filename_of(relative),
                            bytes: self.read_payload(relative)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("reading attachments for module '{}'", module.name))?;
                Ok(ActiveModule {
                    name: module.name.clone(),
                    attachments,
                })
            })
            .collect()
    }

    fn setting(&self, name: &str) -> Option<String> {
        self.manifest.settings.get(name).cloned()
    }
}

fn filename_of(relative: &str) -> String {
    Path::new(relative)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(relative)
        .to_string()
}
