//! User customization overlay.
//!
//! Runs strictly after all archive extraction so a later module archive
//! cannot clobber what is written here.

use crate::config::StyleVariable;
use crate::merge::MergeFileSet;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Fixed-path file carrying the rendered style variables and code block.
pub const CUSTOM_OVERRIDES_FILE: &str = "src/system/assets/less/_custom.less";

/// Render the style variables and code block into the custom-overrides
/// file, overwriting whatever the unpacked archives put there.
///
/// Each variable with a non-empty value becomes one `@name: value;`
/// declaration line; the code block follows verbatim. With both inputs
/// absent the file is written empty.
pub fn write_overlay(
    workspace: &Path,
    variables: &[StyleVariable],
    code_block: Option<&str>,
) -> Result<()> {
    let mut content = String::new();
    for variable in variables {
        if variable.value.is_empty() {
            continue;
        }
        content.push_str(&format!("@{}: {};\n", variable.name, variable.value));
    }
    if let Some(code) = code_block {
        content.push_str(code);
    }

    let path = workspace.join(CUSTOM_OVERRIDES_FILE);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating '{}'", parent.display()))?;
    }
    fs::write(&path, &content)
        .with_context(|| format!("writing custom overrides '{}'", path.display()))?;
    debug!("saved {}", path.display());
    Ok(())
}

/// Overwrite each mergeable file with its accumulated line sequence.
pub fn flush_merge_files(workspace: &Path, set: &MergeFileSet) -> Result<()> {
    for file in set.files() {
        let path = workspace.join(file.relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating '{}'", parent.display()))?;
        }
        fs::write(&path, file.lines.join("\n"))
            .with_context(|| format!("writing merged file '{}'", path.display()))?;
        debug!("saved {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MERGE_FILES;
    use tempfile::TempDir;

    fn variable(name: &str, value: &str) -> StyleVariable {
        StyleVariable {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn renders_variables_and_code_block() {
        let tmp = TempDir::new().unwrap();
        let variables = vec![
            variable("main-color", "#0072c6"),
            variable("font-size", "14px"),
        ];

        write_overlay(tmp.path(), &variables, Some("@import 'extra';")).unwrap();

        let content = fs::read_to_string(tmp.path().join(CUSTOM_OVERRIDES_FILE)).unwrap();
        assert_eq!(
            content,
            "@main-color: #0072c6;\n@font-size: 14px;\n@import 'extra';"
        );
    }

    #[test]
    fn skips_variables_with_empty_values() {
        let tmp = TempDir::new().unwrap();
        let variables = vec![variable("unset", ""), variable("set", "1")];

        write_overlay(tmp.path(), &variables, None).unwrap();

        let content = fs::read_to_string(tmp.path().join(CUSTOM_OVERRIDES_FILE)).unwrap();
        assert_eq!(content, "@set: 1;\n");
    }

    #[test]
    fn absent_inputs_write_an_empty_file() {
        let tmp = TempDir::new().unwrap();

        write_overlay(tmp.path(), &[], None).unwrap();

        let content = fs::read_to_string(tmp.path().join(CUSTOM_OVERRIDES_FILE)).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn overwrites_extracted_overrides() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CUSTOM_OVERRIDES_FILE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "from the base archive").unwrap();

        write_overlay(tmp.path(), &[variable("a", "b")], None).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "@a: b;\n");
    }

    #[test]
    fn flush_writes_every_merge_file() {
        let tmp = TempDir::new().unwrap();
        let mut set = MergeFileSet::new();
        merge_lines(&mut set, MERGE_FILES[0], &["a", "b"]);

        flush_merge_files(tmp.path(), &set).unwrap();

        assert_eq!(
            fs::read_to_string(tmp.path().join(MERGE_FILES[0])).unwrap(),
            "a\nb"
        );
        for path in &MERGE_FILES[1..] {
            assert_eq!(fs::read_to_string(tmp.path().join(path)).unwrap(), "");
        }
    }

    #[test]
    fn flush_replaces_extracted_merge_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MERGE_FILES[0]);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "last module wins? no").unwrap();

        let mut set = MergeFileSet::new();
        merge_lines(&mut set, MERGE_FILES[0], &["merged"]);
        flush_merge_files(tmp.path(), &set).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "merged");
    }

    // Seed a merge set through the public merge path: extract a one-file
    // archive into a scratch workspace and collect it.
    fn merge_lines(set: &mut MergeFileSet, path: &'static str, lines: &[&str]) {
        use crate::archive::zip_bytes;
        use crate::config::{ActiveModule, Attachment};

        let scratch = TempDir::new().unwrap();
        let joined = lines.join("\n");
        let payload = zip_bytes(&[(path, joined.as_str())]);
        let modules = vec![ActiveModule {
            name: "seed".to_string(),
            attachments: vec![Attachment {
                filename: "seed.zip".to_string(),
                bytes: payload,
            }],
        }];
        crate::merge::merge_modules(&modules, scratch.path(), set).unwrap();
    }
}
