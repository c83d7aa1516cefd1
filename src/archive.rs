//! Zip payload extraction.

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use zip::ZipArchive;

/// Extract a zip payload into `dest`, overwriting files that already exist
/// at an entry's relative path.
///
/// The bytes are spooled to a temporary file inside `dest` first; entries
/// whose names would escape the destination are rejected. No
/// partial-extraction recovery: a failure partway leaves a partially
/// populated destination, and the caller discards the workspace on any
/// failure.
pub fn extract(payload: &[u8], dest: &Path) -> Result<()> {
    let mut spool = NamedTempFile::new_in(dest)
        .with_context(|| format!("creating archive spool file in '{}'", dest.display()))?;
    spool
        .write_all(payload)
        .with_context(|| format!("writing archive payload to '{}'", spool.path().display()))?;

    let file = File::open(spool.path())
        .with_context(|| format!("reopening archive spool '{}'", spool.path().display()))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("opening archive payload for '{}'", dest.display()))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("reading archive entry {index}"))?;
        let Some(relative) = entry.enclosed_name() else {
            bail!("archive entry '{}' escapes the extraction root", entry.name());
        };
        let target = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("creating extracted directory '{}'", target.display()))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating '{}'", parent.display()))?;
        }
        let mut out = File::create(&target)
            .with_context(|| format!("writing extracted file '{}'", target.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("extracting '{}'", target.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&target, fs::Permissions::from_mode(mode)).with_context(
                    || format!("setting permissions on '{}'", target.display()),
                )?;
            }
        }
    }

    Ok(())
}

/// Build an in-memory zip payload for tests.
#[cfg(test)]
pub(crate) fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    use std::io::Cursor;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(name.trim_end_matches('/'), SimpleFileOptions::default())
                .unwrap();
        } else {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}
