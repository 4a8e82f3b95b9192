//! Serialize a [`ProcessedResult`] to files: one pretty-printed JSON per
//! entry, written to a directory or bundled into a zip archive.
//!
//! Entry order is stable: `manifest.json` first, then token files in
//! mode order. Zip entries carry no timestamps, so identical results give
//! byte-identical bundles.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Component, Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ArchiveError, ArchiveResult};
use crate::models::{ProcessedResult, MANIFEST_FILE_NAME};

/// Pretty-printed contents of every file, manifest first.
pub fn file_contents(result: &ProcessedResult) -> ArchiveResult<Vec<(String, String)>> {
    let mut files = Vec::with_capacity(result.json_files.len());
    files.push((MANIFEST_FILE_NAME.to_string(), file_content(result, MANIFEST_FILE_NAME)?));

    for name in result.token_file_names() {
        let content = file_content(result, &name)?;
        files.push((name, content));
    }

    Ok(files)
}

/// Pretty-printed contents of one file.
pub fn file_content(result: &ProcessedResult, name: &str) -> ArchiveResult<String> {
    let value = result
        .json_files
        .get(name)
        .ok_or_else(|| ArchiveError::UnknownFile(name.to_string()))?;
    Ok(serde_json::to_string_pretty(value)?)
}

/// Zip archive with every file of the result.
pub fn bundle(result: &ProcessedResult) -> ArchiveResult<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, content) in file_contents(result)? {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Write every file into `dir`, creating it if needed.
///
/// Names that are not a single plain path segment are refused; use
/// sanitized file names for modes containing path separators.
pub fn write_files(result: &ProcessedResult, dir: &Path) -> ArchiveResult<Vec<PathBuf>> {
    let files = file_contents(result)?;
    if let Some((name, _)) = files.iter().find(|(name, _)| !is_plain_file_name(name)) {
        return Err(ArchiveError::UnsafePath(name.clone()));
    }

    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = dir.join(&name);
        fs::write(&path, content)?;
        written.push(path);
    }

    Ok(written)
}

/// Write the zip bundle to `path`.
pub fn write_bundle(result: &ProcessedResult, path: &Path) -> ArchiveResult<()> {
    let bytes = bundle(result)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains('\\')
}
