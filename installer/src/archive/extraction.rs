//! Streaming `.tar.gz` extraction into the installation directory.
//!
//! Entries are read one at a time from a gzip-decoding reader, so the
//! archive is never held in memory. Only directories and regular files are
//! accepted. Extraction is idempotent: a directory or file that already
//! exists at an entry's path is left as it is and the entry is skipped.

use super::InstallError;
use crate::dirs::ensure_std_dir;
use flate2::read::GzDecoder;
use log::{debug, trace};
use std::fs::OpenOptions;
use std::io::{self, Read};
use std::path::{Component, Path};
use tar::EntryType;

/// Permission bits for files whose header carries no usable mode.
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Counts of what an extraction did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Directories created.
    pub directories: usize,
    /// Regular files written.
    pub files: usize,
    /// Entries left untouched because their path already existed.
    pub skipped: usize,
}

/// Extract a gzip-compressed tar stream into `dest`.
///
/// # Errors
///
/// - [`InstallError::UnsupportedEntryType`] for anything other than a
///   directory or regular file (symlinks included).
/// - [`InstallError::PathTraversal`] for absolute paths or `..` components.
/// - [`InstallError::ExtractionFailed`] for read errors before the end of
///   the archive, write errors, or a path occupied by the wrong kind of
///   entry.
pub fn extract_tar_gz<R: Read>(reader: R, dest: &Path) -> Result<ExtractionSummary, InstallError> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut summary = ExtractionSummary::default();

    let entries = archive
        .entries()
        .map_err(|source| extraction_failed("archive", source))?;

    for entry_result in entries {
        let mut entry = entry_result.map_err(|source| extraction_failed("archive", source))?;
        let entry_path = entry
            .path()
            .map_err(|source| extraction_failed("entry header", source))?
            .into_owned();
        let name = entry_path.display().to_string();
        validate_entry_path(&entry_path)?;

        let target = dest.join(&entry_path);
        let created = match entry.header().entry_type() {
            EntryType::Directory => create_directory(&target, &name)?,
            EntryType::Regular => {
                let mode = entry.header().mode().unwrap_or(DEFAULT_FILE_MODE);
                write_file(&mut entry, &target, mode, &name)?
            }
            other => {
                return Err(InstallError::UnsupportedEntryType {
                    name,
                    type_flag: char::from(other.as_byte()),
                });
            }
        };

        match (created, entry.header().entry_type().is_dir()) {
            (false, _) => {
                debug!("skipping existing {name}");
                summary.skipped += 1;
            }
            (true, true) => summary.directories += 1,
            (true, false) => summary.files += 1,
        }
    }

    Ok(summary)
}

/// Create a directory entry. Returns `false` if it already existed.
fn create_directory(target: &Path, name: &str) -> Result<bool, InstallError> {
    if target.is_dir() {
        return Ok(false);
    }
    if target.exists() {
        return Err(occupied(name, "directory"));
    }
    trace!("creating directory {}", target.display());
    ensure_std_dir(target).map_err(|source| extraction_failed(name, source))?;
    Ok(true)
}

/// Write a regular file entry. Returns `false` if the file already existed.
fn write_file(
    entry: &mut impl Read,
    target: &Path,
    mode: u32,
    name: &str,
) -> Result<bool, InstallError> {
    if target.is_file() {
        return Ok(false);
    }
    if target.exists() {
        return Err(occupied(name, "regular file"));
    }
    if let Some(parent) = target.parent() {
        ensure_std_dir(parent).map_err(|source| extraction_failed(name, source))?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode & 0o777);
    }
    #[cfg(not(unix))]
    let _ = mode;

    trace!("writing file {}", target.display());
    let mut file = match options.open(target) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(source) => return Err(extraction_failed(name, source)),
    };
    if let Err(source) = io::copy(entry, &mut file) {
        // A partial file would be skipped as existing on the next run.
        drop(file);
        if let Err(err) = std::fs::remove_file(target) {
            debug!("could not remove partial file {}: {err}", target.display());
        }
        return Err(extraction_failed(name, source));
    }
    Ok(true)
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), InstallError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(InstallError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

fn occupied(name: &str, expected: &str) -> InstallError {
    extraction_failed(
        name,
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("path exists but is not a {expected}"),
        ),
    )
}

fn extraction_failed(context: &str, source: io::Error) -> InstallError {
    InstallError::ExtractionFailed {
        context: context.to_owned(),
        source,
    }
}
