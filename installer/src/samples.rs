//! Fetching the Fabric samples repository.
//!
//! The samples are cloned shallowly at the tag matching the installed Fabric
//! release. An existing checkout is left alone; updating it is up to the
//! user.

use crate::exec::{CommandExecutor, display_command};
use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Directory name of the samples checkout inside the installation directory.
pub const SAMPLES_DIR_NAME: &str = "fabric-samples";

/// Timeout for git operations (5 minutes).
const GIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from fetching the samples repository.
#[derive(Debug, Error)]
pub enum SamplesError {
    /// A git command failed or timed out.
    #[error("git {operation} failed: {message}")]
    Git {
        /// The git subcommand.
        operation: &'static str,
        /// Trimmed stderr or timeout description.
        message: String,
    },

    /// The destination's parent directory could not be created.
    #[error("failed to prepare {path}: {source}")]
    Io {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// What [`fetch_samples`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplesOutcome {
    /// The repository was cloned into this path.
    Cloned(Utf8PathBuf),
    /// A checkout already existed at this path and was left untouched.
    AlreadyPresent(Utf8PathBuf),
}

impl SamplesOutcome {
    /// Path of the samples checkout.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Cloned(path) | Self::AlreadyPresent(path) => path,
        }
    }
}

/// Clone `repo_url` at tag `v{version}` into `dest` unless `dest` exists.
///
/// # Errors
///
/// Returns [`SamplesError::Git`] if `git` is missing, fails, or runs past
/// the timeout, and [`SamplesError::Io`] if the parent of `dest` cannot be
/// created.
pub fn fetch_samples(
    executor: &dyn CommandExecutor,
    repo_url: &str,
    version: &str,
    dest: &Utf8Path,
) -> Result<SamplesOutcome, SamplesError> {
    if dest.exists() {
        log::info!("{dest} already exists; skipping clone");
        return Ok(SamplesOutcome::AlreadyPresent(dest.to_owned()));
    }

    if let Some(parent) = dest.parent() {
        crate::dirs::ensure_dir(parent).map_err(|source| SamplesError::Io {
            path: parent.to_owned(),
            source,
        })?;
    }

    let branch = format!("v{version}");
    let args = [
        "clone",
        "--depth",
        "1",
        "--branch",
        branch.as_str(),
        repo_url,
        dest.as_str(),
    ];
    log::debug!("{}", display_command("git", &args));

    let output = executor
        .run_with_timeout("git", &args, GIT_TIMEOUT)
        .map_err(|err| SamplesError::Git {
            operation: "clone",
            message: err.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SamplesError::Git {
            operation: "clone",
            message: stderr.trim().to_owned(),
        });
    }

    Ok(SamplesOutcome::Cloned(dest.to_owned()))
}
