//! Platform binaries archive installation.
//!
//! The Fabric command-line tools (`peer`, `orderer`, `configtxgen`, ...)
//! are published as a single `.tar.gz` per platform. [`install`] streams
//! that archive from the network through [`extraction::extract_tar_gz`]
//! into the installation directory without staging it on disk.

pub mod download;
pub mod extraction;

use crate::config::ProvisionConfig;
use crate::dirs::ensure_dir;
use crate::platform::Platform;
use camino::Utf8Path;
use download::{ArchiveFetcher, DownloadError};
use extraction::{ExtractionSummary, extract_tar_gz};
use log::info;
use std::io;
use thiserror::Error;

/// Errors from downloading or unpacking the binaries archive.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The archive could not be retrieved.
    #[error(transparent)]
    DownloadFailed(#[from] DownloadError),

    /// The archive holds an entry that is neither a directory nor a file.
    #[error("unsupported entry type '{type_flag}' for {name}")]
    UnsupportedEntryType {
        /// Path of the entry inside the archive.
        name: String,
        /// The tar type flag.
        type_flag: char,
    },

    /// An entry path would escape the installation directory.
    #[error("archive entry escapes the installation directory: {path}")]
    PathTraversal {
        /// The offending entry path.
        path: String,
    },

    /// Reading the archive or writing an entry failed.
    #[error("extraction failed at {context}: {source}")]
    ExtractionFailed {
        /// Entry path or stage at which extraction stopped.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Build the download URL of the binaries archive for `platform`.
///
/// # Examples
///
/// ```
/// use hlf_installer::archive::binaries_url;
/// use hlf_installer::config::ProvisionConfig;
/// use hlf_installer::platform::Platform;
///
/// let config = ProvisionConfig::with_install_dir("/tmp/hlf".into());
/// let platform = Platform::from_parts("linux", "x86_64", None)?;
/// let url = binaries_url(&config, &platform);
/// assert!(url.ends_with(
///     "/linux-amd64-1.1.0/hyperledger-fabric-linux-amd64-1.1.0.tar.gz"
/// ));
/// # Ok::<(), hlf_installer::platform::PlatformError>(())
/// ```
#[must_use]
pub fn binaries_url(config: &ProvisionConfig, platform: &Platform) -> String {
    let release = format!("{}-{}", platform.os_arch(), config.fabric_version);
    format!(
        "{}/{release}/{}-{release}.tar.gz",
        config.binaries_base_url.trim_end_matches('/'),
        config.artefact_prefix,
    )
}

/// Download the archive at `url` and unpack it into `install_dir`.
///
/// The installation directory is created first if it does not exist.
/// Entries already present are skipped, so repeating an installation leaves
/// existing files untouched.
///
/// # Errors
///
/// Returns [`InstallError::DownloadFailed`] if the request fails, or one of
/// the extraction variants if the body cannot be unpacked.
pub fn install(
    fetcher: &dyn ArchiveFetcher,
    url: &str,
    install_dir: &Utf8Path,
) -> Result<ExtractionSummary, InstallError> {
    ensure_dir(install_dir).map_err(|source| InstallError::ExtractionFailed {
        context: install_dir.to_string(),
        source,
    })?;

    info!("downloading {url}");
    let body = fetcher.fetch(url)?;
    let summary = extract_tar_gz(body, install_dir.as_std_path())?;
    info!(
        "installed {} files and {} directories into {install_dir} ({} already present)",
        summary.files, summary.directories, summary.skipped
    );
    Ok(summary)
}
