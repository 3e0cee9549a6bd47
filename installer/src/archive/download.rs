//! HTTP retrieval of the platform binaries archive.
//!
//! [`ArchiveFetcher`] hands back the response body as a reader so the
//! caller can decompress it while it streams in. [`HttpFetcher`] is the
//! `ureq` implementation; tests substitute an in-memory source.

use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

/// Network timeout for the whole archive download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Trait for opening a streaming download.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveFetcher {
    /// Issue a GET for `url` and return the response body.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on transport failure or a non-2xx status.
    fn fetch(&self, url: &str) -> Result<Box<dyn Read>, DownloadError>;
}

/// Errors arising from archive download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested archive was not found (HTTP 404).
    #[error("archive not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },
}

/// HTTP-based fetcher using `ureq`.
///
/// # Examples
///
/// ```no_run
/// use hlf_installer::archive::download::{ArchiveFetcher, HttpFetcher};
///
/// let mut body = HttpFetcher.fetch("https://example.com/archive.tar.gz")?;
/// let mut first = [0_u8; 2];
/// std::io::Read::read_exact(&mut body, &mut first).ok();
/// # Ok::<(), hlf_installer::archive::download::DownloadError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl ArchiveFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Box<dyn Read>, DownloadError> {
        log::debug!("GET {url}");
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        Ok(Box::new(response.into_body().into_reader()))
    }
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error("https://example.test/bin.tar.gz", &err);
        assert!(matches!(mapped, DownloadError::NotFound { .. }));
    }

    #[test]
    fn map_ureq_error_maps_other_status_to_http_error() {
        let err = ureq::Error::StatusCode(503);
        let mapped = map_ureq_error("https://example.test/bin.tar.gz", &err);
        match mapped {
            DownloadError::HttpError { url, reason } => {
                assert_eq!(url, "https://example.test/bin.tar.gz");
                assert!(reason.contains("503"), "reason: {reason}");
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }
}
