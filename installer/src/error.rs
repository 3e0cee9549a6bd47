//! Error types for the hlf installer.
//!
//! Each component reports failures through its own enum; [`OrchestrationError`]
//! gathers them so a run can be reported from a single place.

use crate::archive::InstallError;
use crate::config::ConfigError;
use crate::images::ProvisionError;
use crate::platform::PlatformError;
use crate::preflight::EnvironmentError;
use crate::samples::SamplesError;
use thiserror::Error;

/// Errors that end a provisioning run.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// The requested scope is not one of the known targets.
    #[error("unknown target \"{value}\"; expected one of: images, binaries, samples, all")]
    UnknownTarget {
        /// The scope string as given.
        value: String,
    },

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The host is not ready to run Fabric.
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// Pulling or tagging an image failed.
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// Installing the binaries archive failed.
    #[error(transparent)]
    Install(#[from] InstallError),

    /// Fetching the samples repository failed.
    #[error(transparent)]
    Samples(#[from] SamplesError),

    /// The host platform has no published artefacts.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl OrchestrationError {
    /// Returns `true` for failures the user can usually fix by changing the
    /// host environment (installing or starting Docker) and re-running.
    ///
    /// # Examples
    ///
    /// ```
    /// use hlf_installer::error::OrchestrationError;
    /// use hlf_installer::preflight::EnvironmentError;
    ///
    /// let err = OrchestrationError::from(EnvironmentError::DaemonUnreachable);
    /// assert!(err.is_environment_problem());
    /// ```
    #[must_use]
    pub fn is_environment_problem(&self) -> bool {
        matches!(self, Self::Environment(_))
    }
}

/// Result type alias for orchestration operations.
pub type Result<T> = std::result::Result<T, OrchestrationError>;
