//! Sequencing of the provisioning steps.
//!
//! An [`Orchestrator`] runs one [`ProvisioningTarget`]: the preflight checks
//! first (for the targets that touch Docker), then the image batches and/or
//! the binaries archive, stopping at the first failure. Progress is tracked
//! as a [`RunState`] that only moves forward; any failure moves it to
//! [`RunState::Failed`].

use crate::archive::download::ArchiveFetcher;
use crate::archive::{binaries_url, install};
use crate::config::ProvisionConfig;
use crate::error::{OrchestrationError, Result};
use crate::exec::CommandExecutor;
use crate::images::{image_tag, provision};
use crate::output::{
    ShellSnippet, binaries_message, images_message, samples_message, write_stderr_line,
};
use crate::platform::Platform;
use crate::preflight::check_environment;
use crate::runtime::ContainerRuntime;
use crate::samples::{SAMPLES_DIR_NAME, fetch_samples};
use log::{debug, info, warn};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// What a run provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningTarget {
    /// Platform and third-party container images.
    Images,
    /// The platform binaries archive.
    Binaries,
    /// The Fabric samples repository.
    Samples,
    /// Images, then binaries.
    All,
}

impl ProvisioningTarget {
    /// Resolve an optional scope argument; no scope means [`Self::All`].
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::UnknownTarget`] for unrecognised scopes.
    ///
    /// # Examples
    ///
    /// ```
    /// use hlf_installer::orchestrator::ProvisioningTarget;
    ///
    /// assert_eq!(ProvisioningTarget::from_scope(None)?, ProvisioningTarget::All);
    /// assert_eq!(
    ///     ProvisioningTarget::from_scope(Some("binaries"))?,
    ///     ProvisioningTarget::Binaries
    /// );
    /// assert!(ProvisioningTarget::from_scope(Some("chaincode")).is_err());
    /// # Ok::<(), hlf_installer::error::OrchestrationError>(())
    /// ```
    pub fn from_scope(scope: Option<&str>) -> Result<Self> {
        scope.map_or(Ok(Self::All), Self::from_str)
    }

    /// Returns `true` if the target needs Docker and docker-compose.
    #[must_use]
    pub const fn needs_runtime(self) -> bool {
        !matches!(self, Self::Samples)
    }

    const fn includes_images(self) -> bool {
        matches!(self, Self::Images | Self::All)
    }

    const fn includes_binaries(self) -> bool {
        matches!(self, Self::Binaries | Self::All)
    }
}

impl FromStr for ProvisioningTarget {
    type Err = OrchestrationError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "images" => Ok(Self::Images),
            "binaries" => Ok(Self::Binaries),
            "samples" => Ok(Self::Samples),
            "all" => Ok(Self::All),
            other => Err(OrchestrationError::UnknownTarget {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ProvisioningTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Images => "images",
            Self::Binaries => "binaries",
            Self::Samples => "samples",
            Self::All => "all",
        })
    }
}

/// Progress of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Nothing has happened yet.
    Idle,
    /// The environment checks passed.
    PreflightPassed,
    /// Every image was pulled and tagged.
    ImagesDone,
    /// The binaries archive was installed.
    BinariesDone,
    /// The samples repository is in place.
    SamplesDone,
    /// The run finished successfully.
    Complete,
    /// A step failed; the run is over.
    Failed(String),
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::PreflightPassed => f.write_str("preflight passed"),
            Self::ImagesDone => f.write_str("images done"),
            Self::BinariesDone => f.write_str("binaries done"),
            Self::SamplesDone => f.write_str("samples done"),
            Self::Complete => f.write_str("complete"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// External systems an [`Orchestrator`] drives.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Container engine used for preflight and images.
    pub runtime: &'a dyn ContainerRuntime,
    /// Source of the binaries archive.
    pub fetcher: &'a dyn ArchiveFetcher,
    /// Subprocess runner used for `git`.
    pub executor: &'a dyn CommandExecutor,
}

/// Runs provisioning targets against one configuration.
pub struct Orchestrator<'a> {
    config: &'a ProvisionConfig,
    platform: &'a Platform,
    collaborators: Collaborators<'a>,
    quiet: bool,
    state: RunState,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator in the [`RunState::Idle`] state.
    #[must_use]
    pub fn new(
        config: &'a ProvisionConfig,
        platform: &'a Platform,
        collaborators: Collaborators<'a>,
        quiet: bool,
    ) -> Self {
        Self {
            config,
            platform,
            collaborators,
            quiet,
            state: RunState::Idle,
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Parse `scope` and run the resulting target.
    ///
    /// An unrecognised scope is rejected before anything else happens.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::UnknownTarget`] for a bad scope, or the
    /// error of the first failing step.
    pub fn run_scope(&mut self, scope: Option<&str>, stderr: &mut dyn Write) -> Result<RunState> {
        let target = ProvisioningTarget::from_scope(scope)?;
        self.run(target, stderr)
    }

    /// Run `target` to completion.
    ///
    /// Returns [`RunState::Complete`] on success. On failure the state is
    /// left at [`RunState::Failed`] and the error is returned; work already
    /// done is not undone.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing step.
    pub fn run(&mut self, target: ProvisioningTarget, stderr: &mut dyn Write) -> Result<RunState> {
        info!("provisioning target {target}");
        match self.run_steps(target, stderr) {
            Ok(()) => {
                self.advance(RunState::Complete);
                Ok(self.state.clone())
            }
            Err(err) => {
                warn!("{target} failed in state {}: {err}", self.state);
                self.advance(RunState::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    fn run_steps(&mut self, target: ProvisioningTarget, stderr: &mut dyn Write) -> Result<()> {
        if target.needs_runtime() {
            self.progress(stderr, "Checking docker and docker-compose...");
            let report = check_environment(self.collaborators.runtime, self.config)?;
            debug!("preflight report: {report:?}");
            self.advance(RunState::PreflightPassed);
        }

        if target.includes_images() {
            self.provision_images(stderr)?;
            self.advance(RunState::ImagesDone);
        }

        if target.includes_binaries() {
            self.install_binaries(stderr)?;
            self.advance(RunState::BinariesDone);
        }

        if target == ProvisioningTarget::Samples {
            self.fetch_samples(stderr)?;
            self.advance(RunState::SamplesDone);
        }

        Ok(())
    }

    fn provision_images(&self, stderr: &mut dyn Write) -> Result<()> {
        let machine = self.platform.machine();
        let batches = [
            (self.config.platform_image_specs(), &self.config.fabric_version),
            (self.config.thirdparty_image_specs(), &self.config.thirdparty_version),
        ];

        for (specs, version) in batches {
            let tag = image_tag(machine, version);
            self.progress(stderr, format!("Pulling {} images at {tag}...", specs.len()));
            let count = provision(self.collaborators.runtime, &specs, &tag)?;
            self.progress(stderr, images_message(count, &tag));
        }
        Ok(())
    }

    fn install_binaries(&self, stderr: &mut dyn Write) -> Result<()> {
        let url = binaries_url(self.config, self.platform);
        let install_dir = &self.config.install_dir;
        self.progress(stderr, format!("Downloading {url}..."));

        let summary = install(self.collaborators.fetcher, &url, install_dir)?;

        self.progress(stderr, binaries_message(&summary, install_dir));
        self.progress(stderr, "");
        self.progress(
            stderr,
            ShellSnippet::new(&install_dir.join("bin")).display_text(),
        );
        Ok(())
    }

    fn fetch_samples(&self, stderr: &mut dyn Write) -> Result<()> {
        let dest = self.config.install_dir.join(SAMPLES_DIR_NAME);
        let outcome = fetch_samples(
            self.collaborators.executor,
            &self.config.samples_repo_url,
            &self.config.fabric_version,
            &dest,
        )?;
        self.progress(stderr, samples_message(&outcome));
        Ok(())
    }

    fn advance(&mut self, next: RunState) {
        debug!("state {} -> {next}", self.state);
        self.state = next;
    }

    fn progress(&self, stderr: &mut dyn Write, message: impl fmt::Display) {
        if !self.quiet {
            write_stderr_line(stderr, message);
        }
    }
}
