//! Container runtime capability interface.
//!
//! The preflight checks and the image provisioner only need six operations
//! from the container engine. [`ContainerRuntime`] names them, and
//! [`DockerCli`] implements them by driving the `docker` and
//! `docker-compose` binaries through a [`CommandExecutor`].

use crate::exec::{CommandExecutor, command_succeeds, display_command};
use std::io;
use std::process::Output;
use thiserror::Error;

/// Name of the container engine binary.
pub const DOCKER: &str = "docker";

/// Name of the compose tool binary.
pub const DOCKER_COMPOSE: &str = "docker-compose";

/// Errors from querying or driving the container runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The program could not be found on `PATH`.
    #[error("{program} is not installed or not on PATH")]
    NotFound {
        /// The missing program.
        program: String,
    },

    /// The program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The program ran but exited unsuccessfully.
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        /// The full command line.
        command: String,
        /// The exit status description.
        status: String,
        /// Trimmed standard error output.
        stderr: String,
    },
}

/// Operations the installer needs from a container engine.
#[cfg_attr(test, mockall::automock)]
pub trait ContainerRuntime {
    /// Returns `true` if the runtime binary is present and executable.
    fn check_installed(&self) -> bool;

    /// Returns `true` if the runtime daemon answers a status query.
    fn daemon_reachable(&self) -> bool;

    /// Returns the raw server version string reported by the daemon.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] if the version query cannot be run or fails.
    fn server_version(&self) -> Result<String, RuntimeError>;

    /// Pulls a fully qualified `repository:tag` reference.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] if the pull cannot be run or fails.
    fn pull_image(&self, reference: &str) -> Result<(), RuntimeError>;

    /// Tags `source` as `target`, replacing any existing `target`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] if tagging cannot be run or fails.
    fn tag_image(&self, source: &str, target: &str) -> Result<(), RuntimeError>;

    /// Returns the raw short version string reported by the compose tool.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotFound`] if the compose tool is absent, or
    /// another [`RuntimeError`] if the query fails.
    fn compose_version(&self) -> Result<String, RuntimeError>;
}

/// [`ContainerRuntime`] backed by the Docker command-line tools.
///
/// # Examples
///
/// ```no_run
/// use hlf_installer::exec::SystemCommandExecutor;
/// use hlf_installer::runtime::{ContainerRuntime, DockerCli};
///
/// let executor = SystemCommandExecutor;
/// let docker = DockerCli::new(&executor);
/// if docker.check_installed() && docker.daemon_reachable() {
///     let version = docker.server_version()?;
///     assert!(!version.is_empty());
/// }
/// # Ok::<(), hlf_installer::runtime::RuntimeError>(())
/// ```
pub struct DockerCli<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> DockerCli<'a> {
    /// Create a runtime that issues commands through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    fn run_checked(&self, program: &str, args: &[&str]) -> Result<Output, RuntimeError> {
        let output = self
            .executor
            .run(program, args)
            .map_err(|source| spawn_error(program, source))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RuntimeError::CommandFailed {
                command: display_command(program, args),
                status: output.status.to_string(),
                stderr: stderr.trim().to_owned(),
            });
        }

        Ok(output)
    }

    fn stdout_of(&self, program: &str, args: &[&str]) -> Result<String, RuntimeError> {
        let output = self.run_checked(program, args)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}

impl ContainerRuntime for DockerCli<'_> {
    fn check_installed(&self) -> bool {
        command_succeeds(self.executor, DOCKER, &["--version"])
    }

    fn daemon_reachable(&self) -> bool {
        command_succeeds(self.executor, DOCKER, &["ps"])
    }

    fn server_version(&self) -> Result<String, RuntimeError> {
        self.stdout_of(DOCKER, &["version", "--format", "{{.Server.Version}}"])
    }

    fn pull_image(&self, reference: &str) -> Result<(), RuntimeError> {
        self.run_checked(DOCKER, &["pull", reference]).map(drop)
    }

    fn tag_image(&self, source: &str, target: &str) -> Result<(), RuntimeError> {
        self.run_checked(DOCKER, &["tag", source, target]).map(drop)
    }

    fn compose_version(&self) -> Result<String, RuntimeError> {
        self.stdout_of(DOCKER_COMPOSE, &["version", "--short"])
    }
}

fn spawn_error(program: &str, source: io::Error) -> RuntimeError {
    if source.kind() == io::ErrorKind::NotFound {
        RuntimeError::NotFound {
            program: program.to_owned(),
        }
    } else {
        RuntimeError::Spawn {
            program: program.to_owned(),
            source,
        }
    }
}
