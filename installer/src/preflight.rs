//! Environment checks run before any provisioning step.
//!
//! The checks run in a fixed order and stop at the first failure:
//!
//! 1. the `docker` binary is installed,
//! 2. the Docker daemon is reachable,
//! 3. the daemon's server version meets the configured minimum,
//! 4. `docker-compose` is installed and meets its configured minimum.

use crate::config::ProvisionConfig;
use crate::runtime::{ContainerRuntime, DOCKER, DOCKER_COMPOSE, RuntimeError};
use crate::semver::{ParseError, SemanticVersion, VersionRequirement, strip_suffix};
use log::{debug, info};
use thiserror::Error;

/// Versions detected by a successful preflight run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentReport {
    /// Docker server version.
    pub runtime_version: SemanticVersion,
    /// docker-compose version.
    pub compose_version: SemanticVersion,
}

/// Reasons the host environment cannot run Fabric.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    /// The `docker` binary is missing or not executable.
    #[error("docker is not installed; install Docker {required} or later")]
    RuntimeNotInstalled {
        /// Minimum Docker version label.
        required: String,
    },

    /// The Docker daemon did not answer.
    #[error("cannot connect to the Docker daemon; is the docker daemon running?")]
    DaemonUnreachable,

    /// The Docker server is older than required.
    #[error("docker version {required} or higher is required (found {actual})")]
    VersionTooLow {
        /// Minimum Docker version label.
        required: String,
        /// Detected Docker version.
        actual: String,
    },

    /// `docker-compose` is missing.
    #[error("docker-compose is not installed; install docker-compose {required} or later")]
    ComposeNotInstalled {
        /// Minimum docker-compose version label.
        required: String,
    },

    /// `docker-compose` is older than required.
    #[error("docker-compose version {required} or higher is required (found {actual})")]
    ComposeVersionTooLow {
        /// Minimum docker-compose version label.
        required: String,
        /// Detected docker-compose version.
        actual: String,
    },

    /// A version query could not be completed.
    #[error("error checking {tool} version: {source}")]
    RuntimeQuery {
        /// Tool that was queried.
        tool: &'static str,
        /// The runtime failure.
        #[source]
        source: RuntimeError,
    },

    /// A tool reported a version string that does not parse.
    #[error("error checking {tool} version: {source}")]
    InvalidVersion {
        /// Tool that reported the version.
        tool: &'static str,
        /// The parse failure.
        #[source]
        source: ParseError,
    },
}

/// Verify that Docker and docker-compose are usable and recent enough.
///
/// # Errors
///
/// Returns the [`EnvironmentError`] for the first check that fails; later
/// checks are not attempted.
pub fn check_environment(
    runtime: &dyn ContainerRuntime,
    config: &ProvisionConfig,
) -> Result<EnvironmentReport, EnvironmentError> {
    debug!("checking that {DOCKER} is installed");
    if !runtime.check_installed() {
        return Err(EnvironmentError::RuntimeNotInstalled {
            required: config.minimum_runtime.label().to_owned(),
        });
    }

    debug!("checking that the Docker daemon is reachable");
    if !runtime.daemon_reachable() {
        return Err(EnvironmentError::DaemonUnreachable);
    }

    let runtime_version = check_runtime_version(runtime, &config.minimum_runtime)?;
    let compose_version = check_compose_version(runtime, &config.minimum_compose)?;

    info!("docker {runtime_version} and docker-compose {compose_version} satisfy requirements");
    Ok(EnvironmentReport {
        runtime_version,
        compose_version,
    })
}

fn check_runtime_version(
    runtime: &dyn ContainerRuntime,
    minimum: &VersionRequirement,
) -> Result<SemanticVersion, EnvironmentError> {
    let raw = runtime
        .server_version()
        .map_err(|source| EnvironmentError::RuntimeQuery {
            tool: DOCKER,
            source,
        })?;
    let version = parse_reported(DOCKER, &raw)?;
    debug!("docker server version {raw} parsed as {version}");

    if !minimum.is_satisfied_by(&version) {
        return Err(EnvironmentError::VersionTooLow {
            required: minimum.label().to_owned(),
            actual: raw.trim().to_owned(),
        });
    }
    Ok(version)
}

fn check_compose_version(
    runtime: &dyn ContainerRuntime,
    minimum: &VersionRequirement,
) -> Result<SemanticVersion, EnvironmentError> {
    let raw = runtime.compose_version().map_err(|source| match source {
        RuntimeError::NotFound { .. } => EnvironmentError::ComposeNotInstalled {
            required: minimum.label().to_owned(),
        },
        other => EnvironmentError::RuntimeQuery {
            tool: DOCKER_COMPOSE,
            source: other,
        },
    })?;
    let version = parse_reported(DOCKER_COMPOSE, &raw)?;
    debug!("docker-compose version {raw} parsed as {version}");

    if !minimum.is_satisfied_by(&version) {
        return Err(EnvironmentError::ComposeVersionTooLow {
            required: minimum.label().to_owned(),
            actual: raw.trim().to_owned(),
        });
    }
    Ok(version)
}

fn parse_reported(tool: &'static str, raw: &str) -> Result<SemanticVersion, EnvironmentError> {
    SemanticVersion::parse(strip_suffix(raw))
        .map_err(|source| EnvironmentError::InvalidVersion { tool, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockContainerRuntime;
    use rstest::{fixture, rstest};

    #[fixture]
    fn config() -> ProvisionConfig {
        ProvisionConfig::with_install_dir("/tmp/hlf".into())
    }

    fn healthy_runtime(server: &'static str, compose: &'static str) -> MockContainerRuntime {
        let mut runtime = MockContainerRuntime::new();
        runtime.expect_check_installed().return_const(true);
        runtime.expect_daemon_reachable().return_const(true);
        runtime
            .expect_server_version()
            .returning(move || Ok(server.to_owned()));
        runtime
            .expect_compose_version()
            .returning(move || Ok(compose.to_owned()));
        runtime
    }

    #[rstest]
    fn passes_when_versions_meet_minimums(config: ProvisionConfig) {
        let runtime = healthy_runtime("17.12.0-ce\n", "1.18.0");
        let report = check_environment(&runtime, &config).expect("environment is healthy");
        assert_eq!(report.runtime_version, SemanticVersion::new(17, 12, 0));
        assert_eq!(report.compose_version, SemanticVersion::new(1, 18, 0));
    }

    #[rstest]
    fn exact_minimum_versions_pass(config: ProvisionConfig) {
        let runtime = healthy_runtime("17.06.2-ce", "1.14.0");
        assert!(check_environment(&runtime, &config).is_ok());
    }

    #[rstest]
    fn missing_docker_stops_before_daemon_check(config: ProvisionConfig) {
        let mut runtime = MockContainerRuntime::new();
        runtime.expect_check_installed().times(1).return_const(false);
        runtime.expect_daemon_reachable().never();
        runtime.expect_server_version().never();
        runtime.expect_compose_version().never();

        let err = check_environment(&runtime, &config).expect_err("docker missing");
        assert!(matches!(err, EnvironmentError::RuntimeNotInstalled { .. }));
    }

    #[rstest]
    fn unreachable_daemon_stops_before_version_query(config: ProvisionConfig) {
        let mut runtime = MockContainerRuntime::new();
        runtime.expect_check_installed().return_const(true);
        runtime.expect_daemon_reachable().times(1).return_const(false);
        runtime.expect_server_version().never();
        runtime.expect_compose_version().never();

        let err = check_environment(&runtime, &config).expect_err("daemon down");
        assert!(matches!(err, EnvironmentError::DaemonUnreachable));
    }

    #[rstest]
    fn old_docker_reports_required_and_actual(config: ProvisionConfig) {
        let mut runtime = MockContainerRuntime::new();
        runtime.expect_check_installed().return_const(true);
        runtime.expect_daemon_reachable().return_const(true);
        runtime
            .expect_server_version()
            .returning(|| Ok("17.03.1-ce".to_owned()));
        runtime.expect_compose_version().never();

        let err = check_environment(&runtime, &config).expect_err("docker too old");
        match err {
            EnvironmentError::VersionTooLow { required, actual } => {
                assert_eq!(required, "17.06.2-ce");
                assert_eq!(actual, "17.03.1-ce");
            }
            other => panic!("expected VersionTooLow, got {other:?}"),
        }
    }

    #[rstest]
    fn old_compose_is_rejected(config: ProvisionConfig) {
        let runtime = healthy_runtime("18.03.1-ce", "1.13.0");
        let err = check_environment(&runtime, &config).expect_err("compose too old");
        assert!(matches!(err, EnvironmentError::ComposeVersionTooLow { .. }));
    }

    #[rstest]
    fn missing_compose_is_reported_as_not_installed(config: ProvisionConfig) {
        let mut runtime = MockContainerRuntime::new();
        runtime.expect_check_installed().return_const(true);
        runtime.expect_daemon_reachable().return_const(true);
        runtime
            .expect_server_version()
            .returning(|| Ok("18.03.1-ce".to_owned()));
        runtime.expect_compose_version().returning(|| {
            Err(RuntimeError::NotFound {
                program: DOCKER_COMPOSE.to_owned(),
            })
        });

        let err = check_environment(&runtime, &config).expect_err("compose missing");
        assert!(matches!(err, EnvironmentError::ComposeNotInstalled { .. }));
    }

    #[rstest]
    fn query_failure_is_not_reported_as_missing(config: ProvisionConfig) {
        let mut runtime = MockContainerRuntime::new();
        runtime.expect_check_installed().return_const(true);
        runtime.expect_daemon_reachable().return_const(true);
        runtime.expect_server_version().returning(|| {
            Err(RuntimeError::CommandFailed {
                command: "docker version".to_owned(),
                status: "exit status: 1".to_owned(),
                stderr: "permission denied".to_owned(),
            })
        });

        let err = check_environment(&runtime, &config).expect_err("query fails");
        assert!(matches!(err, EnvironmentError::RuntimeQuery { tool: DOCKER, .. }));
    }

    #[rstest]
    fn garbage_version_is_a_parse_error(config: ProvisionConfig) {
        let runtime = healthy_runtime("dev", "1.14.0");
        let err = check_environment(&runtime, &config).expect_err("unparseable version");
        assert!(matches!(err, EnvironmentError::InvalidVersion { tool: DOCKER, .. }));
    }

    #[test]
    fn custom_floor_is_honoured() {
        let mut config = ProvisionConfig::with_install_dir("/tmp/hlf".into());
        config.minimum_runtime =
            VersionRequirement::parse("19.03.0").expect("valid requirement");
        let runtime = healthy_runtime("18.09.1", "1.24.0");
        let err = check_environment(&runtime, &config).expect_err("floor raised");
        assert!(matches!(err, EnvironmentError::VersionTooLow { .. }));
    }
}
