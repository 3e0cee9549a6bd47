//! Behaviour-driven tests for version gating and the environment preflight.
//!
//! The host is simulated with `RecordingRuntime`, so these scenarios never
//! run docker. Tests use the rstest-bdd v0.5.0 mutable world pattern.

use hlf_installer::config::ProvisionConfig;
use hlf_installer::preflight::{EnvironmentError, EnvironmentReport, check_environment};
use hlf_installer::semver::{
    ParseError, SemanticVersion, VersionRequirement, at_least, strip_suffix,
};
use hlf_installer::test_utils::{RecordingRuntime, RuntimeCall};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PreflightWorld {
    minimum: Option<VersionRequirement>,
    satisfied: Option<bool>,
    parse_error: Option<ParseError>,
    runtime: RecordingRuntime,
    outcome: Option<Result<EnvironmentReport, EnvironmentError>>,
}

#[fixture]
fn world() -> PreflightWorld {
    PreflightWorld::default()
}

fn failure_kind(err: &EnvironmentError) -> &'static str {
    match err {
        EnvironmentError::RuntimeNotInstalled { .. } => "docker is not installed",
        EnvironmentError::DaemonUnreachable => "the daemon is unreachable",
        EnvironmentError::VersionTooLow { .. } => "docker is too old",
        EnvironmentError::ComposeNotInstalled { .. } => "docker-compose is not installed",
        EnvironmentError::ComposeVersionTooLow { .. } => "docker-compose is too old",
        EnvironmentError::RuntimeQuery { .. } => "a version query failed",
        EnvironmentError::InvalidVersion { .. } => "a version did not parse",
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a minimum version \"{label}\"")]
fn given_minimum(world: &mut PreflightWorld, label: String) {
    world.minimum = Some(VersionRequirement::parse(&label).expect("valid minimum"));
}

#[when("the reported version \"{raw}\" is compared")]
fn when_compared(world: &mut PreflightWorld, raw: String) {
    let minimum = world.minimum.as_ref().expect("minimum set").minimum();
    let actual = SemanticVersion::parse(strip_suffix(&raw)).expect("valid reported version");
    world.satisfied = Some(at_least(&minimum, &actual));
}

#[then("the requirement is satisfied")]
fn then_satisfied(world: &mut PreflightWorld) {
    assert_eq!(world.satisfied, Some(true));
}

#[then("the requirement is not satisfied")]
fn then_not_satisfied(world: &mut PreflightWorld) {
    assert_eq!(world.satisfied, Some(false));
}

#[when("the version string \"{raw}\" is parsed")]
fn when_parsed(world: &mut PreflightWorld, raw: String) {
    world.parse_error = SemanticVersion::parse(&raw).err();
}

#[then("parsing fails")]
fn then_parsing_fails(world: &mut PreflightWorld) {
    assert!(world.parse_error.is_some(), "expected a parse error");
}

#[given("a host with docker \"{server}\" and docker-compose \"{compose}\"")]
fn given_host(world: &mut PreflightWorld, server: String, compose: String) {
    world.runtime.server_version = server;
    world.runtime.compose_version = Some(compose);
}

#[given("the docker daemon is not running")]
fn given_daemon_down(world: &mut PreflightWorld) {
    world.runtime.daemon = false;
}

#[given("docker is not installed")]
fn given_docker_missing(world: &mut PreflightWorld) {
    world.runtime.installed = false;
}

#[given("docker-compose is not installed")]
fn given_compose_missing(world: &mut PreflightWorld) {
    world.runtime.compose_version = None;
}

#[when("the environment is checked")]
fn when_checked(world: &mut PreflightWorld) {
    let config = ProvisionConfig::with_install_dir("/tmp/hlf".into());
    world.outcome = Some(check_environment(&world.runtime, &config));
}

#[then("the environment passes")]
fn then_passes(world: &mut PreflightWorld) {
    let outcome = world.outcome.as_ref().expect("environment checked");
    assert!(outcome.is_ok(), "expected success, got {outcome:?}");
}

#[then("the check fails because \"{reason}\"")]
fn then_fails_because(world: &mut PreflightWorld, reason: String) {
    match world.outcome.as_ref().expect("environment checked") {
        Err(err) => assert_eq!(failure_kind(err), reason, "error: {err}"),
        Ok(report) => panic!("expected failure, got {report:?}"),
    }
}

#[then("no version was queried")]
fn then_no_version_query(world: &mut PreflightWorld) {
    let calls = world.runtime.calls();
    assert!(!calls.contains(&RuntimeCall::ServerVersion), "calls: {calls:?}");
    assert!(!calls.contains(&RuntimeCall::ComposeVersion), "calls: {calls:?}");
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/preflight.feature",
    name = "Versions with a vendor suffix compare numerically"
)]
fn scenario_suffix_versions(world: PreflightWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preflight.feature",
    name = "Zero-filled versions compare equal"
)]
fn scenario_zero_filled(world: PreflightWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preflight.feature",
    name = "An older release is rejected"
)]
fn scenario_older_release(world: PreflightWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preflight.feature",
    name = "A version with four components does not parse"
)]
fn scenario_four_components(world: PreflightWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/preflight.feature", name = "A healthy host passes")]
fn scenario_healthy_host(world: PreflightWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preflight.feature",
    name = "A stopped daemon is reported before any version query"
)]
fn scenario_daemon_down(world: PreflightWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preflight.feature",
    name = "A missing docker binary is reported"
)]
fn scenario_docker_missing(world: PreflightWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preflight.feature",
    name = "An old docker engine is reported"
)]
fn scenario_old_docker(world: PreflightWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preflight.feature",
    name = "A missing docker-compose is reported"
)]
fn scenario_compose_missing(world: PreflightWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/preflight.feature",
    name = "An old docker-compose is reported"
)]
fn scenario_old_compose(world: PreflightWorld) {
    let _ = world;
}
