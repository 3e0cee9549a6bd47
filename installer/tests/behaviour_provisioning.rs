//! Behaviour-driven tests for provisioning runs and archive installation.
//!
//! Scenarios drive the `Orchestrator` against an in-memory runtime and
//! archive source, writing only into a temporary installation directory.

use camino::Utf8PathBuf;
use hlf_installer::archive::extraction::ExtractionSummary;
use hlf_installer::archive::{InstallError, install};
use hlf_installer::config::ProvisionConfig;
use hlf_installer::error::OrchestrationError;
use hlf_installer::orchestrator::{Collaborators, Orchestrator, RunState};
use hlf_installer::platform::Platform;
use hlf_installer::test_utils::{
    RecordingRuntime, RuntimeCall, StaticFetcher, StubExecutor, TarGzBuilder,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

const ARCHIVE_URL: &str = "https://example.test/hyperledger-fabric.tar.gz";

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

struct ProvisioningWorld {
    // Keep the temp dir alive for the lifetime of the scenario.
    _temp: TempDir,
    config: ProvisionConfig,
    platform: Platform,
    runtime: RecordingRuntime,
    fetcher: StaticFetcher,
    executor: StubExecutor,
    run_result: Option<Result<RunState, OrchestrationError>>,
    install_result: Option<Result<ExtractionSummary, InstallError>>,
}

impl ProvisioningWorld {
    fn run(&mut self, scope: Option<&str>) {
        let result = Orchestrator::new(
            &self.config,
            &self.platform,
            Collaborators {
                runtime: &self.runtime,
                fetcher: &self.fetcher,
                executor: &self.executor,
            },
            true,
        )
        .run_scope(scope, &mut std::io::sink());
        self.run_result = Some(result);
    }

    fn install(&mut self) {
        self.install_result = Some(install(&self.fetcher, ARCHIVE_URL, &self.config.install_dir));
    }

    fn installed(&self, relative: &str) -> Utf8PathBuf {
        self.config.install_dir.join(relative)
    }

    fn pulls(&self) -> Vec<String> {
        self.runtime
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                RuntimeCall::Pull(reference) => Some(reference),
                _ => None,
            })
            .collect()
    }
}

fn peer_archive() -> Vec<u8> {
    TarGzBuilder::new()
        .directory("bin/")
        .file("bin/peer", b"peer binary", 0o755)
        .directory("config/")
        .file("config/core.yaml", b"peer:\n  id: jdoe\n", 0o644)
        .finish()
}

#[fixture]
fn world() -> ProvisioningWorld {
    let temp = TempDir::new().expect("failed to create temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("UTF-8 temp path");
    ProvisioningWorld {
        _temp: temp,
        config: ProvisionConfig::with_install_dir(root.join(".hlf-cli")),
        platform: Platform::from_parts("linux", "x86_64", None).expect("supported platform"),
        runtime: RecordingRuntime::default(),
        fetcher: StaticFetcher::new(peer_archive()),
        executor: StubExecutor::new(Vec::new()),
        run_result: None,
        install_result: None,
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("pulling \"{reference}\" fails")]
fn given_pull_fails(world: &mut ProvisioningWorld, reference: String) {
    world.runtime.fail_pull = Some(reference);
}

#[given("the archive was installed once")]
fn given_installed_once(world: &mut ProvisioningWorld) {
    world.install();
    let first = world.install_result.take().expect("installed");
    assert!(first.is_ok(), "first install failed: {first:?}");
}

#[given("the installed file \"{path}\" was edited to \"{contents}\"")]
fn given_file_edited(world: &mut ProvisioningWorld, path: String, contents: String) {
    std::fs::write(world.installed(&path), contents).expect("edit installed file");
}

#[given("an archive containing a symbolic link")]
fn given_symlink_archive(world: &mut ProvisioningWorld) {
    world.fetcher = StaticFetcher::new(
        TarGzBuilder::new()
            .directory("bin/")
            .symlink("bin/fabric-peer", "peer")
            .finish(),
    );
}

#[when("provisioning runs with scope \"{scope}\"")]
fn when_run_with_scope(world: &mut ProvisioningWorld, scope: String) {
    world.run(Some(&scope));
}

#[when("provisioning runs without a scope")]
fn when_run_without_scope(world: &mut ProvisioningWorld) {
    world.run(None);
}

#[when("the archive is installed")]
fn when_installed(world: &mut ProvisioningWorld) {
    world.install();
}

#[then("the run completes")]
fn then_run_completes(world: &mut ProvisioningWorld) {
    match world.run_result.as_ref().expect("run attempted") {
        Ok(state) => assert_eq!(state, &RunState::Complete),
        Err(err) => panic!("expected success, got {err}"),
    }
}

#[then("the run fails with an unknown target")]
fn then_unknown_target(world: &mut ProvisioningWorld) {
    let result = world.run_result.as_ref().expect("run attempted");
    assert!(
        matches!(result, Err(OrchestrationError::UnknownTarget { .. })),
        "got {result:?}"
    );
}

#[then("the run fails naming image \"{image}\"")]
fn then_fails_naming_image(world: &mut ProvisioningWorld, image: String) {
    match world.run_result.as_ref().expect("run attempted") {
        Err(OrchestrationError::Provision(err)) => assert_eq!(err.image(), image),
        other => panic!("expected a provisioning error, got {other:?}"),
    }
}

#[then("the container runtime was not called")]
fn then_runtime_untouched(world: &mut ProvisioningWorld) {
    assert!(world.runtime.calls().is_empty());
}

#[then("no archive was downloaded")]
fn then_no_download(world: &mut ProvisioningWorld) {
    assert!(world.fetcher.requested().is_empty());
}

#[then("{count} images were pulled and tagged")]
fn then_images_pulled(world: &mut ProvisioningWorld, count: usize) {
    assert_eq!(world.runtime.pull_count(), count);
    assert_eq!(world.runtime.tag_count(), count);
}

#[then("{count} pulls were attempted")]
fn then_pulls_attempted(world: &mut ProvisioningWorld, count: usize) {
    assert_eq!(world.runtime.pull_count(), count);
}

#[then("the first pull is \"{reference}\"")]
fn then_first_pull(world: &mut ProvisioningWorld, reference: String) {
    assert_eq!(world.pulls().first(), Some(&reference));
}

#[then("the last pull is \"{reference}\"")]
fn then_last_pull(world: &mut ProvisioningWorld, reference: String) {
    assert_eq!(world.pulls().last(), Some(&reference));
}

#[then("the archive was downloaded from a URL ending in \"{suffix}\"")]
fn then_download_url(world: &mut ProvisioningWorld, suffix: String) {
    let requested = world.fetcher.requested();
    assert_eq!(requested.len(), 1, "requested: {requested:?}");
    assert!(
        requested.iter().all(|url| url.ends_with(&suffix)),
        "requested: {requested:?}"
    );
}

#[then("the installed file \"{path}\" contains \"{contents}\"")]
fn then_file_contains(world: &mut ProvisioningWorld, path: String, contents: String) {
    let actual = std::fs::read_to_string(world.installed(&path)).expect("read installed file");
    assert_eq!(actual, contents);
}

#[then("every entry was skipped")]
fn then_all_skipped(world: &mut ProvisioningWorld) {
    let summary = match world.install_result.as_ref().expect("installed") {
        Ok(summary) => *summary,
        Err(err) => panic!("expected success, got {err}"),
    };
    assert_eq!(
        summary,
        ExtractionSummary {
            directories: 0,
            files: 0,
            skipped: 4,
        }
    );
}

#[then("installation fails with an unsupported entry")]
fn then_unsupported_entry(world: &mut ProvisioningWorld) {
    let result = world.install_result.as_ref().expect("installed");
    assert!(
        matches!(result, Err(InstallError::UnsupportedEntryType { .. })),
        "got {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "An unknown scope is rejected without touching docker"
)]
fn scenario_unknown_scope(world: ProvisioningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "The images scope pulls platform and third-party images"
)]
fn scenario_images_scope(world: ProvisioningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "A run without a scope provisions images and binaries"
)]
fn scenario_all_scope(world: ProvisioningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "A failed pull stops the remaining images and the binaries"
)]
fn scenario_failed_pull(world: ProvisioningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "The binaries scope installs the platform archive"
)]
fn scenario_binaries_scope(world: ProvisioningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Installing the archive twice leaves existing files alone"
)]
fn scenario_idempotent_install(world: ProvisioningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Archives with symbolic links are refused"
)]
fn scenario_symlink_refused(world: ProvisioningWorld) {
    let _ = world;
}
