//! hlf CLI entrypoint.
//!
//! This binary provisions a local Hyperledger Fabric development environment:
//! it checks Docker and docker-compose, pulls and tags the Fabric images, and
//! installs the platform binaries. Errors are reported here and nowhere else.

use clap::Parser;
use hlf_installer::archive::download::HttpFetcher;
use hlf_installer::cli::{Cli, Command, GlobalArgs};
use hlf_installer::config::{ConfigFile, ProvisionConfig};
use hlf_installer::dirs::SystemBaseDirs;
use hlf_installer::error::Result;
use hlf_installer::exec::{CommandExecutor, SystemCommandExecutor};
use hlf_installer::orchestrator::{Collaborators, Orchestrator, ProvisioningTarget};
use hlf_installer::output::{check_report, write_stderr_line};
use hlf_installer::platform::Platform;
use hlf_installer::preflight::check_environment;
use hlf_installer::runtime::{ContainerRuntime, DockerCli};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Installs `env_logger` at the level chosen by `-v`/`-q`; `RUST_LOG`
/// still takes precedence.
fn init_logging(global: &GlobalArgs) {
    env_logger::Builder::new()
        .filter_level(global.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    // Reject a bad scope before touching the config, the host or the network.
    let target = match &cli.command {
        Command::Download(args) => Some(ProvisioningTarget::from_scope(args.scope.as_deref())?),
        Command::Check => None,
    };

    let config = load_config(&cli.global)?;
    let executor = SystemCommandExecutor;
    let runtime = DockerCli::new(&executor);

    match target {
        Some(target) => run_download(
            target,
            &config,
            &runtime,
            &executor,
            cli.global.quiet,
            stderr,
        ),
        None => run_check(&runtime, &config, stdout),
    }
}

/// Layers the optional config file and command-line flags over the defaults.
fn load_config(global: &GlobalArgs) -> Result<ProvisionConfig> {
    let file = match &global.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let config = ProvisionConfig::resolve(file, global.overrides(), &SystemBaseDirs::new())?;
    log::debug!("resolved configuration: {config:?}");
    Ok(config)
}

/// Runs the preflight checks and prints the detected versions to stdout.
fn run_check(
    runtime: &dyn ContainerRuntime,
    config: &ProvisionConfig,
    stdout: &mut dyn Write,
) -> Result<()> {
    let report = check_environment(runtime, config)?;
    if writeln!(stdout, "{}", check_report(&report, config)).is_err() {
        // Nothing useful to do if stdout is closed.
    }
    Ok(())
}

fn run_download(
    target: ProvisioningTarget,
    config: &ProvisionConfig,
    runtime: &dyn ContainerRuntime,
    executor: &dyn CommandExecutor,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<()> {
    let platform = Platform::detect(executor)?;
    let fetcher = HttpFetcher;
    let collaborators = Collaborators {
        runtime,
        fetcher: &fetcher,
        executor,
    };

    Orchestrator::new(config, &platform, collaborators, quiet).run(target, stderr)?;

    if !quiet {
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, format!("Done: {target}"));
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("Error: {err}"));
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                write_stderr_line(stderr, format!("  caused by: {cause}"));
                source = cause.source();
            }
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlf_installer::error::OrchestrationError;
    use hlf_installer::preflight::EnvironmentError;
    use hlf_installer::test_utils::RecordingRuntime;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = OrchestrationError::UnknownTarget {
            value: "peers".to_owned(),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.starts_with("Error: unknown target \"peers\""));
    }

    #[test]
    fn unknown_scope_is_rejected_before_loading_config() {
        let cli = Cli::parse_from([
            "hlf",
            "--config",
            "/nonexistent/hlf.toml",
            "download",
            "peers",
        ]);
        let err = run(&cli, &mut Vec::new(), &mut Vec::new()).expect_err("bad scope");
        assert!(matches!(err, OrchestrationError::UnknownTarget { .. }));
    }

    #[test]
    fn check_prints_versions_to_stdout() {
        let runtime = RecordingRuntime::default();
        let config = ProvisionConfig::with_install_dir("/tmp/hlf".into());
        let mut stdout = Vec::new();

        run_check(&runtime, &config, &mut stdout).expect("healthy host");

        let text = String::from_utf8(stdout).expect("stdout was not UTF-8");
        assert!(text.contains("docker 18.3.1"));
        assert!(text.contains("docker-compose 1.21.0"));
    }

    #[test]
    fn check_reports_missing_compose() {
        let runtime = RecordingRuntime {
            compose_version: None,
            ..RecordingRuntime::default()
        };
        let config = ProvisionConfig::with_install_dir("/tmp/hlf".into());

        let err = run_check(&runtime, &config, &mut Vec::new()).expect_err("compose missing");
        assert!(matches!(
            err,
            OrchestrationError::Environment(EnvironmentError::ComposeNotInstalled { .. })
        ));
    }
}
