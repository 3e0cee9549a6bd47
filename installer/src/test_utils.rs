//! Shared test utilities for the installer crate.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! integration tests under `tests/`.

use crate::archive::download::{ArchiveFetcher, DownloadError};
use crate::exec::CommandExecutor;
use crate::runtime::{ContainerRuntime, DOCKER, RuntimeError};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Cursor, Read};
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    stdout_output("")
}

/// Creates a successful command `Output` with the given stdout.
#[must_use]
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "docker").
    pub cmd: String,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: io::Result<Output>,
}

impl ExpectedCall {
    /// Creates an expectation for `cmd args...` answered with `result`.
    #[must_use]
    pub fn new(cmd: &str, args: &[&str], result: io::Result<Output>) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|&arg| arg.to_owned()).collect(),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        let mut expected = self.expected.borrow_mut();
        let call = expected.pop_front().expect("unexpected command invocation");

        assert_eq!(call.cmd, cmd);
        assert_eq!(call.args, args);

        call.result
    }
}

/// A container runtime operation observed by [`RecordingRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    /// `check_installed`.
    CheckInstalled,
    /// `daemon_reachable`.
    DaemonReachable,
    /// `server_version`.
    ServerVersion,
    /// `compose_version`.
    ComposeVersion,
    /// `pull_image(reference)`.
    Pull(String),
    /// `tag_image(source, target)`.
    Tag(String, String),
}

impl RuntimeCall {
    /// Shorthand for [`RuntimeCall::Pull`].
    #[must_use]
    pub fn pull(reference: &str) -> Self {
        Self::Pull(reference.to_owned())
    }

    /// Shorthand for [`RuntimeCall::Tag`].
    #[must_use]
    pub fn tag(source: &str, target: &str) -> Self {
        Self::Tag(source.to_owned(), target.to_owned())
    }
}

/// An in-memory container runtime that records every call.
///
/// The default instance is a healthy host: Docker `18.03.1-ce` with a
/// running daemon and docker-compose `1.21.0`.
#[derive(Debug)]
pub struct RecordingRuntime {
    /// Answer for `check_installed`.
    pub installed: bool,
    /// Answer for `daemon_reachable`.
    pub daemon: bool,
    /// Raw string returned by `server_version`.
    pub server_version: String,
    /// Raw string returned by `compose_version`; `None` means not installed.
    pub compose_version: Option<String>,
    /// Pull reference that fails.
    pub fail_pull: Option<String>,
    /// Tag alias that fails.
    pub fail_tag: Option<String>,
    /// Calls received so far, in order.
    pub recorded: RefCell<Vec<RuntimeCall>>,
}

impl Default for RecordingRuntime {
    fn default() -> Self {
        Self {
            installed: true,
            daemon: true,
            server_version: "18.03.1-ce".to_owned(),
            compose_version: Some("1.21.0".to_owned()),
            fail_pull: None,
            fail_tag: None,
            recorded: RefCell::new(Vec::new()),
        }
    }
}

impl RecordingRuntime {
    /// All calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.recorded.borrow().clone()
    }

    /// Number of image pulls attempted.
    #[must_use]
    pub fn pull_count(&self) -> usize {
        self.count(|call| matches!(call, RuntimeCall::Pull(_)))
    }

    /// Number of image tags attempted.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.count(|call| matches!(call, RuntimeCall::Tag(..)))
    }

    fn count(&self, predicate: impl Fn(&RuntimeCall) -> bool) -> usize {
        self.recorded.borrow().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: RuntimeCall) {
        self.recorded.borrow_mut().push(call);
    }
}

fn injected_failure(command: String) -> RuntimeError {
    RuntimeError::CommandFailed {
        command,
        status: "exit status: 1".to_owned(),
        stderr: "injected failure".to_owned(),
    }
}

impl ContainerRuntime for RecordingRuntime {
    fn check_installed(&self) -> bool {
        self.record(RuntimeCall::CheckInstalled);
        self.installed
    }

    fn daemon_reachable(&self) -> bool {
        self.record(RuntimeCall::DaemonReachable);
        self.daemon
    }

    fn server_version(&self) -> Result<String, RuntimeError> {
        self.record(RuntimeCall::ServerVersion);
        Ok(self.server_version.clone())
    }

    fn pull_image(&self, reference: &str) -> Result<(), RuntimeError> {
        self.record(RuntimeCall::pull(reference));
        if self.fail_pull.as_deref() == Some(reference) {
            return Err(injected_failure(format!("{DOCKER} pull {reference}")));
        }
        Ok(())
    }

    fn tag_image(&self, source: &str, target: &str) -> Result<(), RuntimeError> {
        self.record(RuntimeCall::tag(source, target));
        if self.fail_tag.as_deref() == Some(target) {
            return Err(injected_failure(format!("{DOCKER} tag {source} {target}")));
        }
        Ok(())
    }

    fn compose_version(&self) -> Result<String, RuntimeError> {
        self.record(RuntimeCall::ComposeVersion);
        self.compose_version
            .clone()
            .ok_or_else(|| RuntimeError::NotFound {
                program: crate::runtime::DOCKER_COMPOSE.to_owned(),
            })
    }
}

/// An archive fetcher serving a fixed body, or a 404 when it has none.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    body: Option<Vec<u8>>,
    requested: RefCell<Vec<String>>,
}

impl StaticFetcher {
    /// Serve `body` for every request.
    #[must_use]
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body: Some(body),
            requested: RefCell::new(Vec::new()),
        }
    }

    /// Answer every request with [`DownloadError::NotFound`].
    #[must_use]
    pub fn not_found() -> Self {
        Self::default()
    }

    /// URLs requested so far.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl ArchiveFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Box<dyn Read>, DownloadError> {
        self.requested.borrow_mut().push(url.to_owned());
        match &self.body {
            Some(body) => Ok(Box::new(Cursor::new(body.clone()))),
            None => Err(DownloadError::NotFound {
                url: url.to_owned(),
            }),
        }
    }
}

/// Builds `.tar.gz` fixtures in memory.
pub struct TarGzBuilder {
    builder: tar::Builder<GzEncoder<Vec<u8>>>,
}

impl Default for TarGzBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TarGzBuilder {
    /// Start an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default())),
        }
    }

    /// Append a directory entry.
    ///
    /// # Panics
    ///
    /// Panics if the entry cannot be appended.
    #[must_use]
    pub fn directory(self, path: &str) -> Self {
        self.append(path, tar::EntryType::Directory, 0o755, &[], None)
    }

    /// Append a regular file entry with the given permission bits.
    ///
    /// # Panics
    ///
    /// Panics if the entry cannot be appended.
    #[must_use]
    pub fn file(self, path: &str, contents: &[u8], mode: u32) -> Self {
        self.append(path, tar::EntryType::Regular, mode, contents, None)
    }

    /// Append a symbolic link entry.
    ///
    /// # Panics
    ///
    /// Panics if the entry cannot be appended.
    #[must_use]
    pub fn symlink(self, path: &str, target: &str) -> Self {
        self.append(path, tar::EntryType::Symlink, 0o777, &[], Some(target))
    }

    /// Finish the archive and return the compressed bytes.
    ///
    /// # Panics
    ///
    /// Panics if the archive cannot be finalised.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.builder
            .into_inner()
            .expect("finish tar stream")
            .finish()
            .expect("finish gzip stream")
    }

    fn append(
        mut self,
        path: &str,
        entry_type: tar::EntryType,
        mode: u32,
        contents: &[u8],
        link: Option<&str>,
    ) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(entry_type);
        header.set_mode(mode);
        header.set_size(contents.len() as u64);
        header.set_mtime(0);
        if let Some(link) = link {
            header.set_link_name(link).expect("set link name");
        }
        self.builder
            .append_data(&mut header, path, contents)
            .expect("append tar entry");
        self
    }
}
