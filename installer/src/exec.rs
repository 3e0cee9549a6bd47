//! External command execution.
//!
//! Every subprocess the installer spawns (`docker`, `docker-compose`,
//! `uname`, `git`) goes through [`CommandExecutor`] so that callers can be
//! exercised against a stub instead of the host system.

use std::io::{self, Read};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the
    /// command. A program missing from `PATH` surfaces as
    /// [`io::ErrorKind::NotFound`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use hlf_installer::exec::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("docker", &["--version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), std::io::Error>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output>;

    /// Runs a command, giving up once `timeout` has elapsed.
    ///
    /// The default implementation ignores the timeout and delegates to
    /// [`CommandExecutor::run`].
    ///
    /// # Errors
    ///
    /// As for [`CommandExecutor::run`]; implementations that honour the
    /// timeout return [`io::ErrorKind::TimedOut`] when it expires.
    fn run_with_timeout(&self, cmd: &str, args: &[&str], timeout: Duration) -> io::Result<Output> {
        let _ = timeout;
        self.run(cmd, args)
    }
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        log::debug!("running {}", display_command(cmd, args));
        Command::new(cmd).args(args).output()
    }

    fn run_with_timeout(&self, cmd: &str, args: &[&str], timeout: Duration) -> io::Result<Output> {
        log::debug!(
            "running {} (timeout {}s)",
            display_command(cmd, args),
            timeout.as_secs()
        );
        let mut child = Command::new(cmd)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes while waiting so a chatty child cannot block on a
        // full pipe buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let Some(status) = child.wait_timeout(timeout)? else {
            // Best effort: the child may already have exited.
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("operation timed out after {} seconds", timeout.as_secs()),
            ));
        };

        Ok(Output {
            status,
            stdout: collect(stdout)?,
            stderr: collect(stderr)?,
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buffer)?;
        }
        Ok(buffer)
    })
}

fn collect(reader: JoinHandle<io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    reader
        .join()
        .map_err(|_| io::Error::other("output reader thread panicked"))?
}

/// Render a command line for log and error messages.
///
/// # Examples
///
/// ```
/// use hlf_installer::exec::display_command;
///
/// assert_eq!(display_command("docker", &["pull", "x:1"]), "docker pull x:1");
/// ```
#[must_use]
pub fn display_command(cmd: &str, args: &[&str]) -> String {
    std::iter::once(cmd)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns true if the given command executes successfully.
pub fn command_succeeds(executor: &dyn CommandExecutor, cmd: &str, args: &[&str]) -> bool {
    executor.run(cmd, args).is_ok_and(|o| o.status.success())
}
