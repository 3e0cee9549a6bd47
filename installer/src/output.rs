//! Output formatting for the hlf CLI.
//!
//! Progress and summary lines are written to stderr so that stdout stays
//! free for the one machine-readable result (`hlf check`). After the
//! binaries are installed, a shell snippet shows how to put them on `PATH`.

use crate::archive::extraction::ExtractionSummary;
use crate::config::ProvisionConfig;
use crate::preflight::EnvironmentReport;
use crate::samples::SamplesOutcome;
use camino::Utf8Path;
use std::fmt::Display;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Shell configuration snippets for different shells.
#[derive(Debug, Clone)]
pub struct ShellSnippet {
    /// Export line for bash/zsh.
    pub bash: String,
    /// Line for fish shell.
    pub fish: String,
    /// Line for PowerShell.
    pub powershell: String,
}

impl ShellSnippet {
    /// Create snippets that prepend `bin_dir` to `PATH`.
    ///
    /// # Example
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use hlf_installer::output::ShellSnippet;
    ///
    /// let snippet = ShellSnippet::new(&Utf8PathBuf::from("/home/user/.hlf-cli/bin"));
    /// assert_eq!(snippet.bash, "export PATH=\"/home/user/.hlf-cli/bin:$PATH\"");
    /// ```
    #[must_use]
    pub fn new(bin_dir: &Utf8Path) -> Self {
        Self {
            bash: format!("export PATH=\"{bin_dir}:$PATH\""),
            fish: format!("fish_add_path \"{bin_dir}\""),
            powershell: format!("$env:PATH = \"{bin_dir};\" + $env:PATH"),
        }
    }

    /// Format the snippet for display to the user.
    #[must_use]
    pub fn display_text(&self) -> String {
        format!(
            concat!(
                "Add the Fabric tools to your PATH:\n\n",
                "  # bash/zsh (~/.bashrc, ~/.zshrc)\n",
                "  {}\n\n",
                "  # fish (~/.config/fish/config.fish)\n",
                "  {}\n\n",
                "  # PowerShell ($PROFILE)\n",
                "  {}"
            ),
            self.bash, self.fish, self.powershell
        )
    }
}

/// Summary line after an image batch.
#[must_use]
pub fn images_message(count: usize, tag: &str) -> String {
    let plural = if count == 1 { "image" } else { "images" };
    format!("Pulled and tagged {count} {plural} at {tag}")
}

/// Summary line after the binaries archive is unpacked.
#[must_use]
pub fn binaries_message(summary: &ExtractionSummary, install_dir: &Utf8Path) -> String {
    if summary.files == 0 && summary.directories == 0 {
        return format!("Binaries already installed in {install_dir}");
    }
    format!(
        "Installed {} files to {install_dir} ({} already present)",
        summary.files, summary.skipped
    )
}

/// Summary line after the samples step.
#[must_use]
pub fn samples_message(outcome: &SamplesOutcome) -> String {
    match outcome {
        SamplesOutcome::Cloned(path) => format!("Cloned Fabric samples to {path}"),
        SamplesOutcome::AlreadyPresent(path) => {
            format!("Fabric samples already present at {path}")
        }
    }
}

/// Report printed by `hlf check`.
#[must_use]
pub fn check_report(report: &EnvironmentReport, config: &ProvisionConfig) -> String {
    format!(
        "docker {} (requires {})\ndocker-compose {} (requires {})",
        report.runtime_version,
        config.minimum_runtime,
        report.compose_version,
        config.minimum_compose,
    )
}
