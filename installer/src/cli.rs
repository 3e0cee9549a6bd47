//! CLI argument definitions for the hlf installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::config::Overrides;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

/// Provision a local Hyperledger Fabric development environment.
#[derive(Parser, Debug)]
#[command(name = "hlf")]
#[command(version, about)]
#[command(long_about = concat!(
    "Provision a local Hyperledger Fabric development environment.\n\n",
    "Checks that Docker and docker-compose are recent enough, pulls and tags ",
    "the Fabric container images, and installs the platform binaries into ",
    "~/.hlf-cli.",
))]
#[command(after_help = concat!(
    "SCOPES:\n",
    "  images     Pull and tag the Fabric and third-party images\n",
    "  binaries   Install the platform binaries into the install directory\n",
    "  samples    Clone fabric-samples into the install directory\n",
    "  all        images, then binaries (default)\n\n",
    "EXAMPLES:\n",
    "  Provision everything:\n",
    "    $ hlf download\n\n",
    "  Only pull images for Fabric 1.2.0:\n",
    "    $ hlf --fabric-version 1.2.0 download images\n\n",
    "  Check the host without changing anything:\n",
    "    $ hlf check",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Download images, binaries, or samples.
    Download(DownloadArgs),

    /// Check the Docker and docker-compose versions only.
    Check,
}

/// Arguments for the download command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadArgs {
    /// What to download: images, binaries, samples, or all.
    #[arg(value_name = "SCOPE")]
    pub scope: Option<String>,
}

/// Options accepted before or after the subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    /// TOML file overriding the built-in settings.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Installation directory [default: ~/.hlf-cli].
    #[arg(long, global = true, value_name = "DIR")]
    pub install_dir: Option<Utf8PathBuf>,

    /// Fabric release to install.
    #[arg(long, global = true, value_name = "VERSION")]
    pub fabric_version: Option<String>,

    /// Third-party image release to install.
    #[arg(long, global = true, value_name = "VERSION")]
    pub thirdparty_version: Option<String>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl GlobalArgs {
    /// Command-line values to layer over the configuration file.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            install_dir: self.install_dir.clone(),
            fabric_version: self.fabric_version.clone(),
            thirdparty_version: self.thirdparty_version.clone(),
        }
    }

    /// Log level implied by `-q` and `-v`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hlf_installer::cli::GlobalArgs;
    /// use log::LevelFilter;
    ///
    /// let args = GlobalArgs { verbosity: 2, ..GlobalArgs::default() };
    /// assert_eq!(args.log_level(), LevelFilter::Debug);
    /// ```
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
