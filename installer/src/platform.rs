//! Host platform naming.
//!
//! Fabric publishes binaries per `{os}-{arch}` using Go's naming (`linux`,
//! `darwin`, `amd64`) and tags images per machine hardware name as printed by
//! `uname -m` (`x86_64`, `s390x`). [`Platform`] carries all three.

use crate::exec::CommandExecutor;
use log::debug;
use thiserror::Error;

/// Errors from host platform detection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// Fabric does not publish artefacts for this host.
    #[error("unsupported platform {os}/{arch}")]
    Unsupported {
        /// Rust operating system name.
        os: String,
        /// Rust architecture name.
        arch: String,
    },
}

/// Host operating system and architecture in Fabric's naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    os: &'static str,
    arch: &'static str,
    machine: String,
}

impl Platform {
    /// Detect the host platform.
    ///
    /// The machine name is read from `uname -m`; when that is unavailable
    /// the Rust architecture name is used instead.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unsupported`] if the host OS or architecture
    /// has no Fabric equivalent.
    pub fn detect(executor: &dyn CommandExecutor) -> Result<Self, PlatformError> {
        Self::from_parts(
            std::env::consts::OS,
            std::env::consts::ARCH,
            machine_name(executor),
        )
    }

    /// Build a platform from Rust OS and architecture names.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unsupported`] for unknown names.
    ///
    /// # Examples
    ///
    /// ```
    /// use hlf_installer::platform::Platform;
    ///
    /// let platform = Platform::from_parts("macos", "x86_64", None)?;
    /// assert_eq!(platform.os(), "darwin");
    /// assert_eq!(platform.arch(), "amd64");
    /// assert_eq!(platform.machine(), "x86_64");
    /// # Ok::<(), hlf_installer::platform::PlatformError>(())
    /// ```
    pub fn from_parts(
        rust_os: &str,
        rust_arch: &str,
        machine: Option<String>,
    ) -> Result<Self, PlatformError> {
        let unsupported = || PlatformError::Unsupported {
            os: rust_os.to_owned(),
            arch: rust_arch.to_owned(),
        };
        let os = fabric_os(rust_os).ok_or_else(unsupported)?;
        let (arch, default_machine) = fabric_arch(rust_arch).ok_or_else(unsupported)?;
        let machine = machine.unwrap_or_else(|| default_machine.to_owned());
        Ok(Self { os, arch, machine })
    }

    /// Operating system, e.g. `linux`.
    #[must_use]
    pub fn os(&self) -> &str {
        self.os
    }

    /// Architecture, e.g. `amd64`.
    #[must_use]
    pub fn arch(&self) -> &str {
        self.arch
    }

    /// Machine hardware name, e.g. `x86_64`.
    #[must_use]
    pub fn machine(&self) -> &str {
        &self.machine
    }

    /// The `{os}-{arch}` pair used in binaries archive names.
    #[must_use]
    pub fn os_arch(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }
}

fn fabric_os(rust_os: &str) -> Option<&'static str> {
    match rust_os {
        "linux" => Some("linux"),
        "macos" => Some("darwin"),
        "windows" => Some("windows"),
        _ => None,
    }
}

/// Maps a Rust architecture to Fabric's arch name and the matching
/// `uname -m` value.
fn fabric_arch(rust_arch: &str) -> Option<(&'static str, &'static str)> {
    match rust_arch {
        "x86_64" => Some(("amd64", "x86_64")),
        "aarch64" => Some(("arm64", "aarch64")),
        "s390x" => Some(("s390x", "s390x")),
        "powerpc64" => Some(("ppc64le", "ppc64le")),
        _ => None,
    }
}

fn machine_name(executor: &dyn CommandExecutor) -> Option<String> {
    let output = executor.run("uname", &["-m"]).ok()?;
    if !output.status.success() {
        return None;
    }
    let name = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    debug!("uname -m reported {name:?}");
    (!name.is_empty()).then_some(name)
}
