//! Directory resolution and creation.
//!
//! Platform binaries and samples are unpacked into a single per-user
//! installation directory, `~/.hlf-cli` by default. Home directory lookup
//! goes through [`BaseDirs`] so tests can point it elsewhere.

use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use std::path::PathBuf;

/// Name of the installation directory under the user's home directory.
pub const INSTALL_DIR_NAME: &str = ".hlf-cli";

/// Permission bits for directories created by the installer.
pub const DIR_MODE: u32 = 0o755;

/// Abstraction over platform base directories.
pub trait BaseDirs {
    /// The current user's home directory, if it can be determined.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by `directories-next`.
///
/// # Examples
///
/// ```no_run
/// use hlf_installer::dirs::{BaseDirs, SystemBaseDirs};
///
/// let dirs = SystemBaseDirs::new().expect("failed to initialise directories");
/// assert!(dirs.home_dir().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct SystemBaseDirs {
    dirs: directories_next::BaseDirs,
}

impl SystemBaseDirs {
    /// Resolve base directories for the current user.
    ///
    /// Returns `None` when no home directory can be found.
    #[must_use]
    pub fn new() -> Option<Self> {
        directories_next::BaseDirs::new().map(|dirs| Self { dirs })
    }
}

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        Some(self.dirs.home_dir().to_path_buf())
    }
}

impl<T: BaseDirs> BaseDirs for Option<T> {
    fn home_dir(&self) -> Option<PathBuf> {
        self.as_ref().and_then(BaseDirs::home_dir)
    }
}

/// Returns `~/.hlf-cli` for the given base directories.
///
/// Returns `None` if the home directory is unknown or not valid UTF-8.
#[must_use]
pub fn default_install_dir(dirs: &dyn BaseDirs) -> Option<Utf8PathBuf> {
    dirs.home_dir()
        .and_then(|home| Utf8PathBuf::try_from(home).ok())
        .map(|home| home.join(INSTALL_DIR_NAME))
}

/// Create `path` and any missing parents with [`DIR_MODE`] permissions.
///
/// An existing directory is not an error.
///
/// # Errors
///
/// Returns an I/O error if creation fails or `path` exists as something
/// other than a directory.
pub fn ensure_dir(path: &Utf8Path) -> io::Result<()> {
    ensure_std_dir(path.as_std_path())
}

pub(crate) fn ensure_std_dir(path: &std::path::Path) -> io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(path)
}
