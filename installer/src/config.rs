//! Provisioning configuration.
//!
//! [`ProvisionConfig`] is built once per invocation and passed by reference
//! to every component. Values come from three layers, later layers winning:
//! the built-in defaults, an optional TOML file, and command-line overrides.

use crate::dirs::{BaseDirs, default_install_dir};
use crate::images::ImageSpec;
use crate::semver::{ParseError, SemanticVersion, VersionRequirement};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

/// Minimum Docker engine version required by Fabric.
pub const MINIMUM_DOCKER_VERSION: &str = "17.06.2-ce";

/// Minimum docker-compose version required by Fabric.
pub const MINIMUM_COMPOSE_VERSION: &str = "1.14.0";

/// Fabric release whose images and binaries are installed.
pub const FABRIC_VERSION: &str = "1.1.0";

/// Release of the third-party images (CouchDB, Kafka, ZooKeeper).
pub const THIRDPARTY_VERSION: &str = "0.4.6";

/// Docker Hub organisation hosting the images.
pub const REGISTRY_PREFIX: &str = "hyperledger";

/// Root URL for the platform binaries archives.
pub const BINARIES_BASE_URL: &str = "https://nexus.hyperledger.org/content/repositories/releases/org/hyperledger/fabric/hyperledger-fabric";

/// File name prefix of the platform binaries archive.
pub const ARTEFACT_PREFIX: &str = "hyperledger-fabric";

/// Git repository holding the Fabric samples.
pub const SAMPLES_REPO_URL: &str = "https://github.com/hyperledger/fabric-samples";

/// Images tagged with the Fabric version.
pub const PLATFORM_IMAGES: &[&str] = &["peer", "orderer", "ccenv", "javaenv", "tools", "ca"];

/// Images tagged with the third-party version.
pub const THIRDPARTY_IMAGES: &[&str] = &["couchdb", "kafka", "zookeeper"];

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The TOML deserialisation error.
        #[source]
        source: toml::de::Error,
    },

    /// A version-valued setting could not be parsed.
    #[error("invalid {key}: {source}")]
    InvalidVersion {
        /// The offending setting.
        key: &'static str,
        /// The parse failure.
        #[source]
        source: ParseError,
    },

    /// A setting has an unusable value.
    #[error("invalid {key}: {reason}")]
    InvalidValue {
        /// The offending setting.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// No installation directory was given and the home directory is unknown.
    #[error("could not determine the home directory; pass --install-dir")]
    NoHomeDirectory,
}

/// Settings read from a TOML configuration file. Every key is optional.
///
/// # Examples
///
/// ```
/// use hlf_installer::config::ConfigFile;
///
/// let file = ConfigFile::parse("fabric-version = \"1.2.0\"")?;
/// assert_eq!(file.fabric_version.as_deref(), Some("1.2.0"));
/// # Ok::<(), hlf_installer::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConfigFile {
    /// Minimum Docker engine version label.
    pub minimum_docker_version: Option<String>,
    /// Minimum docker-compose version label.
    pub minimum_compose_version: Option<String>,
    /// Docker Hub organisation hosting the images.
    pub registry_prefix: Option<String>,
    /// Fabric release to install.
    pub fabric_version: Option<String>,
    /// Third-party image release.
    pub thirdparty_version: Option<String>,
    /// Root URL for binaries archives.
    pub binaries_base_url: Option<String>,
    /// File name prefix of the binaries archive.
    pub artefact_prefix: Option<String>,
    /// Samples repository URL.
    pub samples_repo_url: Option<String>,
    /// Names of the images tagged with the Fabric version.
    pub platform_images: Option<Vec<String>>,
    /// Names of the images tagged with the third-party version.
    pub thirdparty_images: Option<Vec<String>>,
    /// Installation directory.
    pub install_dir: Option<Utf8PathBuf>,
}

impl ConfigFile {
    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown keys.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Self::parse_from(contents, Utf8Path::new("<inline>"))
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse_from(&contents, path)
    }

    fn parse_from(contents: &str, path: &Utf8Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

/// Values supplied on the command line, applied over the file settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Installation directory override.
    pub install_dir: Option<Utf8PathBuf>,
    /// Fabric release override.
    pub fabric_version: Option<String>,
    /// Third-party release override.
    pub thirdparty_version: Option<String>,
}

/// The immutable configuration shared by every provisioning component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    /// Minimum acceptable Docker engine version.
    pub minimum_runtime: VersionRequirement,
    /// Minimum acceptable docker-compose version.
    pub minimum_compose: VersionRequirement,
    /// Docker Hub organisation hosting the images.
    pub registry_prefix: String,
    /// Fabric release to install.
    pub fabric_version: String,
    /// Third-party image release.
    pub thirdparty_version: String,
    /// Root URL for binaries archives.
    pub binaries_base_url: String,
    /// File name prefix of the binaries archive.
    pub artefact_prefix: String,
    /// Samples repository URL.
    pub samples_repo_url: String,
    /// Names of the images tagged with the Fabric version.
    pub platform_images: Vec<String>,
    /// Names of the images tagged with the third-party version.
    pub thirdparty_images: Vec<String>,
    /// Directory receiving binaries and samples.
    pub install_dir: Utf8PathBuf,
}

impl ProvisionConfig {
    /// Built-in defaults with the given installation directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use hlf_installer::config::ProvisionConfig;
    ///
    /// let config = ProvisionConfig::with_install_dir("/tmp/hlf".into());
    /// assert_eq!(config.fabric_version, "1.1.0");
    /// assert_eq!(config.minimum_runtime.label(), "17.06.2-ce");
    /// ```
    #[must_use]
    pub fn with_install_dir(install_dir: Utf8PathBuf) -> Self {
        Self {
            minimum_runtime: VersionRequirement::new(
                SemanticVersion::new(17, 6, 2),
                MINIMUM_DOCKER_VERSION,
            ),
            minimum_compose: VersionRequirement::new(
                SemanticVersion::new(1, 14, 0),
                MINIMUM_COMPOSE_VERSION,
            ),
            registry_prefix: REGISTRY_PREFIX.to_owned(),
            fabric_version: FABRIC_VERSION.to_owned(),
            thirdparty_version: THIRDPARTY_VERSION.to_owned(),
            binaries_base_url: BINARIES_BASE_URL.to_owned(),
            artefact_prefix: ARTEFACT_PREFIX.to_owned(),
            samples_repo_url: SAMPLES_REPO_URL.to_owned(),
            platform_images: to_owned_list(PLATFORM_IMAGES),
            thirdparty_images: to_owned_list(THIRDPARTY_IMAGES),
            install_dir,
        }
    }

    /// Layer file settings and command-line overrides over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a version setting does not parse, a
    /// string setting is empty, or no installation directory can be found.
    pub fn resolve(
        file: ConfigFile,
        overrides: Overrides,
        dirs: &dyn BaseDirs,
    ) -> Result<Self, ConfigError> {
        let install_dir = overrides
            .install_dir
            .or(file.install_dir)
            .or_else(|| default_install_dir(dirs))
            .ok_or(ConfigError::NoHomeDirectory)?;

        let mut config = Self::with_install_dir(install_dir);

        if let Some(label) = file.minimum_docker_version {
            config.minimum_runtime = parse_requirement("minimum-docker-version", &label)?;
        }
        if let Some(label) = file.minimum_compose_version {
            config.minimum_compose = parse_requirement("minimum-compose-version", &label)?;
        }
        replace_string(&mut config.registry_prefix, "registry-prefix", file.registry_prefix)?;
        replace_string(
            &mut config.binaries_base_url,
            "binaries-base-url",
            file.binaries_base_url,
        )?;
        replace_string(&mut config.artefact_prefix, "artefact-prefix", file.artefact_prefix)?;
        replace_string(&mut config.samples_repo_url, "samples-repo-url", file.samples_repo_url)?;
        replace_string(
            &mut config.fabric_version,
            "fabric-version",
            overrides.fabric_version.or(file.fabric_version),
        )?;
        replace_string(
            &mut config.thirdparty_version,
            "thirdparty-version",
            overrides.thirdparty_version.or(file.thirdparty_version),
        )?;
        if let Some(images) = file.platform_images {
            config.platform_images = images;
        }
        if let Some(images) = file.thirdparty_images {
            config.thirdparty_images = images;
        }

        config.validate()?;
        Ok(config)
    }

    /// Image specs for the Fabric platform images.
    #[must_use]
    pub fn platform_image_specs(&self) -> Vec<ImageSpec> {
        self.image_specs(&self.platform_images)
    }

    /// Image specs for the third-party images.
    #[must_use]
    pub fn thirdparty_image_specs(&self) -> Vec<ImageSpec> {
        self.image_specs(&self.thirdparty_images)
    }

    fn image_specs(&self, names: &[String]) -> Vec<ImageSpec> {
        names
            .iter()
            .map(|name| ImageSpec::new(&self.registry_prefix, name))
            .collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("fabric-version", &self.fabric_version),
            ("thirdparty-version", &self.thirdparty_version),
        ] {
            SemanticVersion::parse(value)
                .map_err(|source| ConfigError::InvalidVersion { key, source })?;
        }

        for (key, names) in [
            ("platform-images", &self.platform_images),
            ("thirdparty-images", &self.thirdparty_images),
        ] {
            if let Some(bad) = names.iter().find(|name| !is_valid_image_name(name)) {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: format!("\"{bad}\" is not a valid image name"),
                });
            }
        }

        Ok(())
    }
}

fn parse_requirement(key: &'static str, label: &str) -> Result<VersionRequirement, ConfigError> {
    VersionRequirement::parse(label).map_err(|source| ConfigError::InvalidVersion { key, source })
}

fn replace_string(
    slot: &mut String,
    key: &'static str,
    value: Option<String>,
) -> Result<(), ConfigError> {
    let Some(new_value) = value else {
        return Ok(());
    };
    if new_value.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            key,
            reason: "value must not be empty".to_owned(),
        });
    }
    *slot = new_value;
    Ok(())
}

fn is_valid_image_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || b"-_.".contains(&byte))
}

fn to_owned_list(names: &[&str]) -> Vec<String> {
    names.iter().map(|&name| name.to_owned()).collect()
}
