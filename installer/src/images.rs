//! Pulling and re-tagging Fabric container images.
//!
//! Each image is pulled at an explicit versioned tag and then re-tagged to
//! its un-versioned repository name, so `docker-compose` files that refer to
//! `hyperledger/fabric-peer` resolve to the release just pulled.

use crate::runtime::{ContainerRuntime, RuntimeError};
use log::{debug, info};
use std::fmt;
use thiserror::Error;

/// A Fabric image identified by its short name and registry prefix.
///
/// # Examples
///
/// ```
/// use hlf_installer::images::ImageSpec;
///
/// let peer = ImageSpec::new("hyperledger", "peer");
/// assert_eq!(peer.repository(), "hyperledger/fabric-peer");
/// assert_eq!(peer.reference("x86_64-1.1.0"), "hyperledger/fabric-peer:x86_64-1.1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSpec {
    name: String,
    registry_prefix: String,
}

impl ImageSpec {
    /// Create a spec for `name` published under `registry_prefix`.
    #[must_use]
    pub fn new(registry_prefix: &str, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            registry_prefix: registry_prefix.to_owned(),
        }
    }

    /// The short image name, e.g. `peer`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The un-versioned repository, used as the alias tag.
    #[must_use]
    pub fn repository(&self) -> String {
        format!("{}/fabric-{}", self.registry_prefix, self.name)
    }

    /// The fully qualified `repository:tag` reference to pull.
    #[must_use]
    pub fn reference(&self, tag: &str) -> String {
        format!("{}:{tag}", self.repository())
    }
}

impl fmt::Display for ImageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Errors from provisioning a batch of images.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Pulling an image failed.
    #[error("failed to pull image {image} ({reference}): {source}")]
    Pull {
        /// Short image name.
        image: String,
        /// Reference that was pulled.
        reference: String,
        /// The runtime failure.
        #[source]
        source: RuntimeError,
    },

    /// Re-tagging a pulled image failed.
    #[error("failed to tag image {image} ({reference} as {alias}): {source}")]
    Tag {
        /// Short image name.
        image: String,
        /// Reference that was pulled.
        reference: String,
        /// Alias that could not be applied.
        alias: String,
        /// The runtime failure.
        #[source]
        source: RuntimeError,
    },
}

impl ProvisionError {
    /// Short name of the image that failed.
    #[must_use]
    pub fn image(&self) -> &str {
        match self {
            Self::Pull { image, .. } | Self::Tag { image, .. } => image,
        }
    }
}

/// Build the image tag for a machine architecture and release,
/// e.g. `x86_64-1.1.0`.
#[must_use]
pub fn image_tag(machine: &str, version: &str) -> String {
    format!("{machine}-{version}")
}

/// Pull every image at `tag` and re-tag it to its un-versioned alias.
///
/// Images are processed strictly in order. The first failing pull or tag
/// stops the batch; images already provisioned are left in place.
///
/// Returns the number of images provisioned.
///
/// # Errors
///
/// Returns [`ProvisionError`] naming the image and step that failed.
pub fn provision(
    runtime: &dyn ContainerRuntime,
    images: &[ImageSpec],
    tag: &str,
) -> Result<usize, ProvisionError> {
    for image in images {
        let reference = image.reference(tag);
        let alias = image.repository();

        info!("pulling {reference}");
        runtime
            .pull_image(&reference)
            .map_err(|source| ProvisionError::Pull {
                image: image.name().to_owned(),
                reference: reference.clone(),
                source,
            })?;

        debug!("tagging {reference} as {alias}");
        runtime
            .tag_image(&reference, &alias)
            .map_err(|source| ProvisionError::Tag {
                image: image.name().to_owned(),
                reference: reference.clone(),
                alias: alias.clone(),
                source,
            })?;

        info!("pulled and tagged {alias}");
    }

    Ok(images.len())
}
