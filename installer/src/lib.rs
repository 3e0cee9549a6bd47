//! hlf installer library.
//!
//! This crate provisions a local Hyperledger Fabric development environment.
//! It gates on the installed Docker and docker-compose versions, pulls and
//! re-tags the Fabric container images, and streams the platform binaries
//! archive into a per-user directory. It is used by the `hlf` CLI binary and
//! can be driven programmatically for testing.
//!
//! # Modules
//!
//! - [`archive`] - Binaries archive download and extraction
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Layered provisioning configuration
//! - [`dirs`] - Installation directory resolution
//! - [`error`] - Top-level error type for a provisioning run
//! - [`exec`] - External command execution
//! - [`images`] - Image pull and re-tag sequence
//! - [`orchestrator`] - Target sequencing and run state
//! - [`output`] - Progress messages and shell snippets
//! - [`platform`] - Host OS and architecture naming
//! - [`preflight`] - Docker and docker-compose checks
//! - [`runtime`] - Container runtime interface and Docker CLI driver
//! - [`samples`] - Fabric samples checkout
//! - [`semver`] - Version parsing and comparison

pub mod archive;
pub mod cli;
pub mod config;
pub mod dirs;
pub mod error;
pub mod exec;
pub mod images;
pub mod orchestrator;
pub mod output;
pub mod platform;
pub mod preflight;
pub mod runtime;
pub mod samples;
pub mod semver;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
