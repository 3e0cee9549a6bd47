//! Dotted version parsing and minimum-version checks.
//!
//! Docker and docker-compose report plain `major.minor.patch` strings,
//! sometimes with an edition suffix such as `-ce`. This module parses those
//! strings into [`SemanticVersion`] values and compares them against a
//! [`VersionRequirement`]. Everything here is pure and free of I/O.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of dot-separated components accepted by the parser.
const MAX_COMPONENTS: usize = 3;

/// Errors arising from malformed version strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The string is not a 1 to 3 component dotted decimal version.
    #[error("invalid version \"{value}\": {reason}")]
    InvalidFormat {
        /// The rejected input.
        value: String,
        /// Which constraint the input violated.
        reason: &'static str,
    },
}

/// A three-component version identifier ordered by `(major, minor, patch)`.
///
/// # Examples
///
/// ```
/// use hlf_installer::semver::SemanticVersion;
///
/// let version: SemanticVersion = "17.06".parse()?;
/// assert_eq!(version, SemanticVersion::new(17, 6, 0));
/// assert_eq!(version.to_string(), "17.6.0");
/// # Ok::<(), hlf_installer::semver::ParseError>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
}

impl SemanticVersion {
    /// Create a version from its three components.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a dotted version string.
    ///
    /// One, two, or three components are accepted; missing trailing
    /// components are zero-filled, so `"1"` is `1.0.0` and `"1.2"` is
    /// `1.2.0`. Leading zeros are read as decimal (`"06"` is `6`).
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidFormat`] for the empty string, for more
    /// than three components, and for any component that is not made up
    /// solely of ASCII digits.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(invalid(input, "version string is empty"));
        }

        let mut components = [0_u64; MAX_COMPONENTS];
        let mut count = 0;
        for part in input.split('.') {
            let Some(slot) = components.get_mut(count) else {
                return Err(invalid(input, "expected at most three components"));
            };
            *slot = parse_component(input, part)?;
            count += 1;
        }

        let [major, minor, patch] = components;
        Ok(Self::new(major, minor, patch))
    }

    /// Returns `true` when `self` is at least `minimum`.
    #[must_use]
    pub fn satisfies(&self, minimum: &Self) -> bool {
        at_least(minimum, self)
    }
}

impl FromStr for SemanticVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Returns `true` iff `actual >= minimum` under `(major, minor, patch)`
/// tuple ordering. Equal versions satisfy the minimum.
///
/// # Examples
///
/// ```
/// use hlf_installer::semver::{SemanticVersion, at_least};
///
/// let minimum = SemanticVersion::new(17, 6, 2);
/// assert!(at_least(&minimum, &SemanticVersion::new(18, 0, 0)));
/// assert!(!at_least(&minimum, &SemanticVersion::new(17, 3, 9)));
/// ```
#[must_use]
pub fn at_least(minimum: &SemanticVersion, actual: &SemanticVersion) -> bool {
    actual >= minimum
}

/// Remove surrounding whitespace and any `-` or `+` suffix from a reported
/// version, e.g. `"17.06.2-ce\n"` becomes `"17.06.2"`.
#[must_use]
pub fn strip_suffix(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.split(['-', '+']).next().unwrap_or(trimmed)
}

/// A minimum version paired with the label shown to users.
///
/// The label keeps the vendor's spelling (for example `17.06.2-ce`) while the
/// comparison uses the parsed [`SemanticVersion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequirement {
    minimum: SemanticVersion,
    label: String,
}

impl VersionRequirement {
    /// Build a requirement from an already-parsed minimum.
    #[must_use]
    pub fn new(minimum: SemanticVersion, label: impl Into<String>) -> Self {
        Self {
            minimum,
            label: label.into(),
        }
    }

    /// Build a requirement from a label such as `"17.06.2-ce"`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the label, once its suffix is removed, is
    /// not a valid version.
    ///
    /// # Examples
    ///
    /// ```
    /// use hlf_installer::semver::{SemanticVersion, VersionRequirement};
    ///
    /// let requirement = VersionRequirement::parse("17.06.2-ce")?;
    /// assert_eq!(requirement.minimum(), SemanticVersion::new(17, 6, 2));
    /// assert_eq!(requirement.label(), "17.06.2-ce");
    /// # Ok::<(), hlf_installer::semver::ParseError>(())
    /// ```
    pub fn parse(label: &str) -> Result<Self, ParseError> {
        let minimum = SemanticVersion::parse(strip_suffix(label))?;
        Ok(Self::new(minimum, label.trim()))
    }

    /// The minimum acceptable version.
    #[must_use]
    pub fn minimum(&self) -> SemanticVersion {
        self.minimum
    }

    /// The label used in user-facing messages.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns `true` when `actual` meets this requirement.
    #[must_use]
    pub fn is_satisfied_by(&self, actual: &SemanticVersion) -> bool {
        at_least(&self.minimum, actual)
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn parse_component(input: &str, part: &str) -> Result<u64, ParseError> {
    if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid(input, "components must be non-negative integers"));
    }
    part.parse()
        .map_err(|_| invalid(input, "component does not fit in 64 bits"))
}

fn invalid(input: &str, reason: &'static str) -> ParseError {
    ParseError::InvalidFormat {
        value: input.to_owned(),
        reason,
    }
}
