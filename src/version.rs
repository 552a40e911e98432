//! # Version Selection
//!
//! Each profile manager publishes a [`VersionInfo`]: the set of versions it
//! knows how to install and the one it installs by default. The lifecycle
//! uses it in two places:
//!
//! 1.  **Selection**: pinning an unspecified `--target` version to the
//!     default, or rejecting a version the manager does not support.
//! 2.  **Recency**: deciding whether an installed target is out of date, which
//!     drives the `update` and `cleanup --gc` verbs.
//!
//! Versions are compared as plain strings. Managers whose version scheme does
//! not sort lexicographically should name the default explicitly, which is
//! always what recency is measured against.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Error, Result};

/// Supported versions and the default for one profile manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    name: String,
    supported: BTreeSet<String>,
    default_version: String,
}

impl VersionInfo {
    /// Create version information for the manager called `name`.
    ///
    /// An empty `default_version` selects the most recent supported version.
    /// The default is always added to the supported set.
    pub fn new<I, S>(
        name: impl Into<String>,
        supported: I,
        default_version: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut supported: BTreeSet<String> = supported.into_iter().map(Into::into).collect();
        let mut default_version = default_version.into();
        if default_version.is_empty() {
            default_version = supported.iter().next_back().cloned().unwrap_or_default();
        }
        if !default_version.is_empty() {
            supported.insert(default_version.clone());
        }
        Self {
            name: name.into(),
            supported,
            default_version,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    /// Pin `requested` to a concrete version.
    ///
    /// An empty request selects the default; anything else must be supported.
    pub fn select(&self, requested: &str) -> Result<String> {
        if requested.is_empty() {
            return Ok(self.default_version.clone());
        }
        if self.supported.contains(requested) {
            Ok(requested.to_string())
        } else {
            Err(Error::UnsupportedVersion {
                name: self.name.clone(),
                version: requested.to_string(),
                supported: self.supported(),
            })
        }
    }

    /// Supported versions, most recent first.
    pub fn supported(&self) -> Vec<String> {
        self.supported.iter().rev().cloned().collect()
    }

    pub fn is_supported(&self, version: &str) -> bool {
        self.supported.contains(version)
    }

    /// True for an installed version that is not the current default.
    pub fn is_target_older_than_default(&self, version: &str) -> bool {
        !version.is_empty() && version != self.default_version
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: versions [{}], default {}",
            self.name,
            self.supported().join(", "),
            self.default_version
        )
    }
}
