//! Build targets.
//!
//! A [`Target`] names one build configuration of a profile: an architecture,
//! an operating system and a version, plus the environment overlays recorded
//! at install time. Targets are written on the command line in the compact
//! form `arch-os[@version]`, optionally prefixed by a `tag=` shorthand.
//!
//! Two targets are the *same target* when their arch and os match (and their
//! tags, when both carry one). The version only distinguishes installed
//! instances, so several versions of the same target may coexist in a
//! profile.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::path::encode_dirname;

/// One (arch, os, version) build configuration of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Optional shorthand name; empty when unset.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tag: String,
    pub arch: String,
    pub os: String,
    /// Empty means "not specified, resolve later".
    pub version: String,
    /// `KEY=VALUE` entries supplied by the profile's installer.
    pub env: Vec<String>,
    /// `KEY=VALUE` entries supplied by the user when installing.
    pub command_line_env: Vec<String>,
    /// Installation directory, possibly relative to `${JIRI_ROOT}`.
    pub installation_dir: String,
}

impl Target {
    /// Create a target with no version and no environment.
    pub fn new(arch: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            os: os.into(),
            ..Self::default()
        }
    }

    /// Builder-style setter for the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Parse `[tag=]arch-os[@version]`.
    pub fn parse(input: &str) -> Result<Self> {
        let malformed = |message: &str| Error::MalformedTarget {
            input: input.to_string(),
            message: message.to_string(),
        };

        let trimmed = input.trim();
        // A tag ends at an '=' that precedes the first '-'.
        let tag_end = trimmed
            .find('=')
            .filter(|&eq| !trimmed.find('-').is_some_and(|dash| dash < eq));
        let (tag, rest) = match tag_end {
            Some(0) => return Err(malformed("empty tag before '='")),
            Some(eq) => (&trimmed[..eq], &trimmed[eq + 1..]),
            None => ("", trimmed),
        };
        if rest.contains('=') {
            return Err(malformed("'=' may only separate a tag from <arch>-<os>"));
        }

        let (arch_os, version) = match rest.split_once('@') {
            Some((_, "")) => return Err(malformed("empty version after '@'")),
            Some((arch_os, version)) => (arch_os, version),
            None => (rest, ""),
        };
        if version.contains('@') {
            return Err(malformed("more than one '@'"));
        }

        let (arch, os) = arch_os
            .split_once('-')
            .ok_or_else(|| malformed("expected <arch>-<os>[@<version>]"))?;
        if arch.is_empty() || os.is_empty() {
            return Err(malformed("arch and os must both be non-empty"));
        }

        Ok(Self {
            tag: tag.to_string(),
            arch: arch.to_string(),
            os: os.to_string(),
            version: version.to_string(),
            ..Self::default()
        })
    }

    /// The target of the machine this binary runs on, using Go-style names.
    pub fn host() -> Self {
        let arch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            other => other,
        };
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        Self::new(arch, os)
    }

    /// True once arch and os have been filled in.
    pub fn is_set(&self) -> bool {
        !self.arch.is_empty() && !self.os.is_empty()
    }

    /// `arch-os` without tag or version.
    pub fn arch_os(&self) -> String {
        format!("{}-{}", self.arch, self.os)
    }

    /// Directory name unique to this target and version.
    pub fn target_specific_dirname(&self) -> String {
        let mut name = format!("{}_{}", self.arch, self.os);
        if !self.version.is_empty() {
            name.push('_');
            name.push_str(&self.version);
        }
        encode_dirname(&name)
    }

    /// Multi-line dump of every field, used by `list --info`.
    pub fn options_string(&self) -> String {
        let dir = &self.installation_dir;
        let mut out = format!("target: {}\n", self);
        out.push_str(&format!("  installation directory: {}\n", dir));
        out.push_str(&format!("  env: {:?}\n", self.env));
        let command_line_env = &self.command_line_env;
        out.push_str(&format!("  command line env: {:?}\n", command_line_env));
        out
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.tag.is_empty() {
            write!(f, "{}=", self.tag)?;
        }
        write!(f, "{}-{}", self.arch, self.os)?;
        if !self.version.is_empty() {
            write!(f, "@{}", self.version)?;
        }
        Ok(())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// True when `a` and `b` name the same target, ignoring version.
pub fn matches(a: &Target, b: &Target) -> bool {
    if a.arch != b.arch || a.os != b.os {
        return false;
    }
    a.tag.is_empty() || b.tag.is_empty() || a.tag == b.tag
}

/// True when `a` and `b` are the same installed instance.
pub fn same_instance(a: &Target, b: &Target) -> bool {
    matches(a, b) && a.version == b.version
}

/// First target matching `query`, honouring its version when one is given.
///
/// With an empty query version the first (arch, os) match is returned; since
/// profiles keep their targets sorted most recent first, that is the newest
/// installed version.
pub fn find_target<'a>(targets: &'a [Target], query: &Target) -> Option<&'a Target> {
    targets.iter().find(|t| {
        matches(t, query) && (query.version.is_empty() || t.version == query.version)
    })
}

/// Like [`find_target`], but an unset query matches a lone target.
pub fn find_target_with_default<'a>(
    targets: &'a [Target],
    query: &Target,
) -> Option<&'a Target> {
    if !query.is_set() && targets.len() == 1 {
        return targets.first();
    }
    find_target(targets, query)
}

/// Replace the instance with the same (arch, os, version) or append `target`.
///
/// Returns true when an existing entry was replaced.
pub fn insert_target(targets: &mut Vec<Target>, target: Target) -> bool {
    match targets.iter_mut().find(|t| same_instance(t, &target)) {
        Some(existing) => {
            *existing = target;
            true
        }
        None => {
            targets.push(target);
            false
        }
    }
}

/// Remove the instance with the same (arch, os, version) as `target`.
pub fn remove_target(targets: &mut Vec<Target>, target: &Target) -> bool {
    match targets.iter().position(|t| same_instance(t, target)) {
        Some(idx) => {
            targets.remove(idx);
            true
        }
        None => false,
    }
}

/// Ordering for display: arch, then os, then most recent version first.
pub fn display_order(a: &Target, b: &Target) -> Ordering {
    a.arch
        .cmp(&b.arch)
        .then_with(|| a.os.cmp(&b.os))
        .then_with(|| b.version.cmp(&a.version))
}

/// Sort `targets` in [`display_order`].
pub fn sort_targets(targets: &mut [Target]) {
    targets.sort_by(display_order);
}
