//! Profiles: named, installer-scoped sets of installed targets.

use serde::Serialize;

use crate::target::{self, Target};

/// Separator between installer and profile name in a qualified name.
pub const QUALIFIER_SEPARATOR: char = ':';

/// `installer:name`, or just `name` when the installer is empty.
pub fn qualified_name(installer: &str, name: &str) -> String {
    if installer.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", installer, QUALIFIER_SEPARATOR, name)
    }
}

/// Split a qualified name into `(installer, name)`.
pub fn split_qualified_name(qualified: &str) -> (&str, &str) {
    match qualified.split_once(QUALIFIER_SEPARATOR) {
        Some((installer, name)) => (installer, name),
        None => ("", qualified),
    }
}

/// A profile and the targets installed for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub name: String,
    pub installer: String,
    /// Root directory of the profile's installations, possibly `${JIRI_ROOT}` relative.
    pub root: String,
    targets: Vec<Target>,
}

impl Profile {
    pub fn new(
        installer: impl Into<String>,
        name: impl Into<String>,
        root: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            installer: installer.into(),
            root: root.into(),
            targets: Vec::new(),
        }
    }

    pub fn qualified_name(&self) -> String {
        qualified_name(&self.installer, &self.name)
    }

    /// Installed targets in insertion order.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Installed targets sorted for display, most recent version first.
    pub fn sorted_targets(&self) -> Vec<Target> {
        let mut targets = self.targets.clone();
        target::sort_targets(&mut targets);
        targets
    }

    /// The installed target matching `query`; see [`target::find_target`].
    pub fn find_target(&self, query: &Target) -> Option<&Target> {
        let sorted = self.sorted_targets();
        let found = target::find_target(&sorted, query)?;
        self.targets
            .iter()
            .find(|t| target::same_instance(t, found))
    }

    /// Insert or replace the (arch, os, version) instance of `target`.
    ///
    /// Returns true when an existing entry was updated.
    pub fn insert_target(&mut self, target: Target) -> bool {
        target::insert_target(&mut self.targets, target)
    }

    pub fn remove_target(&mut self, target: &Target) -> bool {
        target::remove_target(&mut self.targets, target)
    }

    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }
}
