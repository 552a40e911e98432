//! Environment merge policies.
//!
//! A build environment is composed from a *base* (usually the OS environment)
//! and one or more *layers* (each profile target's recorded `env`). How each
//! variable is combined is decided by its [`MergePolicy`]; variables without a
//! policy keep the first value encountered.
//!
//! ## Actions
//!
//! | Action               | Base value | Layer values                      |
//! |----------------------|------------|-----------------------------------|
//! | `First`              | kept       | set only if not already present   |
//! | `Last`               | kept       | always overwrite                  |
//! | `Ignore`             | removed    | discarded                         |
//! | `Append`/`Prepend`   | kept       | tokens appended/prepended         |
//! | `IgnoreBase*`        | removed    | as the plain action               |
//! | `IgnoreProfiles`     | kept       | discarded                         |
//!
//! Policies travel on the command line in a compact encoding handled by the
//! [`encoding`] submodule.

pub mod encoding;

use std::collections::BTreeMap;
use std::fmt;

use crate::envvar::{split_key_value, split_tokens, EnvVars};

/// Separator used by path-list style variables such as `PATH`.
pub const PATH_SEPARATOR: &str = ":";

/// Separator used by flag style variables such as `CFLAGS`.
pub const FLAG_SEPARATOR: &str = " ";

/// How a single variable is combined across base and layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeAction {
    First,
    Last,
    Ignore,
    Append,
    Prepend,
    IgnoreBaseAppend,
    IgnoreBasePrepend,
    IgnoreBaseUseFirst,
    IgnoreBaseUseLast,
    IgnoreProfiles,
}

impl MergeAction {
    /// True if this action removes the variable from the base environment.
    pub fn ignores_base(self) -> bool {
        matches!(
            self,
            MergeAction::Ignore
                | MergeAction::IgnoreBaseAppend
                | MergeAction::IgnoreBasePrepend
                | MergeAction::IgnoreBaseUseFirst
                | MergeAction::IgnoreBaseUseLast
        )
    }

    /// The action applied to layer values once the base has been purged.
    pub fn effective(self) -> MergeAction {
        match self {
            MergeAction::IgnoreBaseAppend => MergeAction::Append,
            MergeAction::IgnoreBasePrepend => MergeAction::Prepend,
            MergeAction::IgnoreBaseUseFirst => MergeAction::First,
            MergeAction::IgnoreBaseUseLast => MergeAction::Last,
            other => other,
        }
    }

    /// True for the actions that use a separator.
    pub fn uses_separator(self) -> bool {
        matches!(self.effective(), MergeAction::Append | MergeAction::Prepend)
    }
}

/// Token separator of a list-valued variable.
///
/// Only the two separators the textual encoding can express exist, so every
/// policy round-trips through [`encoding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separator {
    /// `:`, as in `PATH`.
    Path,
    /// A single space, as in `CFLAGS`.
    Flag,
}

impl Separator {
    pub fn as_str(self) -> &'static str {
        match self {
            Separator::Path => PATH_SEPARATOR,
            Separator::Flag => FLAG_SEPARATOR,
        }
    }
}

/// A merge action plus the separator its tokenising variants use.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergePolicy {
    pub action: MergeAction,
    separator: Option<Separator>,
}

impl MergePolicy {
    /// The separator is dropped for actions that do not tokenise.
    pub fn new(action: MergeAction, separator: Separator) -> Self {
        Self {
            action,
            separator: action.uses_separator().then_some(separator),
        }
    }

    fn plain(action: MergeAction) -> Self {
        Self {
            action,
            separator: None,
        }
    }

    /// `Some` exactly for the Append/Prepend variants.
    pub fn separator(&self) -> Option<Separator> {
        self.separator
    }

    /// The separator as a string; empty for actions that do not tokenise.
    pub fn separator_str(&self) -> &'static str {
        self.separator.map_or("", Separator::as_str)
    }

    pub fn first() -> Self {
        Self::plain(MergeAction::First)
    }

    pub fn last() -> Self {
        Self::plain(MergeAction::Last)
    }

    pub fn ignore() -> Self {
        Self::plain(MergeAction::Ignore)
    }

    pub fn append_path() -> Self {
        Self::new(MergeAction::Append, Separator::Path)
    }

    pub fn append_flag() -> Self {
        Self::new(MergeAction::Append, Separator::Flag)
    }

    pub fn prepend_path() -> Self {
        Self::new(MergeAction::Prepend, Separator::Path)
    }

    pub fn prepend_flag() -> Self {
        Self::new(MergeAction::Prepend, Separator::Flag)
    }

    pub fn ignore_base_append_path() -> Self {
        Self::new(MergeAction::IgnoreBaseAppend, Separator::Path)
    }

    pub fn ignore_base_prepend_path() -> Self {
        Self::new(MergeAction::IgnoreBasePrepend, Separator::Path)
    }

    pub fn ignore_base_use_first() -> Self {
        Self::plain(MergeAction::IgnoreBaseUseFirst)
    }

    pub fn ignore_base_use_last() -> Self {
        Self::plain(MergeAction::IgnoreBaseUseLast)
    }

    /// Keep the base value and ignore anything profiles supply.
    pub fn use_base_ignore_profiles() -> Self {
        Self::plain(MergeAction::IgnoreProfiles)
    }
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::first()
    }
}

/// Per-variable merge policies. Unmapped variables use [`MergePolicy::first`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePolicies {
    policies: BTreeMap<String, MergePolicy>,
}

impl MergePolicies {
    pub fn new() -> Self {
        Self::default()
    }

    /// The policy for `var`, or `First` if none is set.
    pub fn policy(&self, var: &str) -> MergePolicy {
        self.policies.get(var).cloned().unwrap_or_default()
    }

    pub fn get(&self, var: &str) -> Option<&MergePolicy> {
        self.policies.get(var)
    }

    pub fn insert(&mut self, var: impl Into<String>, policy: MergePolicy) -> Option<MergePolicy> {
        self.policies.insert(var.into(), policy)
    }

    pub fn remove(&mut self, var: &str) -> Option<MergePolicy> {
        self.policies.remove(var)
    }

    /// Overlay `other` on top of these policies.
    pub fn extend(&mut self, other: &MergePolicies) {
        for (var, policy) in other.iter() {
            self.policies.insert(var.to_string(), policy.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MergePolicy)> {
        self.policies.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, MergePolicy)> for MergePolicies {
    fn from_iter<I: IntoIterator<Item = (K, MergePolicy)>>(iter: I) -> Self {
        Self {
            policies: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl fmt::Display for MergePolicies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encoding::encode(self))
    }
}

const FLAG_VARS: [&str; 6] = [
    "CCFLAGS",
    "CXXFLAGS",
    "LDFLAGS",
    "CGO_CFLAGS",
    "CGO_CXXFLAGS",
    "CGO_LDFLAGS",
];

/// Policies used when composing the environments of several profiles.
pub fn profile_merge_policies() -> MergePolicies {
    let mut policies: MergePolicies = FLAG_VARS
        .iter()
        .map(|v| (*v, MergePolicy::append_flag()))
        .collect();
    policies.insert("PATH", MergePolicy::append_path());
    policies.insert("GOPATH", MergePolicy::append_path());
    policies
}

/// The stricter policies jiri itself uses when building.
///
/// On top of [`profile_merge_policies`], `GOPATH` never inherits from the
/// base environment and `GOARCH`/`GOOS` are never taken from profiles.
pub fn jiri_merge_policies() -> MergePolicies {
    let mut policies = profile_merge_policies();
    policies.insert("GOPATH", MergePolicy::ignore_base_append_path());
    policies.insert("GOARCH", MergePolicy::use_base_ignore_profiles());
    policies.insert("GOOS", MergePolicy::use_base_ignore_profiles());
    policies
}

/// Merge `layers` of `KEY=VALUE` entries into `base` according to `policies`.
///
/// Variables whose policy ignores the base are removed from `base` first, on
/// every call. Layers are applied in order, so later layers win for
/// `Last`-style policies and are appended after earlier ones.
pub fn merge_env<L, E>(policies: &MergePolicies, base: &mut EnvVars, layers: L)
where
    L: IntoIterator,
    L::Item: IntoIterator<Item = E>,
    E: AsRef<str>,
{
    for (var, policy) in policies.iter() {
        if policy.action.ignores_base() {
            base.delete(var);
        }
    }

    for layer in layers {
        for entry in layer {
            let (key, value) = split_key_value(entry.as_ref());
            if key.is_empty() {
                continue;
            }
            let policy = policies.policy(key);
            match policy.action.effective() {
                MergeAction::Ignore | MergeAction::IgnoreProfiles => {}
                MergeAction::Append => {
                    let separator = policy.separator_str();
                    let mut tokens = base.get_tokens(key, separator);
                    tokens.extend(split_tokens(value, separator));
                    base.set_tokens(key, &tokens, separator);
                }
                MergeAction::Prepend => {
                    let separator = policy.separator_str();
                    let mut tokens = split_tokens(value, separator);
                    tokens.extend(base.get_tokens(key, separator));
                    base.set_tokens(key, &tokens, separator);
                }
                MergeAction::First => {
                    if !base.contains(key) {
                        base.set(key, value);
                    }
                }
                MergeAction::Last => base.set(key, value),
                // effective() never yields the IgnoreBase variants.
                MergeAction::IgnoreBaseAppend
                | MergeAction::IgnoreBasePrepend
                | MergeAction::IgnoreBaseUseFirst
                | MergeAction::IgnoreBaseUseLast => {}
            }
        }
    }
}
