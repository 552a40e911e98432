//! Environment variable sets.
//!
//! [`EnvVars`] is the mutable set of variables the merge engine composes into.
//! Values are plain strings; list-valued variables such as `PATH` or `CFLAGS`
//! are handled through the token helpers, which split on a caller supplied
//! separator and drop empty tokens.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{Error, Result};

/// Splits a `KEY=VALUE` entry at the first `=`.
///
/// Entries without `=` yield the whole entry as key and an empty value.
pub fn split_key_value(entry: &str) -> (&str, &str) {
    match entry.split_once('=') {
        Some((key, value)) => (key, value),
        None => (entry, ""),
    }
}

/// Like [`split_key_value`] but rejects entries without `=` or with an empty key.
pub fn parse_key_value(entry: &str) -> Result<(&str, &str)> {
    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(Error::InvalidEnv {
            entry: entry.to_string(),
        }),
    }
}

/// Splits `value` on `separator`, dropping empty tokens.
pub fn split_tokens(value: &str, separator: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    if separator.is_empty() {
        return vec![value.to_string()];
    }
    value
        .split(separator)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins `tokens` with `separator`, skipping empty tokens.
pub fn join_tokens<S: AsRef<str>>(tokens: &[S], separator: &str) -> String {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Converts a comma separated `--env` flag value into `KEY=VALUE` entries.
///
/// Commas inside a value are not supported by the flag syntax; each entry
/// must contain `=`.
pub fn parse_env_flag(value: &str) -> Result<Vec<String>> {
    let mut entries = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        parse_key_value(entry)?;
        entries.push(entry.to_string());
    }
    Ok(entries)
}

/// An ordered set of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars {
    vars: BTreeMap<String, String>,
}

impl EnvVars {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    pub fn from_os() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| {
                let key = k.into_string().ok()?;
                Some((key, v.into_string().ok()?))
            })
            .collect();
        Self { vars }
    }

    /// Build from `KEY=VALUE` entries; later entries win.
    pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut vars = Self::new();
        for entry in entries {
            let (k, v) = split_key_value(entry.as_ref());
            if !k.is_empty() {
                vars.set(k, v);
            }
        }
        vars
    }

    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self {
            vars: map.into_iter().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Removes `key`, returning its previous value.
    pub fn delete(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// The value of `key` split into tokens.
    pub fn get_tokens(&self, key: &str, separator: &str) -> Vec<String> {
        self.get(key)
            .map(|v| split_tokens(v, separator))
            .unwrap_or_default()
    }

    /// Sets `key` to the tokens joined by `separator`.
    pub fn set_tokens<S: AsRef<str>>(
        &mut self,
        key: impl Into<String>,
        tokens: &[S],
        separator: &str,
    ) {
        self.set(key, join_tokens(tokens, separator));
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.vars.clone().into_iter().collect()
    }

    /// `KEY=VALUE` entries sorted by key.
    pub fn to_vec(&self) -> Vec<String> {
        self.vars
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect()
    }
}

impl fmt::Display for EnvVars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_vec().join(" "))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
