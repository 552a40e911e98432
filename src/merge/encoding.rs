//! Compact textual encoding of merge policies.
//!
//! One comma separated token per variable:
//!
//! | Token            | Policy                                   |
//! |------------------|------------------------------------------|
//! | `VAR`            | First                                    |
//! | `VAR*`           | Last                                     |
//! | `-VAR`           | Ignore                                   |
//! | `:VAR` / `VAR:`  | Append / Prepend, `:` separator          |
//! | `+VAR` / `VAR+`  | Append / Prepend, space separator        |
//! | `^` + any above  | same, ignoring the base value            |
//! | `VAR^`           | IgnoreProfiles (use base, skip profiles) |
//!
//! `-VAR` and `VAR^` cannot take the `^` prefix. Encoding always emits
//! variables in sorted order, so `encode(parse(s))` is canonical.

use std::str::FromStr;

use super::{MergeAction, MergePolicies, MergePolicy, Separator};
use crate::error::{Error, Result};

const RESERVED: [char; 6] = ['^', ':', '+', '*', '=', ','];

fn invalid(token: &str, message: &str) -> Error {
    Error::InvalidMergePolicy {
        token: token.to_string(),
        message: message.to_string(),
    }
}

/// Parse a single token into its variable name and policy.
pub fn parse_token(token: &str) -> Result<(String, MergePolicy)> {
    let (ignore_base, rest) = match token.strip_prefix('^') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    let (name, action, separator) = if let Some(name) = rest.strip_prefix('-') {
        if ignore_base {
            return Err(invalid(token, "'^' cannot be combined with '-'"));
        }
        (name, MergeAction::Ignore, Separator::Path)
    } else if let Some(name) = rest.strip_prefix(':') {
        (name, append(ignore_base), Separator::Path)
    } else if let Some(name) = rest.strip_prefix('+') {
        (name, append(ignore_base), Separator::Flag)
    } else if let Some(name) = rest.strip_suffix(':') {
        (name, prepend(ignore_base), Separator::Path)
    } else if let Some(name) = rest.strip_suffix('+') {
        (name, prepend(ignore_base), Separator::Flag)
    } else if let Some(name) = rest.strip_suffix('*') {
        let action = if ignore_base {
            MergeAction::IgnoreBaseUseLast
        } else {
            MergeAction::Last
        };
        (name, action, Separator::Path)
    } else if let Some(name) = rest.strip_suffix('^') {
        if ignore_base {
            return Err(invalid(
                token,
                "'^' prefix cannot be combined with '^' suffix",
            ));
        }
        (name, MergeAction::IgnoreProfiles, Separator::Path)
    } else {
        let action = if ignore_base {
            MergeAction::IgnoreBaseUseFirst
        } else {
            MergeAction::First
        };
        (rest, action, Separator::Path)
    };

    if name.is_empty() {
        return Err(invalid(token, "missing variable name"));
    }
    if name.starts_with('-') || name.chars().any(|c| c.is_whitespace() || RESERVED.contains(&c)) {
        return Err(invalid(token, "invalid variable name"));
    }
    Ok((name.to_string(), MergePolicy::new(action, separator)))
}

fn append(ignore_base: bool) -> MergeAction {
    if ignore_base {
        MergeAction::IgnoreBaseAppend
    } else {
        MergeAction::Append
    }
}

fn prepend(ignore_base: bool) -> MergeAction {
    if ignore_base {
        MergeAction::IgnoreBasePrepend
    } else {
        MergeAction::Prepend
    }
}

/// Encode one variable's policy as a token.
pub fn encode_token(name: &str, policy: &MergePolicy) -> String {
    let list_mark = match policy.separator() {
        Some(Separator::Flag) => "+",
        Some(Separator::Path) | None => ":",
    };
    match policy.action {
        MergeAction::First => name.to_string(),
        MergeAction::Last => format!("{}*", name),
        MergeAction::Ignore => format!("-{}", name),
        MergeAction::Append => format!("{}{}", list_mark, name),
        MergeAction::Prepend => format!("{}{}", name, list_mark),
        MergeAction::IgnoreBaseAppend => format!("^{}{}", list_mark, name),
        MergeAction::IgnoreBasePrepend => format!("^{}{}", name, list_mark),
        MergeAction::IgnoreBaseUseFirst => format!("^{}", name),
        MergeAction::IgnoreBaseUseLast => format!("^{}*", name),
        MergeAction::IgnoreProfiles => format!("{}^", name),
    }
}

/// Encode all policies, sorted by variable name.
pub fn encode(policies: &MergePolicies) -> String {
    policies
        .iter()
        .map(|(name, policy)| encode_token(name, policy))
        .collect::<Vec<_>>()
        .join(",")
}

impl MergePolicies {
    /// Add the policies in `encoded` to this set, overriding existing entries.
    ///
    /// Nothing is added if any token fails to parse.
    pub fn set(&mut self, encoded: &str) -> Result<()> {
        let mut parsed = Vec::new();
        for token in encoded.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            parsed.push(parse_token(token)?);
        }
        for (name, policy) in parsed {
            self.insert(name, policy);
        }
        Ok(())
    }
}

impl FromStr for MergePolicies {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut policies = MergePolicies::new();
        policies.set(s)?;
        Ok(policies)
    }
}
