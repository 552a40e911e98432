//! Read-only access to installed profiles for commands that consume them.
//!
//! A [`Reader`] pairs the profiles database with an environment, initially
//! the process environment, into which the environments of the requested
//! profiles are merged.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::debug;

use crate::db::Db;
use crate::envvar::EnvVars;
use crate::error::{Error, Result};
use crate::merge::{merge_env, MergePolicies};
use crate::path::expand_root_in_env;
use crate::target::Target;

/// Whether profiles take part in building the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfilesMode {
    #[default]
    UseProfiles,
    SkipProfiles,
}

impl ProfilesMode {
    pub fn from_skip(skip: bool) -> Self {
        if skip {
            ProfilesMode::SkipProfiles
        } else {
            ProfilesMode::UseProfiles
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reader {
    mode: ProfilesMode,
    jiri_root: PathBuf,
    db: Db,
    vars: EnvVars,
}

impl Reader {
    /// Open the database at `db_path` (a missing one is empty) with the
    /// process environment as the base.
    pub fn new(mode: ProfilesMode, db_path: &Path, jiri_root: &Path) -> Result<Self> {
        let db = match mode {
            ProfilesMode::UseProfiles => Db::load(db_path, true)?,
            ProfilesMode::SkipProfiles => Db::new(),
        };
        Ok(Self::from_db(mode, db, jiri_root))
    }

    pub fn from_db(mode: ProfilesMode, db: Db, jiri_root: &Path) -> Self {
        Self {
            mode,
            jiri_root: jiri_root.to_path_buf(),
            db,
            vars: EnvVars::from_os(),
        }
    }

    /// Replace the base environment.
    pub fn with_base(mut self, base: EnvVars) -> Self {
        self.vars = base;
        self
    }

    pub fn mode(&self) -> ProfilesMode {
        self.mode
    }

    pub fn skipping_profiles(&self) -> bool {
        self.mode == ProfilesMode::SkipProfiles
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.db.names()
    }

    pub fn lookup_profile_target(&self, qualified: &str, target: &Target) -> Option<&Target> {
        self.db.lookup_qualified(qualified)?.find_target(target)
    }

    /// The installed environment of one profile for `target`, with
    /// `${JIRI_ROOT}` expanded. Empty if the profile or target is missing.
    pub fn env_from_profile(&self, target: &Target, qualified: &str) -> Vec<String> {
        match self.lookup_profile_target(qualified, target) {
            Some(t) => expand_root_in_env(&t.env, &self.jiri_root),
            None => Vec::new(),
        }
    }

    /// Check that every named profile is installed for `target`.
    pub fn validate_requested_profiles_and_target(
        &self,
        names: &[String],
        target: &Target,
    ) -> Result<()> {
        if self.skipping_profiles() {
            return Ok(());
        }
        for name in names {
            let profile = self
                .db
                .lookup_qualified(name)
                .ok_or_else(|| Error::ProfileNotFound { name: name.clone() })?;
            if profile.find_target(target).is_none() {
                return Err(Error::TargetNotFound {
                    profile: name.clone(),
                    target: target.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Merge the environments of `names`, in order, into the current one.
    ///
    /// Profiles not installed for `target` contribute nothing.
    pub fn merge_env_from_profiles(
        &mut self,
        policies: &MergePolicies,
        target: &Target,
        names: &[String],
    ) {
        if self.skipping_profiles() {
            debug!("profiles disabled, environment left unchanged");
            return;
        }
        let layers: Vec<Vec<String>> = names
            .iter()
            .filter_map(|name| match self.lookup_profile_target(name, target) {
                Some(t) => Some(expand_root_in_env(&t.env, &self.jiri_root)),
                None => {
                    debug!("{} has no installation for {}", name, target);
                    None
                }
            })
            .collect();
        merge_env(policies, &mut self.vars, &layers);
    }

    pub fn vars(&self) -> &EnvVars {
        &self.vars
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key)
    }

    pub fn get_tokens(&self, key: &str, separator: &str) -> Vec<String> {
        self.vars.get_tokens(key, separator)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.set(key, value);
    }

    pub fn delete(&mut self, key: &str) -> Option<String> {
        self.vars.delete(key)
    }

    pub fn to_map(&self) -> std::collections::HashMap<String, String> {
        self.vars.to_map()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.vars.to_vec()
    }

    /// Human readable dump of the database and environment.
    pub fn debug_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "root: {}", self.jiri_root.display());
        if let Some(path) = self.db.path() {
            let _ = writeln!(out, "profiles database: {}", path.display());
        }
        let _ = writeln!(out, "schema version: {}", self.db.schema_version());
        for profile in self.db.profiles() {
            let name = profile.qualified_name();
            let _ = writeln!(out, "profile: {} ({})", name, profile.root);
            for target in profile.sorted_targets() {
                for line in target.options_string().lines() {
                    let _ = writeln!(out, "  {}", line);
                }
            }
        }
        for entry in self.vars.to_vec() {
            let _ = writeln!(out, "{}", entry);
        }
        out
    }
}
