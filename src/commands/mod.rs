//! # CLI Command Implementations
//!
//! Each subcommand of `jiri-profile` lives in its own file with an `Args`
//! struct derived using `clap` and an `execute` function. The commands share
//! a [`Context`] built from the global flags.

pub mod available;
pub mod cleanup;
pub mod completions;
pub mod env;
pub mod install;
pub mod list;
pub mod uninstall;
pub mod update;

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use jiri_profiles::db::Db;
use jiri_profiles::envvar::parse_env_flag;
use jiri_profiles::error::Error;
use jiri_profiles::manager::{ManagerHandle, Registry};
use jiri_profiles::output::OutputConfig;
use jiri_profiles::path::ProfilesRoot;
use jiri_profiles::profile::split_qualified_name;
use jiri_profiles::target::Target;

/// Settings and managers shared by every command.
pub struct Context {
    pub root: ProfilesRoot,
    pub db_path: PathBuf,
    /// Restricts commands that act on every profile to this installer.
    pub installer: String,
    pub output: OutputConfig,
    pub registry: Registry,
}

impl Context {
    pub fn load_db(&self) -> Result<Db> {
        Db::load(&self.db_path, true).with_context(|| {
            format!(
                "failed to read profiles database {}",
                self.db_path.display()
            )
        })
    }

    pub fn handle(&self, name: &str) -> Result<ManagerHandle<'_>> {
        let name = name.to_string();
        self.registry
            .lookup(&name)
            .ok_or_else(|| Error::ManagerNotFound { name }.into())
    }

    /// Write the database files of `installers`.
    pub fn write_db(&self, db: &Db, installers: &BTreeSet<String>) -> Result<()> {
        for installer in installers {
            db.write(installer, &self.db_path).with_context(|| {
                format!(
                    "failed to write profiles database {}",
                    self.db_path.display()
                )
            })?;
        }
        Ok(())
    }

    /// `names` if any were given, otherwise every installed profile of the
    /// selected installer that has a manager.
    pub fn selected_profiles(&self, db: &Db, names: &[String]) -> Vec<String> {
        if !names.is_empty() {
            return names.to_vec();
        }
        db.names()
            .into_iter()
            .filter(|n| {
                self.installer.is_empty() || split_qualified_name(n).0 == self.installer
            })
            .filter(|n| self.registry.has(n))
            .collect()
    }

    /// Run `f` for each of `names` and then write what the in-process
    /// managers changed, also when `f` failed part way.
    pub fn for_each_profile<F>(&self, db: &mut Db, names: &[String], mut f: F) -> Result<()>
    where
        F: FnMut(&ManagerHandle<'_>, &mut Db, &str) -> Result<()>,
    {
        let mut touched = BTreeSet::new();
        let mut result = Ok(());
        for name in names {
            let handle = match self.handle(name) {
                Ok(handle) => handle,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            };
            if handle.is_in_process() {
                touched.insert(handle.installer().to_string());
            }
            if let Err(e) = f(&handle, db, name) {
                result = Err(e);
                break;
            }
        }
        self.write_db(db, &touched)?;
        result
    }
}

/// Installed targets of `name`, most recent first.
pub fn targets_of(db: &Db, name: &str) -> Vec<Target> {
    db.lookup_qualified(name)
        .map(|p| p.sorted_targets())
        .unwrap_or_default()
}

/// The `--target` and `--env` flags.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Build target as <arch>-<os>[@<version>]; defaults to the host
    #[arg(long, value_name = "TARGET")]
    pub target: Option<String>,

    /// Environment for the target as KEY=VALUE[,KEY=VALUE...]; may be repeated
    #[arg(long, value_name = "VARS")]
    pub env: Vec<String>,
}

impl TargetArgs {
    pub fn to_target(&self) -> Result<Target> {
        let mut target = match &self.target {
            Some(s) => Target::parse(s)?,
            None => Target::host(),
        };
        for flag in &self.env {
            target.command_line_env.extend(parse_env_flag(flag)?);
        }
        Ok(target)
    }
}
