//! External installer binaries.
//!
//! An installer may ship its managers in a separate `jiri-profile-<installer>`
//! executable instead of linking them in. Such a binary accepts the same
//! verbs and flags as `jiri-profile` and writes its own installer file of the
//! profiles database. After it exits the caller's in-memory database is
//! reloaded so both views agree.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use super::Action;
use crate::db::Db;
use crate::defaults::SUBCOMMAND_PREFIX;
use crate::error::{Error, Result};
use crate::lifecycle::CleanupMode;
use crate::path::ProfilesRoot;
use crate::profile::qualified_name;
use crate::target::Target;

/// One verb to run in an external installer.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub action: Action,
    /// Profile name without the installer prefix.
    pub profile: &'a str,
    pub target: Option<&'a Target>,
    pub force: bool,
    pub cleanup: Option<CleanupMode>,
}

impl<'a> Invocation<'a> {
    pub fn new(action: Action, profile: &'a str) -> Self {
        Self {
            action,
            profile,
            target: None,
            force: false,
            cleanup: None,
        }
    }
}

/// An installer served by an external binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcommandManager {
    installer: String,
    binary: PathBuf,
}

impl SubcommandManager {
    pub fn new(installer: impl Into<String>, binary: impl Into<PathBuf>) -> Self {
        Self {
            installer: installer.into(),
            binary: binary.into(),
        }
    }

    /// Look for `jiri-profile-<installer>` on `PATH`.
    pub fn find(installer: &str) -> Option<Self> {
        let name = format!("{}{}", SUBCOMMAND_PREFIX, installer);
        match which::which(&name) {
            Ok(binary) => {
                debug!("found profile subcommand {}", binary.display());
                Some(Self::new(installer, binary))
            }
            Err(_) => None,
        }
    }

    /// Installers with a `jiri-profile-<installer>` binary in any directory of
    /// `path_var` (a `PATH`-style list), sorted and deduplicated.
    pub fn discover_installers(path_var: &OsStr) -> Vec<String> {
        let mut installers: Vec<String> = std::env::split_paths(path_var)
            .filter_map(|dir| std::fs::read_dir(dir).ok())
            .flat_map(|entries| entries.filter_map(|e| e.ok()))
            .filter_map(|entry| {
                let file_name = entry.file_name().into_string().ok()?;
                let installer = file_name.strip_prefix(SUBCOMMAND_PREFIX)?;
                let installer = installer.strip_suffix(".exe").unwrap_or(installer);
                if installer.is_empty() || !entry.path().is_file() {
                    return None;
                }
                Some(installer.to_string())
            })
            .collect();
        installers.sort();
        installers.dedup();
        installers
    }

    pub fn installer(&self) -> &str {
        &self.installer
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Command line arguments for `invocation`.
    pub fn args(
        &self,
        db_path: &Path,
        root: &ProfilesRoot,
        invocation: &Invocation<'_>,
    ) -> Vec<String> {
        let mut args = vec![
            invocation.action.verb().to_string(),
            format!("--profiles-db={}", db_path.display()),
            format!("--profiles-dir={}", root.dir().display()),
            format!("--root={}", root.jiri_root().display()),
            format!("--installer={}", self.installer),
        ];
        if let Some(target) = invocation.target {
            args.push(format!("--target={}", target));
            if !target.command_line_env.is_empty() {
                args.push(format!("--env={}", target.command_line_env.join(",")));
            }
        }
        if invocation.force {
            args.push("--force".to_string());
        }
        match invocation.cleanup {
            Some(CleanupMode::Gc) => args.push("--gc".to_string()),
            Some(CleanupMode::RemoveAll) => args.push("--rm-all".to_string()),
            None => {}
        }
        args.push(qualified_name(&self.installer, invocation.profile));
        args
    }

    /// Run `invocation` and reload `db` from disk afterwards.
    pub fn run(
        &self,
        db: &mut Db,
        root: &ProfilesRoot,
        invocation: &Invocation<'_>,
    ) -> Result<()> {
        let db_path = db
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Subcommand {
                command: self.binary.display().to_string(),
                stderr: "the profiles database has no path to hand to the subcommand".to_string(),
            })?;
        let args = self.args(&db_path, root, invocation);
        let command = format!("{} {}", self.binary.display(), args.join(" "));
        info!("running {}", command);

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| Error::Subcommand {
                command: command.clone(),
                stderr: e.to_string(),
            })?;
        print!("{}", String::from_utf8_lossy(&output.stdout));
        if !output.status.success() {
            return Err(Error::Subcommand {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        *db = Db::load(&db_path, true)?;
        Ok(())
    }

    /// Qualified names of the profiles the binary can install.
    pub fn available(&self) -> Result<Vec<String>> {
        let command = format!("{} available", self.binary.display());
        let output = Command::new(&self.binary)
            .arg("available")
            .output()
            .map_err(|e| Error::Subcommand {
                command: command.clone(),
                stderr: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(Error::Subcommand {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_available(&self.installer, &stdout))
    }
}

/// Qualify each non-empty line of `available` output with `installer`.
fn parse_available(installer: &str, stdout: &str) -> Vec<String> {
    let prefix = format!("{}:", installer);
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            if l.starts_with(&prefix) {
                l.to_string()
            } else {
                format!("{}{}", prefix, l)
            }
        })
        .collect()
}
