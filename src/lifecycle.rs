//! Install, uninstall, update and cleanup of in-process managers.
//!
//! The functions here wrap a [`Manager`] with the bookkeeping every manager
//! shares: version selection, skipping targets that are already installed
//! and keeping the profiles database consistent with what was done.
//!
//! Per (profile, target) the states are absent, up-to-date and out-of-date.
//! `install` moves absent to up-to-date, a newer default version makes an
//! installed target out-of-date, `update` installs the default version next
//! to it, and `cleanup` in [`CleanupMode::Gc`] removes the old one.

use std::fs;

use log::{debug, info, warn};

use crate::db::Db;
use crate::error::{Error, Result};
use crate::manager::Manager;
use crate::path::{encode_dirname, ProfilesRoot};
use crate::target::{self, Target};

/// What `cleanup` removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    /// Uninstall targets older than the default version.
    Gc,
    /// Uninstall every target and drop the profile and its directory.
    RemoveAll,
}

/// Result of [`install`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(Target),
    AlreadyInstalled(Target),
}

impl InstallOutcome {
    pub fn target(&self) -> &Target {
        match self {
            InstallOutcome::Installed(t) | InstallOutcome::AlreadyInstalled(t) => t,
        }
    }
}

/// Install `target` with `mgr`.
///
/// An empty target version selects the manager's default. Unless `force` is
/// set, an already installed (arch, os, version) is left alone.
pub fn install(
    mgr: &dyn Manager,
    db: &mut Db,
    root: &ProfilesRoot,
    target: &Target,
    force: bool,
) -> Result<InstallOutcome> {
    let installer = mgr.installer();
    let name = mgr.name();
    let mut requested = target.clone();
    requested.version = mgr.version_info().select(&target.version)?;

    if !force {
        if let Some(existing) = db.lookup_profile_target(installer, name, &requested) {
            info!(
                "{} {} is already installed",
                mgr.qualified_name(),
                requested
            );
            return Ok(InstallOutcome::AlreadyInstalled(existing.clone()));
        }
    }

    let profile_root = root.relative(&root.join(encode_dirname(&mgr.qualified_name())));
    let created = db.lookup_profile(installer, name).is_none();
    db.install_profile(installer, name, &profile_root);
    info!("installing {} {}", mgr.qualified_name(), requested);
    if let Err(err) = mgr.install(db, root, &requested) {
        let empty = db
            .lookup_profile(installer, name)
            .is_some_and(|p| !p.has_targets());
        if created && empty {
            db.remove_profile(installer, name);
        }
        return Err(err);
    }

    let recorded = match db.lookup_profile_target(installer, name, &requested) {
        Some(t) => t.clone(),
        None => {
            debug!(
                "{} did not record {}, recording it",
                mgr.qualified_name(),
                requested
            );
            db.add_profile_target(installer, name, requested.clone())?;
            requested
        }
    };
    Ok(InstallOutcome::Installed(recorded))
}

/// Uninstall `target`. An empty version uninstalls every installed version
/// of its (arch, os). Returns the targets removed.
pub fn uninstall(
    mgr: &dyn Manager,
    db: &mut Db,
    root: &ProfilesRoot,
    target: &Target,
) -> Result<Vec<Target>> {
    let installer = mgr.installer();
    let name = mgr.name();
    let profile = db
        .lookup_profile(installer, name)
        .ok_or_else(|| Error::ProfileNotFound {
            name: mgr.qualified_name(),
        })?;
    let victims: Vec<Target> = profile
        .targets()
        .iter()
        .filter(|t| {
            target::matches(t, target)
                && (target.version.is_empty() || t.version == target.version)
        })
        .cloned()
        .collect();
    if victims.is_empty() {
        return Err(Error::TargetNotFound {
            profile: mgr.qualified_name(),
            target: target.to_string(),
        });
    }
    for victim in &victims {
        remove_target(mgr, db, root, victim)?;
    }
    Ok(victims)
}

/// Install the default version next to every out-of-date target.
///
/// Old versions stay installed; see [`cleanup`]. Returns the targets that
/// were newly installed.
pub fn update(mgr: &dyn Manager, db: &mut Db, root: &ProfilesRoot) -> Result<Vec<Target>> {
    let versions = mgr.version_info();
    let out_of_date: Vec<Target> = match db.lookup_profile(mgr.installer(), mgr.name()) {
        Some(profile) => profile
            .sorted_targets()
            .into_iter()
            .filter(|t| versions.is_target_older_than_default(&t.version))
            .collect(),
        None => {
            debug!(
                "{} is not installed, nothing to update",
                mgr.qualified_name()
            );
            return Ok(Vec::new());
        }
    };

    let mut installed = Vec::new();
    for old in out_of_date {
        let next = Target {
            version: versions.default_version().to_string(),
            env: Vec::new(),
            installation_dir: String::new(),
            ..old
        };
        if let InstallOutcome::Installed(t) = install(mgr, db, root, &next, false)? {
            installed.push(t);
        }
    }
    if installed.is_empty() {
        info!("{} is up to date", mgr.qualified_name());
    }
    Ok(installed)
}

/// Remove installations according to `mode`. Returns the targets removed.
pub fn cleanup(
    mgr: &dyn Manager,
    db: &mut Db,
    root: &ProfilesRoot,
    mode: CleanupMode,
) -> Result<Vec<Target>> {
    let versions = mgr.version_info();
    let Some(profile) = db.lookup_profile(mgr.installer(), mgr.name()) else {
        debug!(
            "{} is not installed, nothing to clean up",
            mgr.qualified_name()
        );
        return Ok(Vec::new());
    };
    let profile_dir = root.expand(&profile.root);
    let victims: Vec<Target> = profile
        .sorted_targets()
        .into_iter()
        .filter(|t| {
            mode == CleanupMode::RemoveAll || versions.is_target_older_than_default(&t.version)
        })
        .collect();

    for victim in &victims {
        remove_target(mgr, db, root, victim)?;
    }

    if mode == CleanupMode::RemoveAll {
        db.remove_profile(mgr.installer(), mgr.name());
        if profile_dir.starts_with(root.dir()) && profile_dir.is_dir() {
            info!("removing {}", profile_dir.display());
            fs::remove_dir_all(&profile_dir)?;
        } else if profile_dir.exists() {
            warn!(
                "not removing {}: it is outside {}",
                profile_dir.display(),
                root.dir().display()
            );
        }
    }
    Ok(victims)
}

/// Remove the whole profiles directory. Returns false if it did not exist.
pub fn remove_profiles_dir(root: &ProfilesRoot) -> Result<bool> {
    let dir = root.dir();
    if !dir.is_dir() {
        return Ok(false);
    }
    info!("removing {}", dir.display());
    fs::remove_dir_all(dir)?;
    Ok(true)
}

fn remove_target(
    mgr: &dyn Manager,
    db: &mut Db,
    root: &ProfilesRoot,
    target: &Target,
) -> Result<()> {
    info!("uninstalling {} {}", mgr.qualified_name(), target);
    mgr.uninstall(db, root, target)?;
    db.remove_profile_target(mgr.installer(), mgr.name(), target);
    Ok(())
}
