//! # Profile Managers
//!
//! A [`Manager`] knows how to install and uninstall one profile. The engine
//! never looks inside a manager beyond this trait; what installing means
//! (downloading a toolchain, building a library) is entirely up to it.
//!
//! Managers are reached through a [`Registry`] built once at start-up and
//! passed to the commands that need it. A registry holds two kinds of
//! manager, unified behind [`ManagerHandle`]:
//!
//! - **In-process** managers implementing [`Manager`] directly.
//! - **Subcommand** managers: external `jiri-profile-<installer>` binaries
//!   that handle every profile of their installer. The engine re-serializes
//!   the relevant flags and runs the binary (see [`subcommand`]).
//!
//! In-process managers take precedence over a subcommand for the same
//! installer.

pub mod subcommand;

use std::collections::BTreeMap;
use std::fmt;

use clap::{ArgMatches, Command};

use crate::db::Db;
use crate::error::Result;
use crate::lifecycle::{self, CleanupMode};
use crate::path::ProfilesRoot;
use crate::profile::{qualified_name, split_qualified_name};
use crate::target::Target;
use crate::version::VersionInfo;

pub use subcommand::{Invocation, SubcommandManager};

/// The profile verb a set of flags is being added for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Install,
    Uninstall,
    Update,
    Cleanup,
}

impl Action {
    /// The CLI verb for this action.
    pub fn verb(self) -> &'static str {
        match self {
            Action::Install => "install",
            Action::Uninstall => "uninstall",
            Action::Update => "update",
            Action::Cleanup => "cleanup",
        }
    }

    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "install" => Some(Action::Install),
            "uninstall" => Some(Action::Uninstall),
            "update" => Some(Action::Update),
            "cleanup" => Some(Action::Cleanup),
            _ => None,
        }
    }

    pub const ALL: [Action; 4] = [
        Action::Install,
        Action::Uninstall,
        Action::Update,
        Action::Cleanup,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Capability contract implemented by every in-process profile manager.
pub trait Manager {
    /// Profile name, without installer.
    fn name(&self) -> &str;

    /// Installer namespace; empty for unqualified profiles.
    fn installer(&self) -> &str {
        ""
    }

    /// `installer:name`, or `name` without an installer.
    fn qualified_name(&self) -> String {
        qualified_name(self.installer(), self.name())
    }

    /// One-paragraph description shown by `list --info`.
    fn info(&self) -> String {
        String::new()
    }

    fn version_info(&self) -> &VersionInfo;

    /// Add manager specific flags to the CLI subcommand for `action`.
    fn add_flags(&self, command: Command, _action: Action) -> Command {
        command
    }

    /// Pick up the values of the flags added by [`add_flags`](Manager::add_flags).
    fn apply_flags(&mut self, _matches: &ArgMatches, _action: Action) -> Result<()> {
        Ok(())
    }

    /// Install `target`, whose version has already been selected.
    ///
    /// Implementations normally do their work inside
    /// [`crate::atomic::atomic_action`] and record the result with
    /// [`Db::add_profile_target`].
    fn install(&self, db: &mut Db, root: &ProfilesRoot, target: &Target) -> Result<()>;

    /// Remove the installation of `target`.
    fn uninstall(&self, db: &mut Db, root: &ProfilesRoot, target: &Target) -> Result<()>;
}

/// Registered managers, keyed by qualified name.
#[derive(Default)]
pub struct Registry {
    managers: BTreeMap<String, Box<dyn Manager>>,
    subcommands: BTreeMap<String, SubcommandManager>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("managers", &self.managers.keys().collect::<Vec<_>>())
            .field("subcommands", &self.subcommands.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-process manager.
    ///
    /// # Panics
    ///
    /// Panics if a manager is already registered under the same qualified
    /// name; registration happens at start-up and a clash is a programming
    /// error.
    pub fn register(&mut self, manager: Box<dyn Manager>) {
        let name = manager.qualified_name();
        if self.managers.contains_key(&name) {
            panic!("a profile manager is already registered for {:?}", name);
        }
        self.managers.insert(name, manager);
    }

    /// Register an external installer binary.
    ///
    /// # Panics
    ///
    /// Panics if the installer already has a subcommand registered.
    pub fn register_subcommand(&mut self, subcommand: SubcommandManager) {
        let installer = subcommand.installer().to_string();
        if self.subcommands.contains_key(&installer) {
            panic!(
                "a profile subcommand is already registered for installer {:?}",
                installer
            );
        }
        self.subcommands.insert(installer, subcommand);
    }

    /// Register the `jiri-profile-<installer>` binary found on `PATH`, if
    /// any and not already registered. Returns whether one is available.
    pub fn discover_subcommand(&mut self, installer: &str) -> bool {
        if installer.is_empty() {
            return false;
        }
        if self.subcommands.contains_key(installer) {
            return true;
        }
        match SubcommandManager::find(installer) {
            Some(subcommand) => {
                self.subcommands.insert(installer.to_string(), subcommand);
                true
            }
            None => false,
        }
    }

    /// The manager for a qualified profile name.
    pub fn lookup(&self, qualified: &str) -> Option<ManagerHandle<'_>> {
        if let Some(manager) = self.managers.get(qualified) {
            return Some(ManagerHandle::InProcess(manager.as_ref()));
        }
        let (installer, name) = split_qualified_name(qualified);
        self.subcommands
            .get(installer)
            .map(|subcommand| ManagerHandle::Subcommand {
                subcommand,
                profile: name.to_string(),
            })
    }

    /// Mutable access to an in-process manager, used to apply CLI flags.
    pub fn lookup_manager_mut(&mut self, qualified: &str) -> Option<&mut (dyn Manager + 'static)> {
        self.managers.get_mut(qualified).map(|m| m.as_mut())
    }

    pub fn has(&self, qualified: &str) -> bool {
        self.lookup(qualified).is_some()
    }

    /// Qualified names of the in-process managers, sorted.
    pub fn names(&self) -> Vec<String> {
        self.managers.keys().cloned().collect()
    }

    /// Installers served by subcommands, sorted.
    pub fn subcommand_installers(&self) -> Vec<String> {
        self.subcommands.keys().cloned().collect()
    }

    pub fn managers(&self) -> Vec<&dyn Manager> {
        self.managers
            .values()
            .map(|m| m.as_ref() as &dyn Manager)
            .collect()
    }

    pub fn subcommands(&self) -> impl Iterator<Item = &SubcommandManager> {
        self.subcommands.values()
    }
}

/// A registered manager of either kind.
pub enum ManagerHandle<'a> {
    InProcess(&'a dyn Manager),
    Subcommand {
        subcommand: &'a SubcommandManager,
        profile: String,
    },
}

impl fmt::Debug for ManagerHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerHandle::InProcess(m) => write!(f, "InProcess({})", m.qualified_name()),
            ManagerHandle::Subcommand { subcommand, profile } => {
                write!(
                    f,
                    "Subcommand({}, {})",
                    subcommand.binary().display(),
                    profile
                )
            }
        }
    }
}

impl ManagerHandle<'_> {
    pub fn installer(&self) -> &str {
        match self {
            ManagerHandle::InProcess(m) => m.installer(),
            ManagerHandle::Subcommand { subcommand, .. } => subcommand.installer(),
        }
    }

    /// True if the database changes made by this manager are left to the
    /// caller to write.
    pub fn is_in_process(&self) -> bool {
        matches!(self, ManagerHandle::InProcess(_))
    }

    pub fn qualified_name(&self) -> String {
        match self {
            ManagerHandle::InProcess(m) => m.qualified_name(),
            ManagerHandle::Subcommand { subcommand, profile } => {
                qualified_name(subcommand.installer(), profile)
            }
        }
    }

    /// Install `target`; an identical existing install is kept unless `force`.
    pub fn install(
        &self,
        db: &mut Db,
        root: &ProfilesRoot,
        target: &Target,
        force: bool,
    ) -> Result<()> {
        match self {
            ManagerHandle::InProcess(m) => {
                lifecycle::install(*m, db, root, target, force).map(|_| ())
            }
            ManagerHandle::Subcommand { subcommand, profile } => {
                let invocation = Invocation {
                    target: Some(target),
                    force,
                    ..Invocation::new(Action::Install, profile)
                };
                subcommand.run(db, root, &invocation)
            }
        }
    }

    pub fn uninstall(&self, db: &mut Db, root: &ProfilesRoot, target: &Target) -> Result<()> {
        match self {
            ManagerHandle::InProcess(m) => lifecycle::uninstall(*m, db, root, target).map(|_| ()),
            ManagerHandle::Subcommand { subcommand, profile } => {
                let invocation = Invocation {
                    target: Some(target),
                    ..Invocation::new(Action::Uninstall, profile)
                };
                subcommand.run(db, root, &invocation)
            }
        }
    }

    pub fn update(&self, db: &mut Db, root: &ProfilesRoot) -> Result<()> {
        match self {
            ManagerHandle::InProcess(m) => lifecycle::update(*m, db, root).map(|_| ()),
            ManagerHandle::Subcommand { subcommand, profile } => {
                subcommand.run(db, root, &Invocation::new(Action::Update, profile))
            }
        }
    }

    pub fn cleanup(&self, db: &mut Db, root: &ProfilesRoot, mode: CleanupMode) -> Result<()> {
        match self {
            ManagerHandle::InProcess(m) => lifecycle::cleanup(*m, db, root, mode).map(|_| ()),
            ManagerHandle::Subcommand { subcommand, profile } => {
                let invocation = Invocation {
                    cleanup: Some(mode),
                    ..Invocation::new(Action::Cleanup, profile)
                };
                subcommand.run(db, root, &invocation)
            }
        }
    }
}
