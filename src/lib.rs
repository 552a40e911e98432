//! # Jiri Profiles Library
//!
//! A *profile* is a named, versioned set of build dependencies (a toolchain,
//! a cross-compilation sysroot, a third-party library) installed once per
//! build *target* and recorded in a profiles database. Commands that build
//! code read the database and compose an environment from the base
//! environment and the environments of the profiles they need.
//!
//! The library is used by the `jiri-profile` command-line tool, and by any
//! binary that links its own profile managers.
//!
//! ## Quick Example
//!
//! ```
//! use jiri_profiles::db::Db;
//! use jiri_profiles::envvar::EnvVars;
//! use jiri_profiles::merge::{merge_env, profile_merge_policies};
//! use jiri_profiles::target::Target;
//!
//! let mut db = Db::new();
//! db.install_profile("", "go", "${JIRI_ROOT}/profiles/go");
//! let mut target = Target::parse("amd64-linux@1.5").unwrap();
//! target.env = vec!["PATH=/opt/go/bin".to_string()];
//! db.add_profile_target("", "go", target).unwrap();
//!
//! let installed = db
//!     .lookup_profile_target("", "go", &Target::parse("amd64-linux").unwrap())
//!     .unwrap();
//! let mut env = EnvVars::from_entries(&["PATH=/usr/bin"]);
//! merge_env(&profile_merge_policies(), &mut env, [&installed.env]);
//! assert_eq!(env.get("PATH"), Some("/usr/bin:/opt/go/bin"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Targets (`target`)**: `arch-os[@version]` build configurations and the
//!   rules for matching them.
//! - **Versions (`version`)**: the versions a manager supports and its default.
//! - **Merge policies (`merge`)**: how each environment variable is combined
//!   across the base environment and profile layers.
//! - **Database (`db`, `profile`)**: installed profiles and targets, persisted
//!   as XML and partitioned per installer.
//! - **Managers (`manager`, `lifecycle`)**: pluggable installers, either
//!   linked in or reached as `jiri-profile-<installer>` binaries, and the
//!   install / uninstall / update / cleanup bookkeeping around them.
//! - **Atomic actions (`atomic`)**: crash-safe population of installation
//!   directories.
//! - **Reader (`reader`)**: environment composition for consumers.

pub mod atomic;
pub mod db;
pub mod defaults;
pub mod envvar;
pub mod error;
pub mod lifecycle;
pub mod manager;
pub mod merge;
pub mod output;
pub mod path;
pub mod profile;
pub mod reader;
pub mod target;
pub mod version;

#[cfg(test)]
mod encoding_proptest;
