//! Integration tests for the install / update / cleanup lifecycle.
//!
//! These drive a manager that really populates installation directories
//! through `atomic_action`, persist the database between steps the way the
//! CLI does, and read the result back through a `Reader`.

use std::cell::Cell;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use jiri_profiles::atomic::{atomic_action, is_action_complete};
use jiri_profiles::db::Db;
use jiri_profiles::envvar::EnvVars;
use jiri_profiles::error::{Error, Result};
use jiri_profiles::lifecycle::{self, CleanupMode, InstallOutcome};
use jiri_profiles::manager::{Manager, Registry};
use jiri_profiles::merge::jiri_merge_policies;
use jiri_profiles::path::ProfilesRoot;
use jiri_profiles::reader::{ProfilesMode, Reader};
use jiri_profiles::target::Target;
use jiri_profiles::version::VersionInfo;

/// Installs a fake toolchain: a `bin` directory with a version file.
struct Toolchain {
    versions: VersionInfo,
    fail_next: Cell<bool>,
}

impl Toolchain {
    fn new() -> Self {
        Self {
            versions: VersionInfo::new("go", ["1", "2", "3"], "3"),
            fail_next: Cell::new(false),
        }
    }
}

impl Manager for Toolchain {
    fn name(&self) -> &str {
        "go"
    }

    fn info(&self) -> String {
        "A fake Go toolchain.".to_string()
    }

    fn version_info(&self) -> &VersionInfo {
        &self.versions
    }

    fn install(&self, db: &mut Db, root: &ProfilesRoot, target: &Target) -> Result<()> {
        let dir = root.join("go").join(target.target_specific_dirname());
        let fail = self.fail_next.replace(false);
        atomic_action(
            || {
                fs::create_dir_all(dir.join("bin"))?;
                fs::write(dir.join("bin").join("VERSION"), &target.version)?;
                if fail {
                    return Err(Error::Install {
                        action: "install".to_string(),
                        profile: "go".to_string(),
                        target: target.to_string(),
                        message: "download interrupted".to_string(),
                    });
                }
                Ok(())
            },
            &dir,
            &format!("installing go {}", target),
        )?;

        let mut installed = target.clone();
        installed.installation_dir = root.relative(&dir);
        installed.env = vec![
            format!("GOROOT={}", installed.installation_dir),
            format!("PATH={}/bin", installed.installation_dir),
        ];
        db.add_profile_target("", "go", installed)
    }

    fn uninstall(&self, db: &mut Db, root: &ProfilesRoot, target: &Target) -> Result<()> {
        let dir = root.join("go").join(target.target_specific_dirname());
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        db.remove_profile_target("", "go", target);
        Ok(())
    }
}

struct Workspace {
    _temp: TempDir,
    root: ProfilesRoot,
    db_path: std::path::PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = ProfilesRoot::new(temp.path(), temp.path().join(".jiri_root/profiles"));
        let db_path = temp.path().join(".jiri_root/profile_db");
        Self {
            _temp: temp,
            root,
            db_path,
        }
    }

    fn load(&self) -> Db {
        Db::load(&self.db_path, true).unwrap()
    }

    fn save(&self, db: &Db) {
        db.write("", &self.db_path).unwrap();
    }

    fn install_dir(&self, version: &str) -> std::path::PathBuf {
        self.root
            .join("go")
            .join(format!("amd64_linux_{}", version))
    }
}

fn installed_versions(db: &Db) -> Vec<String> {
    db.lookup_profile("", "go")
        .map(|p| {
            p.sorted_targets().into_iter().map(|t| t.version).collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_install_update_gc_across_runs() {
    let ws = Workspace::new();
    let mgr = Toolchain::new();

    let mut db = ws.load();
    let target = Target::parse("amd64-linux@2").unwrap();
    lifecycle::install(&mgr, &mut db, &ws.root, &target, false).unwrap();
    ws.save(&db);
    assert!(is_action_complete(&ws.install_dir("2")));

    let mut db = ws.load();
    let updated = lifecycle::update(&mgr, &mut db, &ws.root).unwrap();
    assert_eq!(updated.len(), 1);
    ws.save(&db);
    assert_eq!(installed_versions(&ws.load()), vec!["3", "2"]);
    assert!(ws.install_dir("3").join("bin/VERSION").exists());

    let mut db = ws.load();
    lifecycle::cleanup(&mgr, &mut db, &ws.root, CleanupMode::Gc).unwrap();
    ws.save(&db);
    assert_eq!(installed_versions(&ws.load()), vec!["3"]);
    assert!(!ws.install_dir("2").exists());
}

#[test]
fn test_failed_install_leaves_no_trace() {
    let ws = Workspace::new();
    let mgr = Toolchain::new();
    mgr.fail_next.set(true);

    let mut db = ws.load();
    let target = Target::parse("amd64-linux@1").unwrap();
    let err = lifecycle::install(&mgr, &mut db, &ws.root, &target, false).unwrap_err();
    assert!(matches!(err, Error::Install { .. }));
    assert!(!ws.install_dir("1").exists());
    assert!(db.lookup_profile_target("", "go", &target).is_none());

    let outcome = lifecycle::install(&mgr, &mut db, &ws.root, &target, false).unwrap();
    assert!(matches!(outcome, InstallOutcome::Installed(_)));
    assert!(is_action_complete(&ws.install_dir("1")));
}

#[test]
fn test_reader_sees_installed_environment() {
    let ws = Workspace::new();
    let mgr = Toolchain::new();
    let mut db = ws.load();
    let target = Target::parse("amd64-linux").unwrap();
    lifecycle::install(&mgr, &mut db, &ws.root, &target, false).unwrap();
    ws.save(&db);

    let base = EnvVars::from_entries(&["PATH=/usr/bin", "GOROOT=/usr/lib/go"]);
    let mut reader = Reader::new(ProfilesMode::UseProfiles, &ws.db_path, ws.root.jiri_root())
        .unwrap()
        .with_base(base);
    reader
        .validate_requested_profiles_and_target(&["go".to_string()], &target)
        .unwrap();
    reader.merge_env_from_profiles(&jiri_merge_policies(), &target, &["go".to_string()]);

    let install = ws.install_dir("3");
    assert_eq!(
        reader.get("PATH"),
        Some(format!("/usr/bin:{}/bin", install.display()).as_str())
    );
    // GOROOT has no policy, so the base value wins.
    assert_eq!(reader.get("GOROOT"), Some("/usr/lib/go"));
}

#[test]
fn test_registry_dispatches_to_lifecycle() {
    let ws = Workspace::new();
    let mut registry = Registry::new();
    registry.register(Box::new(Toolchain::new()));

    let mut db = ws.load();
    let handle = registry.lookup("go").unwrap();
    let target = Target::parse("amd64-linux@1").unwrap();
    handle.install(&mut db, &ws.root, &target, false).unwrap();
    handle.update(&mut db, &ws.root).unwrap();
    assert_eq!(installed_versions(&db), vec!["3", "1"]);

    handle
        .cleanup(&mut db, &ws.root, CleanupMode::RemoveAll)
        .unwrap();
    assert!(db.lookup_profile("", "go").is_none());
    assert!(!ws.root.join("go").exists());
}

#[test]
fn test_profiles_survive_a_moved_root() {
    let ws = Workspace::new();
    let mgr = Toolchain::new();
    let mut db = ws.load();
    let target = Target::parse("amd64-linux").unwrap();
    lifecycle::install(&mgr, &mut db, &ws.root, &target, false).unwrap();
    ws.save(&db);

    let reader = Reader::new(ProfilesMode::UseProfiles, &ws.db_path, Path::new("/moved"))
        .unwrap()
        .with_base(EnvVars::new());
    let env = reader.env_from_profile(&target, "go");
    let goroot = "GOROOT=/moved/.jiri_root/profiles/go/amd64_linux_3".to_string();
    assert!(env.contains(&goroot));
}
