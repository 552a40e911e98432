//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_db_xml(dbs::GO);
//!     fixture.command().arg("list").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

use jiri_profiles::db::Db;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::dbs;
    pub use super::TestFixture;
}

/// Profiles databases in their on-disk form.
#[allow(dead_code)]
pub mod dbs {
    /// `go` installed for amd64-linux at versions 1.4 and 1.5.
    pub const GO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<profiles version="5">
  <profile name="go" root="${JIRI_ROOT}/.jiri_root/profiles/go">
    <target tag="" arch="amd64" os="linux" version="1.5" installation-directory="${JIRI_ROOT}/.jiri_root/profiles/go/amd64_linux_1.5">
      <envvars><var>PATH=${JIRI_ROOT}/.jiri_root/profiles/go/amd64_linux_1.5/bin</var><var>GOARCH=amd64</var></envvars>
      <command-line-env></command-line-env>
    </target>
    <target tag="" arch="amd64" os="linux" version="1.4" installation-directory="${JIRI_ROOT}/.jiri_root/profiles/go/amd64_linux_1.4">
      <envvars><var>PATH=/old/go/bin</var></envvars>
      <command-line-env><var>CC=gcc</var></command-line-env>
    </target>
  </profile>
  <profile name="nacl" installer="v23" root="${JIRI_ROOT}/.jiri_root/profiles/v23_nacl">
    <target tag="" arch="amd64" os="linux" version="2" installation-directory="">
      <envvars><var>CGO_CFLAGS=-I/nacl/include</var></envvars>
      <command-line-env></command-line-env>
    </target>
  </profile>
</profiles>
"#;

    /// A database written by an older release: no installer attributes and
    /// a schema version before the current one.
    pub const LEGACY: &str = r#"<profiles version="3">
  <profile name="v23:nacl" root="/opt/nacl">
    <target arch="arm" os="android" version="1" installation-directory="/opt/nacl/arm">
      <envvars><var>NACL_ROOT=/opt/nacl/arm</var></envvars>
    </target>
  </profile>
</profiles>
"#;

    /// A database from a newer release than this one.
    pub const FUTURE: &str = r#"<profiles version="99"></profiles>"#;
}

/// A temporary jiri root with an optional profiles database.
///
/// Commands run with `JIRI_ROOT` pointing at the fixture and with `PATH`
/// limited to the fixture's `bin` directory, so the only subcommand
/// managers they find are the ones the test adds.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child(".jiri_root/bin")
            .create_dir_all()
            .expect("Failed to create bin directory");
        Self { temp_dir }
    }

    /// Write `content` as the single-file profiles database.
    pub fn with_db_xml(self, content: &str) -> Self {
        self.temp_dir
            .child(".jiri_root/profile_db")
            .write_str(content)
            .expect("Failed to write profiles database");
        self
    }

    /// Write `db` as the single-file profiles database.
    #[allow(dead_code)]
    pub fn with_db(self, db: &Db) -> Self {
        db.write("", &self.db_path())
            .expect("Failed to write profiles database");
        self
    }

    /// Add an executable `jiri-profile-<installer>` shell script.
    #[cfg(unix)]
    #[allow(dead_code)]
    pub fn with_subcommand(self, installer: &str, script: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let path = self.bin_dir().join(format!("jiri-profile-{}", installer));
        std::fs::write(&path, script).expect("Failed to write subcommand");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make subcommand executable");
        self
    }

    /// The jiri root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn db_path(&self) -> PathBuf {
        self.path().join(".jiri_root/profile_db")
    }

    #[allow(dead_code)]
    pub fn profiles_dir(&self) -> PathBuf {
        self.path().join(".jiri_root/profiles")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.path().join(".jiri_root/bin")
    }

    /// Load the database as the binary left it.
    #[allow(dead_code)]
    pub fn db(&self) -> Db {
        Db::load(&self.db_path(), true).expect("Failed to read profiles database")
    }

    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// A `jiri-profile` command rooted at this fixture.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("jiri-profile");
        cmd.current_dir(self.path())
            .env("JIRI_ROOT", self.path())
            .env("PATH", self.bin_dir())
            .env("NO_COLOR", "1")
            .env_remove("JIRI_PROFILES_DB")
            .env_remove("JIRI_PROFILES_DIR")
            .env_remove("RUST_LOG");
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_bin_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.bin_dir().is_dir());
    }

    #[test]
    fn test_fixture_databases_parse() {
        let fixture = TestFixture::new().with_db_xml(dbs::GO);
        assert_eq!(fixture.db().names(), vec!["go", "v23:nacl"]);
    }
}
