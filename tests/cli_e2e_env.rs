//! End-to-end tests for the `jiri-profile env` command.

#[allow(dead_code)]
mod common;
use common::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_env_prints_profile_variable() {
    let fixture = TestFixture::new().with_db_xml(dbs::GO);
    let expected = format!(
        "PATH={}/.jiri_root/profiles/go/amd64_linux_1.5/bin\n",
        fixture.path().display()
    );
    fixture
        .command()
        .args([
            "env",
            "--no-inherit",
            "--target=amd64-linux",
            "--profiles=go",
            "PATH",
        ])
        .assert()
        .success()
        .stdout(predicate::eq(expected));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_env_merges_every_profile_by_default() {
    let fixture = TestFixture::new().with_db_xml(dbs::GO);
    fixture
        .command()
        .args(["env", "--no-inherit", "--target=amd64-linux"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CGO_CFLAGS=-I/nacl/include"))
        // GOARCH is never taken from profiles under jiri's policies.
        .stdout(predicate::str::contains("GOARCH").not());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_env_merge_policies_override() {
    let fixture = TestFixture::new().with_db_xml(dbs::GO);
    fixture
        .command()
        .args([
            "env",
            "--no-inherit",
            "--target=amd64-linux@1.5",
            "--merge-policies=GOARCH*",
            "GOARCH",
        ])
        .assert()
        .success()
        .stdout(predicate::eq("GOARCH=amd64\n"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_env_specific_version() {
    let fixture = TestFixture::new().with_db_xml(dbs::GO);
    fixture
        .command()
        .args([
            "env",
            "--no-inherit",
            "--target=amd64-linux@1.4",
            "--profiles=go",
            "PATH",
        ])
        .assert()
        .success()
        .stdout(predicate::eq("PATH=/old/go/bin\n"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_env_unknown_profile_fails() {
    let fixture = TestFixture::new().with_db_xml(dbs::GO);
    fixture
        .command()
        .args(["env", "--target=amd64-linux", "--profiles=rust"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile not found: rust"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_env_missing_target_fails() {
    let fixture = TestFixture::new().with_db_xml(dbs::GO);
    fixture
        .command()
        .args(["env", "--target=arm-android", "--profiles=go"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Target arm-android not found"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_env_skip_profiles() {
    let fixture = TestFixture::new().with_db_xml(dbs::GO);
    fixture
        .command()
        .args(["env", "--no-inherit", "--skip-profiles", "--profiles=go"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_env_invalid_merge_policy() {
    let fixture = TestFixture::new();
    fixture
        .command()
        .args(["env", "--merge-policies=^-HOME"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --merge-policies"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_env_malformed_target() {
    let fixture = TestFixture::new();
    fixture
        .command()
        .args(["env", "--target=linux"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed target"));
}
