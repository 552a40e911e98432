//! Crash-safe installation steps.
//!
//! [`atomic_action`] wraps a step that populates a directory. A `.complete`
//! marker written as the very last step records success, so after a crash a
//! rerun either finds a finished directory and skips the step, or finds a
//! partial one and starts over from an empty slate. Granularity is the whole
//! directory. Two processes racing on the same directory are not serialized.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::defaults::COMPLETION_MARKER;
use crate::error::Result;

/// Path of the completion marker inside `dir`.
pub fn marker_path(dir: &Path) -> PathBuf {
    dir.join(COMPLETION_MARKER)
}

/// True if `dir` holds the output of a completed action.
pub fn is_action_complete(dir: &Path) -> bool {
    dir.is_dir() && marker_path(dir).is_file()
}

/// Run `install_fn` so that `dir` is either fully populated or absent.
///
/// - `dir` complete: `install_fn` is not called and `Ok` is returned.
/// - `dir` present but incomplete: it is removed before `install_fn` runs.
/// - `install_fn` fails: `dir` is removed and the error is returned.
/// - `install_fn` succeeds: the marker is written.
///
/// An empty `dir` runs `install_fn` without any bookkeeping.
pub fn atomic_action<F>(install_fn: F, dir: &Path, message: &str) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    if dir.as_os_str().is_empty() {
        info!("{}", message);
        return install_fn();
    }

    if is_action_complete(dir) {
        debug!(
            "skipping {}: {} is already complete",
            message,
            dir.display()
        );
        return Ok(());
    }
    if dir.exists() {
        warn!(
            "removing partial result of a previous attempt in {}",
            dir.display()
        );
        remove(dir)?;
    }

    info!("{}", message);
    if let Err(err) = install_fn() {
        if dir.exists() {
            if let Err(cleanup) = remove(dir) {
                warn!(
                    "failed to remove {} after error: {}",
                    dir.display(),
                    cleanup
                );
            }
        }
        return Err(err);
    }

    fs::create_dir_all(dir)?;
    fs::write(marker_path(dir), b"completed successfully\n")?;
    Ok(())
}

fn remove(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        fs::remove_dir_all(dir)?;
    } else {
        fs::remove_file(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn failing() -> Result<()> {
        Err(Error::Install {
            action: "install".to_string(),
            profile: "test".to_string(),
            target: "amd64-linux".to_string(),
            message: "boom".to_string(),
        })
    }

    #[test]
    fn test_success_writes_marker() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("out");
        atomic_action(
            || {
                fs::create_dir_all(&dir)?;
                fs::write(dir.join("lib.a"), "x")?;
                Ok(())
            },
            &dir,
            "building lib",
        )
        .unwrap();
        assert!(is_action_complete(&dir));
        assert!(dir.join("lib.a").exists());
    }

    #[test]
    fn test_completed_action_is_skipped() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("out");
        atomic_action(|| Ok(()), &dir, "first").unwrap();

        let calls = Cell::new(0);
        atomic_action(
            || {
                calls.set(calls.get() + 1);
                failing()
            },
            &dir,
            "second",
        )
        .unwrap();
        assert_eq!(calls.get(), 0);
        assert!(is_action_complete(&dir));
    }

    #[test]
    fn test_failure_removes_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("out");
        let result = atomic_action(
            || {
                fs::create_dir_all(&dir)?;
                fs::write(dir.join("half-written"), "x")?;
                failing()
            },
            &dir,
            "building",
        );
        assert!(matches!(result, Err(Error::Install { .. })));
        assert!(!dir.exists());
    }

    #[test]
    fn test_partial_directory_is_cleared_before_retry() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("out");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stale"), "x").unwrap();

        let saw_stale = Cell::new(true);
        atomic_action(
            || {
                saw_stale.set(dir.join("stale").exists());
                Ok(())
            },
            &dir,
            "retry",
        )
        .unwrap();
        assert!(!saw_stale.get());
        assert!(is_action_complete(&dir));
    }

    #[test]
    fn test_second_failing_run_starts_clean() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("out");
        let _ = atomic_action(
            || {
                fs::create_dir_all(&dir)?;
                fs::write(dir.join("partial"), "x")?;
                failing()
            },
            &dir,
            "first",
        );
        assert!(!dir.exists());

        let started_clean = Cell::new(false);
        let result = atomic_action(
            || {
                started_clean.set(!dir.exists());
                failing()
            },
            &dir,
            "second",
        );
        assert!(result.is_err());
        assert!(started_clean.get());
        assert!(!dir.exists());
    }

    #[test]
    fn test_empty_dir_just_runs() {
        let calls = Cell::new(0);
        atomic_action(
            || {
                calls.set(calls.get() + 1);
                Ok(())
            },
            Path::new(""),
            "no directory",
        )
        .unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_logs_action_message() {
        testing_logger::setup();
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("out");
        atomic_action(|| Ok(()), &dir, "installing go 1.5").unwrap();
        testing_logger::validate(|captured| {
            let info: Vec<&str> = captured
                .iter()
                .filter(|l| l.level == log::Level::Info)
                .map(|l| l.body.as_str())
                .collect();
            assert!(info.contains(&"installing go 1.5"));
        });
    }
}
