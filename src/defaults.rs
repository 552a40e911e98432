//! Default locations for the profiles database and installation tree.
//!
//! Both live under `<root>/.jiri_root`, where root is `$JIRI_ROOT` or the
//! current directory. The `--profiles-db` and `--profiles-dir` CLI flags (or
//! the `JIRI_PROFILES_DB` / `JIRI_PROFILES_DIR` environment variables)
//! override them.

use std::path::{Path, PathBuf};

/// Directory inside the jiri root holding jiri's own state.
pub const ROOT_META_DIR: &str = ".jiri_root";

/// Name of the completion marker written by [`crate::atomic::atomic_action`].
pub const COMPLETION_MARKER: &str = ".complete";

/// Prefix of external installer binaries (`jiri-profile-<installer>`).
pub const SUBCOMMAND_PREFIX: &str = "jiri-profile-";

/// Returns the jiri root: the given value, or the current directory.
pub fn default_root(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Default profiles database location: `<root>/.jiri_root/profile_db`.
pub fn default_db_path(root: &Path) -> PathBuf {
    root.join(ROOT_META_DIR).join("profile_db")
}

/// Default profiles installation directory: `<root>/.jiri_root/profiles`.
pub fn default_profiles_dir(root: &Path) -> PathBuf {
    root.join(ROOT_META_DIR).join("profiles")
}
