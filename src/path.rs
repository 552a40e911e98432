//! `${JIRI_ROOT}` relative paths.
//!
//! Installation directories and profile-supplied environment values are
//! recorded relative to the jiri root so a checkout can move without
//! invalidating its profiles database.

use std::path::{Path, PathBuf};

/// Name of the environment variable holding the jiri root.
pub const ROOT_ENV: &str = "JIRI_ROOT";

/// Placeholder stored in the database in place of the jiri root.
pub const ROOT_PLACEHOLDER: &str = "${JIRI_ROOT}";

/// Replace every `${JIRI_ROOT}` in `value` with `root`.
pub fn expand_root(value: &str, root: &Path) -> String {
    if !value.contains(ROOT_PLACEHOLDER) {
        return value.to_string();
    }
    value.replace(ROOT_PLACEHOLDER, &root.to_string_lossy())
}

/// Expand `${JIRI_ROOT}` in the value half of each `KEY=VALUE` entry.
pub fn expand_root_in_env(entries: &[String], root: &Path) -> Vec<String> {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => format!("{}={}", key, expand_root(value, root)),
            None => entry.clone(),
        })
        .collect()
}

/// Rewrite `path` relative to `root` using the placeholder.
///
/// Paths outside `root` are returned unchanged.
pub fn relative_to_root(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rest) if rest.as_os_str().is_empty() => ROOT_PLACEHOLDER.to_string(),
        Ok(rest) => format!("{}/{}", ROOT_PLACEHOLDER, rest.to_string_lossy()),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

/// Resolve a stored (possibly placeholder-relative) path to a real path.
pub fn resolve(stored: &str, root: &Path) -> PathBuf {
    PathBuf::from(expand_root(stored, root))
}

/// Where profiles are installed, together with the jiri root it hangs off.
///
/// Managers receive this so they can place installations under [`dir`](Self::dir)
/// and record them in the database in `${JIRI_ROOT}` relative form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilesRoot {
    jiri_root: PathBuf,
    dir: PathBuf,
}

impl ProfilesRoot {
    pub fn new(jiri_root: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        Self {
            jiri_root: jiri_root.into(),
            dir: dir.into(),
        }
    }

    pub fn jiri_root(&self) -> &Path {
        &self.jiri_root
    }

    /// Absolute directory profiles are installed into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `dir/<name>` as an absolute path.
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.join(name)
    }

    /// `path` in the form stored in the database.
    pub fn relative(&self, path: &Path) -> String {
        relative_to_root(path, &self.jiri_root)
    }

    /// Expand a stored path back into an absolute one.
    pub fn expand(&self, stored: &str) -> PathBuf {
        resolve(stored, &self.jiri_root)
    }
}

/// Make a directory name safe for use on any filesystem.
pub fn encode_dirname(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '@' | ' ' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_root() {
        let root = Path::new("/home/me/jiri");
        assert_eq!(
            expand_root("${JIRI_ROOT}/profiles/go", root),
            "/home/me/jiri/profiles/go"
        );
        assert_eq!(
            expand_root("PATH=${JIRI_ROOT}/a:${JIRI_ROOT}/b", root),
            "PATH=/home/me/jiri/a:/home/me/jiri/b"
        );
        assert_eq!(expand_root("/opt/go", root), "/opt/go");
    }

    #[test]
    fn test_expand_root_in_env_only_touches_values() {
        let root = Path::new("/j");
        let entries = vec![
            "GOROOT=${JIRI_ROOT}/go".to_string(),
            "${JIRI_ROOT}_KEY=x".to_string(),
            "${JIRI_ROOT}".to_string(),
        ];
        assert_eq!(
            expand_root_in_env(&entries, root),
            vec!["GOROOT=/j/go", "${JIRI_ROOT}_KEY=x", "${JIRI_ROOT}"]
        );
    }

    #[test]
    fn test_relative_to_root() {
        let root = Path::new("/home/me/jiri");
        assert_eq!(
            relative_to_root(Path::new("/home/me/jiri/profiles/go"), root),
            "${JIRI_ROOT}/profiles/go"
        );
        assert_eq!(relative_to_root(root, root), "${JIRI_ROOT}");
        assert_eq!(relative_to_root(Path::new("/opt/go"), root), "/opt/go");
    }

    #[test]
    fn test_relative_then_resolve() {
        let root = Path::new("/r");
        let stored = relative_to_root(Path::new("/r/x/y"), root);
        assert_eq!(
            resolve(&stored, Path::new("/moved")),
            PathBuf::from("/moved/x/y")
        );
    }

    #[test]
    fn test_profiles_root_relative_and_expand() {
        let root = ProfilesRoot::new("/j", "/j/.jiri_root/profiles");
        let install = root.join("go").join("amd64_linux_1.5");
        let stored = root.relative(&install);
        assert_eq!(
            stored,
            "${JIRI_ROOT}/.jiri_root/profiles/go/amd64_linux_1.5"
        );
        assert_eq!(root.expand(&stored), install);
    }

    #[test]
    fn test_encode_dirname() {
        assert_eq!(encode_dirname("amd64-linux@1.5"), "amd64-linux_1.5");
        assert_eq!(encode_dirname("v23:go"), "v23_go");
    }
}
