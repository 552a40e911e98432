//! # Profiles Database
//!
//! The database records every installed profile and target. It is loaded
//! fully into memory, mutated by a single command, and written back
//! wholesale; concurrent writers are not supported and the last write wins.
//!
//! ## On-disk layout
//!
//! The format is XML, compatible with databases written by earlier jiri
//! releases:
//!
//! ```xml
//! <profiles version="5">
//!   <profile name="go" installer="v23" root="${JIRI_ROOT}/profiles/go">
//!     <target tag="" arch="amd64" os="linux" version="1.5" installation-directory="...">
//!       <envvars><var>GOROOT=...</var></envvars>
//!       <command-line-env><var>CC=clang</var></command-line-env>
//!     </target>
//!   </profile>
//! </profiles>
//! ```
//!
//! A database path is either a single file (the legacy layout, written when
//! no installer is given) or a directory holding one file per installer.
//! Writing one installer's file leaves the other installers' files alone.
//! Each write goes through `<file>.tmp` and keeps the previous contents as
//! `<file>.prev`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use xot::{NameId, Node, Xot};

use crate::error::{Error, Result};
use crate::profile::{qualified_name, split_qualified_name, Profile};
use crate::target::Target;

/// Newest schema version this implementation reads and the one it writes.
pub const SCHEMA_VERSION: u32 = 5;

const BACKUP_SUFFIX: &str = ".prev";
const TEMP_SUFFIX: &str = ".tmp";

/// In-memory profiles database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Db {
    version: u32,
    path: Option<PathBuf>,
    profiles: BTreeMap<String, Profile>,
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

impl Db {
    /// An empty database at the current schema version.
    pub fn new() -> Self {
        Self {
            version: SCHEMA_VERSION,
            path: None,
            profiles: BTreeMap::new(),
        }
    }

    /// Load the database at `path`; a missing `path` yields an empty
    /// database when `tolerate_missing` is set and an error otherwise.
    pub fn load(path: &Path, tolerate_missing: bool) -> Result<Self> {
        let mut db = Self::new();
        if tolerate_missing {
            db.read_tolerant(path)?;
        } else {
            db.read(path)?;
        }
        Ok(db)
    }

    pub fn schema_version(&self) -> u32 {
        self.version
    }

    /// Path the database was last read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Register a profile, or return the one already registered.
    ///
    /// The root of an existing profile is left unchanged.
    pub fn install_profile(&mut self, installer: &str, name: &str, root: &str) -> &mut Profile {
        self.profiles
            .entry(qualified_name(installer, name))
            .or_insert_with(|| Profile::new(installer, name, root))
    }

    /// Record `target` for a registered profile, updating an existing entry
    /// with the same (arch, os, version) in place.
    pub fn add_profile_target(
        &mut self,
        installer: &str,
        name: &str,
        target: Target,
    ) -> Result<()> {
        let qualified = qualified_name(installer, name);
        let profile = self
            .profiles
            .get_mut(&qualified)
            .ok_or(Error::ProfileNotFound { name: qualified })?;
        let description = target.to_string();
        if profile.insert_target(target) {
            debug!("updated {} for {}", description, profile.qualified_name());
        } else {
            debug!("added {} to {}", description, profile.qualified_name());
        }
        Ok(())
    }

    /// Remove the exact (arch, os, version) instance of `target`.
    ///
    /// The profile record stays even when its last target is removed.
    pub fn remove_profile_target(&mut self, installer: &str, name: &str, target: &Target) -> bool {
        self.profiles
            .get_mut(&qualified_name(installer, name))
            .is_some_and(|p| p.remove_target(target))
    }

    /// Drop a profile record entirely.
    pub fn remove_profile(&mut self, installer: &str, name: &str) -> bool {
        self.profiles
            .remove(&qualified_name(installer, name))
            .is_some()
    }

    pub fn lookup_profile(&self, installer: &str, name: &str) -> Option<&Profile> {
        self.profiles.get(&qualified_name(installer, name))
    }

    /// Look up a profile by its qualified name.
    pub fn lookup_qualified(&self, qualified: &str) -> Option<&Profile> {
        self.profiles.get(qualified)
    }

    /// The installed target of a profile matching `target`.
    pub fn lookup_profile_target(
        &self,
        installer: &str,
        name: &str,
        target: &Target,
    ) -> Option<&Target> {
        self.lookup_profile(installer, name)?.find_target(target)
    }

    /// Qualified names of all profiles, sorted.
    pub fn names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    /// All profiles, sorted by qualified name.
    pub fn profiles(&self) -> Vec<&Profile> {
        self.profiles.values().collect()
    }

    /// Profiles owned by `installer`.
    pub fn profiles_for_installer(&self, installer: &str) -> Vec<&Profile> {
        self.profiles
            .values()
            .filter(|p| p.installer == installer)
            .collect()
    }

    /// Populate from `path`, failing if it does not exist.
    pub fn read(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("profiles database {} does not exist", path.display()),
            )));
        }
        self.read_existing(path)
    }

    /// Populate from `path`, treating a missing path as an empty database.
    pub fn read_tolerant(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            debug!(
                "profiles database {} does not exist, starting empty",
                path.display()
            );
            self.path = Some(path.to_path_buf());
            return Ok(());
        }
        self.read_existing(path)
    }

    fn read_existing(&mut self, path: &Path) -> Result<()> {
        if path.is_dir() {
            let mut files = Vec::new();
            for entry in fs::read_dir(path)? {
                let entry = entry?;
                let file_name = entry.file_name().to_string_lossy().into_owned();
                if !entry.file_type()?.is_file() || is_ignored_file(&file_name) {
                    continue;
                }
                files.push((file_name, entry.path()));
            }
            files.sort();
            for (installer, file) in files {
                self.read_file(&file, &installer)?;
            }
        } else {
            self.read_file(path, "")?;
        }
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn read_file(&mut self, file: &Path, default_installer: &str) -> Result<()> {
        debug!("reading profiles database {}", file.display());
        let content = fs::read_to_string(file)?;
        let (version, profiles) = decode(&content, file, default_installer)?;
        // Reading several installer files keeps the newest schema seen.
        if self.profiles.is_empty() || version > self.version {
            self.version = version;
        }
        for profile in profiles {
            self.profiles.insert(profile.qualified_name(), profile);
        }
        Ok(())
    }

    /// Persist the database.
    ///
    /// With an empty `installer` every profile is written to the file at
    /// `path`, which must not be a per-installer directory. Otherwise `path`
    /// is a directory and only the profiles owned by `installer` are written
    /// to `path/<installer>`.
    pub fn write(&self, installer: &str, path: &Path) -> Result<()> {
        let (file, profiles): (PathBuf, Vec<&Profile>) = if installer.is_empty() {
            if path.is_dir() {
                return Err(format_error(
                    path,
                    "is a per-installer directory, an installer is required to write it",
                ));
            }
            (path.to_path_buf(), self.profiles())
        } else {
            fs::create_dir_all(path)?;
            (path.join(installer), self.profiles_for_installer(installer))
        };
        if let Some(parent) = file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = encode(&profiles, &file)?;
        let temp = with_suffix(&file, TEMP_SUFFIX);
        fs::write(&temp, content)?;
        if file.is_file() {
            fs::rename(&file, with_suffix(&file, BACKUP_SUFFIX))?;
        }
        fs::rename(&temp, &file)?;
        info!("wrote {} profile(s) to {}", profiles.len(), file.display());
        Ok(())
    }
}

fn is_ignored_file(name: &str) -> bool {
    name.starts_with('.') || name.ends_with(BACKUP_SUFFIX) || name.ends_with(TEMP_SUFFIX)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Interned element and attribute names.
struct Names {
    profiles: NameId,
    profile: NameId,
    target: NameId,
    envvars: NameId,
    command_line_env: NameId,
    var: NameId,
    version: NameId,
    name: NameId,
    installer: NameId,
    root: NameId,
    tag: NameId,
    arch: NameId,
    os: NameId,
    installation_dir: NameId,
}

impl Names {
    fn new(xot: &mut Xot) -> Self {
        Self {
            profiles: xot.add_name("profiles"),
            profile: xot.add_name("profile"),
            target: xot.add_name("target"),
            envvars: xot.add_name("envvars"),
            command_line_env: xot.add_name("command-line-env"),
            var: xot.add_name("var"),
            version: xot.add_name("version"),
            name: xot.add_name("name"),
            installer: xot.add_name("installer"),
            root: xot.add_name("root"),
            tag: xot.add_name("tag"),
            arch: xot.add_name("arch"),
            os: xot.add_name("os"),
            installation_dir: xot.add_name("installation-directory"),
        }
    }
}

fn format_error(file: &Path, message: impl ToString) -> Error {
    Error::DbFormat {
        path: file.display().to_string(),
        message: message.to_string(),
    }
}

fn attr(xot: &Xot, node: Node, name: NameId) -> String {
    xot.attributes(node).get(name).cloned().unwrap_or_default()
}

fn child_elements(xot: &Xot, node: Node, name: NameId) -> Vec<Node> {
    xot.children(node)
        .filter(|child| {
            xot.element(*child).is_some_and(|e| e.name() == name)
        })
        .collect()
}

fn vars(xot: &Xot, node: Node, names: &Names, list: NameId) -> Vec<String> {
    child_elements(xot, node, list)
        .into_iter()
        .flat_map(|list_node| child_elements(xot, list_node, names.var))
        .filter_map(|var| xot.text_content_str(var).map(str::to_string))
        .filter(|v| !v.is_empty())
        .collect()
}

fn decode(content: &str, file: &Path, default_installer: &str) -> Result<(u32, Vec<Profile>)> {
    let mut xot = Xot::new();
    let names = Names::new(&mut xot);
    let document = xot.parse(content).map_err(|e| format_error(file, e))?;
    let root = xot
        .document_element(document)
        .map_err(|e| format_error(file, e))?;
    let element = xot.element(root);
    if !element.is_some_and(|e| e.name() == names.profiles) {
        return Err(format_error(file, "root element is not <profiles>"));
    }

    let version_attr = attr(&xot, root, names.version);
    let version = if version_attr.is_empty() {
        0
    } else {
        version_attr.parse::<u32>().map_err(|_| {
            format_error(file, format!("invalid schema version {:?}", version_attr))
        })?
    };
    if version > SCHEMA_VERSION {
        return Err(Error::SchemaMismatch {
            path: file.display().to_string(),
            found: version,
            supported: SCHEMA_VERSION,
        });
    }

    let mut profiles = Vec::new();
    for node in child_elements(&xot, root, names.profile) {
        let stored_name = attr(&xot, node, names.name);
        if stored_name.is_empty() {
            return Err(format_error(file, "<profile> without a name"));
        }
        let installer_attr = attr(&xot, node, names.installer);
        // Older databases qualify the name itself and carry no installer attribute.
        let (installer, name) = if installer_attr.is_empty() {
            match split_qualified_name(&stored_name) {
                ("", name) => (default_installer.to_string(), name.to_string()),
                (installer, name) => (installer.to_string(), name.to_string()),
            }
        } else {
            (installer_attr, stored_name)
        };

        let mut profile = Profile::new(installer, name, attr(&xot, node, names.root));
        for target_node in child_elements(&xot, node, names.target) {
            let target = Target {
                tag: attr(&xot, target_node, names.tag),
                arch: attr(&xot, target_node, names.arch),
                os: attr(&xot, target_node, names.os),
                version: attr(&xot, target_node, names.version),
                env: vars(&xot, target_node, &names, names.envvars),
                command_line_env: vars(&xot, target_node, &names, names.command_line_env),
                installation_dir: attr(&xot, target_node, names.installation_dir),
            };
            if !target.is_set() {
                let message = format!(
                    "target without arch/os in profile {}",
                    profile.qualified_name()
                );
                return Err(format_error(file, message));
            }
            profile.insert_target(target);
        }
        profiles.push(profile);
    }
    Ok((version, profiles))
}

fn encode(profiles: &[&Profile], file: &Path) -> Result<String> {
    let mut xot = Xot::new();
    let names = Names::new(&mut xot);
    let err = |e: xot::Error| format_error(file, e);

    let root = xot.new_element(names.profiles);
    xot.attributes_mut(root)
        .insert(names.version, SCHEMA_VERSION.to_string());

    for profile in profiles {
        let node = xot.new_element(names.profile);
        {
            let mut attrs = xot.attributes_mut(node);
            attrs.insert(names.name, profile.name.clone());
            if !profile.installer.is_empty() {
                attrs.insert(names.installer, profile.installer.clone());
            }
            attrs.insert(names.root, profile.root.clone());
        }
        for t in profile.targets() {
            let target_node = xot.new_element(names.target);
            {
                let mut attrs = xot.attributes_mut(target_node);
                attrs.insert(names.tag, t.tag.clone());
                attrs.insert(names.arch, t.arch.clone());
                attrs.insert(names.os, t.os.clone());
                attrs.insert(names.installation_dir, t.installation_dir.clone());
                attrs.insert(names.version, t.version.clone());
            }
            let lists = [
                (names.envvars, &t.env),
                (names.command_line_env, &t.command_line_env),
            ];
            for (list, entries) in lists {
                let list_node = xot.new_element(list);
                for entry in entries.iter() {
                    let var = xot.new_element(names.var);
                    let text = xot.new_text(entry);
                    xot.append(var, text).map_err(err)?;
                    xot.append(list_node, var).map_err(err)?;
                }
                xot.append(target_node, list_node).map_err(err)?;
            }
            xot.append(node, target_node).map_err(err)?;
        }
        xot.append(root, node).map_err(err)?;
    }

    let document = xot.new_document_with_element(root).map_err(err)?;
    xot.to_string(document).map_err(err)
}
