//! # Error Handling
//!
//! Centralized error type for the profiles engine. All fallible library
//! operations return [`Result<T>`], an alias over [`Error`].
//!
//! Error kinds mirror the states a caller has to distinguish:
//!
//! - malformed or unsupported inputs (`MalformedTarget`, `UnsupportedVersion`,
//!   `InvalidMergePolicy`, `InvalidEnv`),
//! - lookups that found nothing (`ProfileNotFound`, `TargetNotFound`,
//!   `ManagerNotFound`),
//! - persisted state this binary cannot understand (`SchemaMismatch`,
//!   `DbFormat`),
//! - failures reported by manager implementations (`Install`, `Subcommand`),
//! - pass-through I/O errors.
//!
//! Registering the same manager twice is a programming error and panics in
//! [`crate::manager::Registry::register`] rather than surfacing here.

use thiserror::Error;

/// Main error type for profile operations
#[derive(Error, Debug)]
pub enum Error {
    /// A target string did not have the `arch-os[@version]` shape.
    #[error("Malformed target {input:?}: {message}")]
    MalformedTarget { input: String, message: String },

    /// A requested version is not in the manager's supported set.
    #[error("Unsupported version {version:?} for {name}{}", supported_hint(.supported))]
    UnsupportedVersion {
        name: String,
        version: String,
        supported: Vec<String>,
    },

    /// No profile is registered under the qualified name.
    #[error("Profile not found: {name}")]
    ProfileNotFound { name: String },

    /// The profile exists but the target is not installed for it.
    #[error("Target {target} not found for profile {profile}")]
    TargetNotFound { profile: String, target: String },

    /// The persisted database was written by a newer schema.
    #[error("Profiles database {path} has schema version {found}, this binary supports up to {supported}")]
    SchemaMismatch {
        path: String,
        found: u32,
        supported: u32,
    },

    /// The persisted database could not be parsed or serialized.
    #[error("Profiles database format error in {path}: {message}")]
    DbFormat { path: String, message: String },

    /// A merge policy token in the compact encoding could not be parsed.
    #[error("Invalid merge policy {token:?}: {message}")]
    InvalidMergePolicy { token: String, message: String },

    /// An environment entry was not of the `KEY=VALUE` form.
    #[error("Invalid environment variable {entry:?}: expected KEY=VALUE")]
    InvalidEnv { entry: String },

    /// No manager is registered for the qualified profile name.
    #[error("No profile manager registered for {name}")]
    ManagerNotFound { name: String },

    /// A manager failed to install or uninstall a target.
    #[error("{action} of {profile} for {target} failed: {message}")]
    Install {
        action: String,
        profile: String,
        target: String,
        message: String,
    },

    /// An external profile subcommand failed.
    #[error("Profile subcommand {command} failed: {stderr}")]
    Subcommand { command: String, stderr: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn supported_hint(supported: &[String]) -> String {
    if supported.is_empty() {
        String::new()
    } else {
        format!(" (supported: {})", supported.join(", "))
    }
}

impl Error {
    /// Returns true for errors that mean "the thing asked for does not exist".
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::ProfileNotFound { .. }
            | Error::TargetNotFound { .. }
            | Error::ManagerNotFound { .. } => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_malformed_target() {
        let error = Error::MalformedTarget {
            input: "amd64".to_string(),
            message: "expected arch-os".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Malformed target"));
        assert!(display.contains("\"amd64\""));
    }

    #[test]
    fn test_error_display_unsupported_version_with_hint() {
        let error = Error::UnsupportedVersion {
            name: "go".to_string(),
            version: "9".to_string(),
            supported: vec!["3".to_string(), "2".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Unsupported version \"9\" for go (supported: 3, 2)"
        );
    }

    #[test]
    fn test_error_display_unsupported_version_without_hint() {
        let error = Error::UnsupportedVersion {
            name: "go".to_string(),
            version: "9".to_string(),
            supported: vec![],
        };
        assert_eq!(error.to_string(), "Unsupported version \"9\" for go");
    }

    #[test]
    fn test_error_display_schema_mismatch() {
        let error = Error::SchemaMismatch {
            path: "/tmp/db".to_string(),
            found: 9,
            supported: 5,
        };
        let display = error.to_string();
        assert!(display.contains("schema version 9"));
        assert!(display.contains("up to 5"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::ProfileNotFound {
            name: "go".to_string()
        }
        .is_not_found());
        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(Error::Io(missing).is_not_found());
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(!Error::Io(denied).is_not_found());
        assert!(!Error::InvalidEnv {
            entry: "x".to_string()
        }
        .is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
        assert!(error.to_string().contains("missing"));
    }
}
