//! # Output Configuration
//!
//! Controls the appearance of `jiri-profile` output: whether colours and
//! status symbols are used.
//!
//! The following are honoured, in order:
//! - `--color=never|always|auto`
//! - `NO_COLOR` disables colours when set (per https://no-color.org/)
//! - `CLICOLOR=0` disables colours, `CLICOLOR_FORCE=1` forces them
//! - `TERM=dumb` disables colours
//!
//! ```rust,ignore
//! use jiri_profiles::output::{status, OutputConfig, Status};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! println!("{} installed go", status(&config, Status::Ok));
//! ```

use std::env;

use console::style;

/// Whether colours and symbols may be used.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// `color_flag` is the value of `--color`: "always", "never" or "auto".
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Outcome marker printed in front of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Skipped,
    Removed,
    Warning,
}

/// The marker for `status`: a symbol when colours are on, a bracketed word
/// otherwise.
pub fn status(config: &OutputConfig, status: Status) -> &'static str {
    match (config.use_color, status) {
        (true, Status::Ok) => "✅",
        (true, Status::Skipped) => "⏭️ ",
        (true, Status::Removed) => "🗑️ ",
        (true, Status::Warning) => "⚠️ ",
        (false, Status::Ok) => "[OK]",
        (false, Status::Skipped) => "[SKIP]",
        (false, Status::Removed) => "[REMOVED]",
        (false, Status::Warning) => "[WARN]",
    }
}

/// A profile or section name, bold when colours are on.
pub fn heading(config: &OutputConfig, text: &str) -> String {
    if config.use_color {
        style(text).bold().force_styling(true).to_string()
    } else {
        text.to_string()
    }
}

/// Secondary information, dimmed when colours are on.
pub fn dim(config: &OutputConfig, text: &str) -> String {
    if config.use_color {
        style(text).dim().force_styling(true).to_string()
    } else {
        text.to_string()
    }
}
