//! CLI argument parsing and command dispatch

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use log::debug;

use jiri_profiles::defaults::{default_db_path, default_profiles_dir, default_root};
use jiri_profiles::manager::{Action, Registry, SubcommandManager};
use jiri_profiles::output::OutputConfig;
use jiri_profiles::path::ProfilesRoot;

use crate::commands::{self, Context};

/// Jiri Profile - Install and inspect build profiles
#[derive(Parser, Debug)]
#[command(name = "jiri-profile")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Root of the jiri checkout
    #[arg(long, global = true, value_name = "DIR", env = "JIRI_ROOT")]
    root: Option<PathBuf>,

    /// Profiles database: a file, or a directory with one file per installer
    #[arg(long, global = true, value_name = "PATH", env = "JIRI_PROFILES_DB")]
    profiles_db: Option<PathBuf>,

    /// Directory profiles are installed into
    #[arg(long, global = true, value_name = "DIR", env = "JIRI_PROFILES_DIR")]
    profiles_dir: Option<PathBuf>,

    /// Only operate on profiles of this installer
    #[arg(long, global = true, value_name = "NAME", default_value = "")]
    installer: String,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install the given profiles
    Install(commands::install::InstallArgs),
    /// Uninstall the given profiles
    Uninstall(commands::uninstall::UninstallArgs),
    /// Install the default version of out-of-date profiles
    Update(commands::update::UpdateArgs),
    /// Remove old or all installations
    Cleanup(commands::cleanup::CleanupArgs),
    /// List installed profiles
    List(commands::list::ListArgs),
    /// Print the environment composed from installed profiles
    Env(commands::env::EnvArgs),
    /// List the profiles that can be installed
    Available(commands::available::AvailableArgs),
    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Registry of the managers this binary can reach: every
/// `jiri-profile-<installer>` found on `PATH`.
pub fn build_registry() -> Registry {
    let mut registry = Registry::new();
    if let Some(path) = std::env::var_os("PATH") {
        for installer in SubcommandManager::discover_installers(&path) {
            if let Some(subcommand) = SubcommandManager::find(&installer) {
                registry.register_subcommand(subcommand);
            }
        }
    }
    registry
}

/// Parse `args`, letting every in-process manager in `registry` add and then
/// read its own flags.
pub fn parse_with_registry<I, T>(registry: &mut Registry, args: I) -> Result<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = Cli::command();
    for action in Action::ALL {
        let managers = registry.managers();
        command = command.mut_subcommand(action.verb(), |sub| {
            managers.iter().fold(sub, |sub, m| m.add_flags(sub, action))
        });
    }

    let matches = command
        .try_get_matches_from(args)
        .unwrap_or_else(|e| e.exit());
    let cli = Cli::from_arg_matches(&matches)?;

    if let Some((verb, sub_matches)) = matches.subcommand() {
        if let Some(action) = Action::from_verb(verb) {
            for name in registry.names() {
                if let Some(manager) = registry.lookup_manager_mut(&name) {
                    manager.apply_flags(sub_matches, action)?;
                }
            }
        }
    }
    Ok(cli)
}

impl Cli {
    fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(self.log_level.as_str());
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .try_init();
    }

    /// Execute the CLI command
    pub fn execute(self, registry: Registry) -> Result<()> {
        self.init_logging();

        let jiri_root = default_root(self.root.as_deref());
        let db_path = self
            .profiles_db
            .clone()
            .unwrap_or_else(|| default_db_path(&jiri_root));
        let profiles_dir = self
            .profiles_dir
            .clone()
            .unwrap_or_else(|| default_profiles_dir(&jiri_root));
        debug!(
            "jiri root {}, profiles database {}, profiles directory {}",
            jiri_root.display(),
            db_path.display(),
            profiles_dir.display()
        );

        let ctx = Context {
            root: ProfilesRoot::new(jiri_root, profiles_dir),
            db_path,
            installer: self.installer,
            output: OutputConfig::from_env_and_flag(&self.color),
            registry,
        };

        match self.command {
            Commands::Install(args) => commands::install::execute(&ctx, args),
            Commands::Uninstall(args) => commands::uninstall::execute(&ctx, args),
            Commands::Update(args) => commands::update::execute(&ctx, args),
            Commands::Cleanup(args) => commands::cleanup::execute(&ctx, args),
            Commands::List(args) => commands::list::execute(&ctx, args),
            Commands::Env(args) => commands::env::execute(&ctx, args),
            Commands::Available(args) => commands::available::execute(&ctx, args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
