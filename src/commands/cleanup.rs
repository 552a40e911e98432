//! # Cleanup Command Implementation
//!
//! Removes installations. `--gc` uninstalls every target older than its
//! manager's default version. `--rm-all` uninstalls everything, drops the
//! profile records and deletes their directories; it asks for confirmation
//! unless `--yes` is given.

use anyhow::{Context as _, Result};
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

use jiri_profiles::lifecycle::{self, CleanupMode};
use jiri_profiles::output::{heading, status, Status};

use super::{targets_of, Context};

/// Remove old or all installations
#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("mode").required(true).args(["gc", "rm_all"]))]
pub struct CleanupArgs {
    /// Uninstall targets older than the default version
    #[arg(long)]
    pub gc: bool,

    /// Uninstall everything and remove the profile directories
    #[arg(long)]
    pub rm_all: bool,

    /// Skip the confirmation prompt for --rm-all
    #[arg(short, long)]
    pub yes: bool,

    /// Profiles to clean up; defaults to every installed profile
    #[arg(value_name = "PROFILE")]
    pub profiles: Vec<String>,
}

impl CleanupArgs {
    fn mode(&self) -> CleanupMode {
        if self.rm_all {
            CleanupMode::RemoveAll
        } else {
            CleanupMode::Gc
        }
    }
}

pub fn execute(ctx: &Context, args: CleanupArgs) -> Result<()> {
    let mode = args.mode();
    let mut db = ctx.load_db()?;
    let profiles = ctx.selected_profiles(&db, &args.profiles);

    if mode == CleanupMode::RemoveAll && !args.yes {
        let prompt = if profiles.is_empty() {
            format!("Remove {}?", ctx.root.dir().display())
        } else {
            format!("Remove every installation of {}?", profiles.join(", "))
        };
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cleanup cancelled.");
            return Ok(());
        }
    }

    ctx.for_each_profile(&mut db, &profiles, |handle, db, name| {
        let before = targets_of(db, name);
        handle
            .cleanup(db, &ctx.root, mode)
            .with_context(|| format!("failed to clean up {}", name))?;
        let after = targets_of(db, name);
        for removed in before.iter().filter(|t| !after.contains(t)) {
            println!(
                "{} {} {}",
                status(&ctx.output, Status::Removed),
                heading(&ctx.output, name),
                removed
            );
        }
        Ok(())
    })?;

    if mode == CleanupMode::RemoveAll && args.profiles.is_empty() && ctx.installer.is_empty() {
        let remaining = db.names();
        if remaining.is_empty() {
            if lifecycle::remove_profiles_dir(&ctx.root)? {
                println!(
                    "{} {}",
                    status(&ctx.output, Status::Removed),
                    ctx.root.dir().display()
                );
            }
        } else {
            println!(
                "{} keeping {}: no manager for {}",
                status(&ctx.output, Status::Warning),
                ctx.root.dir().display(),
                remaining.join(", ")
            );
        }
    }
    Ok(())
}
