//! # Install Command Implementation
//!
//! Installs one or more profiles for a target. The version defaults to each
//! manager's default version; a target that is already installed is left
//! alone unless `--force` is given.

use anyhow::{Context as _, Result};
use clap::Args;

use jiri_profiles::output::{heading, status, Status};

use super::{targets_of, Context, TargetArgs};

/// Install the given profiles
#[derive(Args, Debug)]
pub struct InstallArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Reinstall targets that are already installed
    #[arg(long)]
    pub force: bool,

    /// Profiles to install, as [<installer>:]<name>
    #[arg(required = true, value_name = "PROFILE")]
    pub profiles: Vec<String>,
}

pub fn execute(ctx: &Context, args: InstallArgs) -> Result<()> {
    let target = args.target.to_target()?;
    let mut db = ctx.load_db()?;

    ctx.for_each_profile(&mut db, &args.profiles, |handle, db, name| {
        let before = targets_of(db, name);
        handle
            .install(db, &ctx.root, &target, args.force)
            .with_context(|| format!("failed to install {} for {}", name, target))?;
        let after = targets_of(db, name);
        match after.iter().find(|t| !before.contains(t)) {
            Some(installed) => println!(
                "{} {} {}",
                status(&ctx.output, Status::Ok),
                heading(&ctx.output, name),
                installed
            ),
            None => println!(
                "{} {} {} is already installed",
                status(&ctx.output, Status::Skipped),
                heading(&ctx.output, name),
                target
            ),
        }
        Ok(())
    })
}
