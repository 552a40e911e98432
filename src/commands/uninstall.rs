//! # Uninstall Command Implementation
//!
//! Removes the installation of a target from one or more profiles. Without
//! a version in `--target`, every installed version of it is removed.

use anyhow::{Context as _, Result};
use clap::Args;

use jiri_profiles::output::{heading, status, Status};
use jiri_profiles::target::Target;

use super::{targets_of, Context};

/// Uninstall the given profiles
#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Build target as <arch>-<os>[@<version>]; defaults to the host
    #[arg(long, value_name = "TARGET")]
    pub target: Option<String>,

    /// Profiles to uninstall, as [<installer>:]<name>
    #[arg(required = true, value_name = "PROFILE")]
    pub profiles: Vec<String>,
}

pub fn execute(ctx: &Context, args: UninstallArgs) -> Result<()> {
    let target = match &args.target {
        Some(s) => Target::parse(s)?,
        None => Target::host(),
    };
    let mut db = ctx.load_db()?;

    ctx.for_each_profile(&mut db, &args.profiles, |handle, db, name| {
        let before = targets_of(db, name);
        handle
            .uninstall(db, &ctx.root, &target)
            .with_context(|| format!("failed to uninstall {} for {}", name, target))?;
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
    })
}
