//! # Update Command Implementation
//!
//! Installs the current default version of every out-of-date target.
//! Superseded versions stay installed until `cleanup --gc` removes them.

use anyhow::{Context as _, Result};
use clap::Args;

use jiri_profiles::output::{heading, status, Status};

use super::{targets_of, Context};

/// Install the default version of out-of-date profiles
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Profiles to update; defaults to every installed profile
    #[arg(value_name = "PROFILE")]
    pub profiles: Vec<String>,
}

pub fn execute(ctx: &Context, args: UpdateArgs) -> Result<()> {
    let mut db = ctx.load_db()?;
    let profiles = ctx.selected_profiles(&db, &args.profiles);

    ctx.for_each_profile(&mut db, &profiles, |handle, db, name| {
        let before = targets_of(db, name);
        handle
            .update(db, &ctx.root)
            .with_context(|| format!("failed to update {}", name))?;
        let added: Vec<_> = targets_of(db, name)
            .into_iter()
            .filter(|t| !before.contains(t))
            .collect();
        if added.is_empty() {
            println!(
                "{} {} is up to date",
                status(&ctx.output, Status::Skipped),
                heading(&ctx.output, name)
            );
        }
        for target in added {
            println!(
                "{} {} {}",
                status(&ctx.output, Status::Ok),
                heading(&ctx.output, name),
                target
            );
        }
        Ok(())
    })
}
