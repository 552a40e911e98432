//! # List Command Implementation
//!
//! Lists installed profiles and their targets, optionally with every
//! recorded detail (`--info`) or as JSON (`--json`).

use anyhow::Result;
use clap::Args;

use jiri_profiles::manager::ManagerHandle;
use jiri_profiles::output::{dim, heading};
use jiri_profiles::profile::Profile;

use super::Context;

/// List installed profiles
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show installation details and environments
    #[arg(long, conflicts_with = "json")]
    pub info: bool,

    /// Print the profiles as JSON
    #[arg(long)]
    pub json: bool,

    /// Only list these profiles
    #[arg(value_name = "PROFILE")]
    pub profiles: Vec<String>,
}

pub fn execute(ctx: &Context, args: ListArgs) -> Result<()> {
    let db = ctx.load_db()?;
    let profiles: Vec<&Profile> = db
        .profiles()
        .into_iter()
        .filter(|p| ctx.installer.is_empty() || p.installer == ctx.installer)
        .filter(|p| {
            args.profiles.is_empty() || args.profiles.contains(&p.qualified_name())
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    if profiles.is_empty() {
        println!("No profiles installed.");
        return Ok(());
    }

    for profile in profiles {
        let name = profile.qualified_name();
        let manager = match ctx.registry.lookup(&name) {
            Some(ManagerHandle::InProcess(m)) => Some(m),
            _ => None,
        };
        println!("{}", heading(&ctx.output, &name));
        if args.info {
            if let Some(m) = manager {
                let info = m.info();
                if !info.is_empty() {
                    println!("  {}", info);
                }
                println!("  {}", m.version_info());
            }
            println!("  root: {}", profile.root);
        }
        if !profile.has_targets() {
            println!("  {}", dim(&ctx.output, "no targets installed"));
        }
        for target in profile.sorted_targets() {
            if args.info {
                for line in target.options_string().lines() {
                    println!("  {}", line);
                }
                continue;
            }
            let out_of_date = manager.is_some_and(|m| {
                m.version_info()
                    .is_target_older_than_default(&target.version)
            });
            if out_of_date {
                println!("  {} {}", target, dim(&ctx.output, "(out of date)"));
            } else {
                println!("  {}", target);
            }
        }
    }
    Ok(())
}
