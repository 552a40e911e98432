//! # Available Command Implementation
//!
//! Lists the profiles the reachable managers can install: the in-process
//! managers plus whatever each `jiri-profile-<installer>` binary reports.

use anyhow::Result;
use clap::Args;
use log::warn;

use jiri_profiles::output::{dim, heading};

use super::Context;

/// List the profiles that can be installed
#[derive(Args, Debug)]
pub struct AvailableArgs {
    /// Show the description and supported versions of each profile
    #[arg(long)]
    pub describe: bool,
}

pub fn execute(ctx: &Context, args: AvailableArgs) -> Result<()> {
    let mut found = 0;
    for manager in ctx.registry.managers() {
        if !ctx.installer.is_empty() && manager.installer() != ctx.installer {
            continue;
        }
        found += 1;
        println!("{}", heading(&ctx.output, &manager.qualified_name()));
        if args.describe {
            let info = manager.info();
            if !info.is_empty() {
                println!("  {}", info);
            }
            let versions = manager.version_info().to_string();
            println!("  {}", dim(&ctx.output, &versions));
        }
    }

    for subcommand in ctx.registry.subcommands() {
        if !ctx.installer.is_empty() && subcommand.installer() != ctx.installer {
            continue;
        }
        match subcommand.available() {
            Ok(names) => {
                for name in names {
                    if ctx.registry.lookup(&name).is_some_and(|h| h.is_in_process()) {
                        continue;
                    }
                    found += 1;
                    println!("{}", heading(&ctx.output, &name));
                    if args.describe {
                        let binary = subcommand.binary().display().to_string();
                        println!("  {}", dim(&ctx.output, &binary));
                    }
                }
            }
            Err(e) => warn!("{}", e),
        }
    }

    if found == 0 {
        println!("No profile managers found.");
    }
    Ok(())
}
