//! # Env Command Implementation
//!
//! Prints the environment obtained by merging the environments of installed
//! profiles into the process environment, one `KEY=VALUE` per line. The
//! merge follows jiri's own policies, adjusted by `--merge-policies`.

use anyhow::{Context as _, Result};
use clap::Args;

use jiri_profiles::envvar::EnvVars;
use jiri_profiles::merge::{jiri_merge_policies, MergePolicies};
use jiri_profiles::reader::{ProfilesMode, Reader};
use jiri_profiles::target::Target;

use super::Context;

/// Print the environment composed from installed profiles
#[derive(Args, Debug)]
pub struct EnvArgs {
    /// Comma separated profiles to merge; defaults to every installed profile
    #[arg(long, value_name = "PROFILES", value_delimiter = ',')]
    pub profiles: Vec<String>,

    /// Build target as <arch>-<os>[@<version>]; defaults to the host
    #[arg(long, value_name = "TARGET")]
    pub target: Option<String>,

    /// Merge policies overriding jiri's defaults, e.g. ":PATH,^GOPATH*,-HOME"
    #[arg(long, value_name = "POLICIES")]
    pub merge_policies: Option<String>,

    /// Do not merge any profile environment
    #[arg(long)]
    pub skip_profiles: bool,

    /// Start from an empty environment instead of the process environment
    #[arg(long)]
    pub no_inherit: bool,

    /// Only print these variables
    #[arg(value_name = "VAR")]
    pub vars: Vec<String>,
}

fn merge_policies(encoded: Option<&str>) -> Result<MergePolicies> {
    let mut policies = jiri_merge_policies();
    if let Some(encoded) = encoded {
        policies
            .set(encoded)
            .with_context(|| format!("invalid --merge-policies {:?}", encoded))?;
    }
    Ok(policies)
}

pub fn execute(ctx: &Context, args: EnvArgs) -> Result<()> {
    let policies = merge_policies(args.merge_policies.as_deref())?;
    let target = match &args.target {
        Some(s) => Target::parse(s)?,
        None => Target::host(),
    };

    let mode = ProfilesMode::from_skip(args.skip_profiles);
    let mut reader = Reader::new(mode, &ctx.db_path, ctx.root.jiri_root()).with_context(|| {
        format!(
            "failed to read profiles database {}",
            ctx.db_path.display()
        )
    })?;
    if args.no_inherit {
        reader = reader.with_base(EnvVars::new());
    }

    let profiles = if args.profiles.is_empty() {
        reader.profile_names()
    } else {
        reader.validate_requested_profiles_and_target(&args.profiles, &target)?;
        args.profiles.clone()
    };
    reader.merge_env_from_profiles(&policies, &target, &profiles);

    if args.vars.is_empty() {
        for entry in reader.to_vec() {
            println!("{}", entry);
        }
    } else {
        for var in &args.vars {
            if let Some(value) = reader.get(var) {
                println!("{}={}", var, value);
            }
        }
    }
    Ok(())
}
