//! Build command - render the configuration bundle for one profile

use anyhow::{Context, Result};
use clap::{ArgGroup, Args as ClapArgs};
use std::path::PathBuf;
use tb_config::link::VMESS_SCHEME;
use tb_config::{build_proxy_configuration, parse_vmess_link, Profile};

#[derive(ClapArgs, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["profile", "link"])))]
pub struct BuildArgs {
    /// Profile file: VMess share JSON, or a single vmess:// link
    #[arg(long, short = 'p')]
    pub profile: Option<PathBuf>,
    /// vmess:// share link
    #[arg(long)]
    pub link: Option<String>,
    /// Single-line JSON output
    #[arg(long)]
    pub compact: bool,
}

fn load_profile(args: &BuildArgs) -> Result<Profile> {
    if let Some(link) = &args.link {
        return parse_vmess_link(link).context("invalid share link");
    }
    let Some(path) = &args.profile else {
        anyhow::bail!("either --profile or --link is required");
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile {}", path.display()))?;
    let text = text.trim();
    let profile = if text.starts_with(VMESS_SCHEME) {
        parse_vmess_link(text)
    } else {
        Profile::from_json(text)
    };
    profile.with_context(|| format!("invalid profile {}", path.display()))
}

pub fn main(args: BuildArgs) -> Result<()> {
    let profile = load_profile(&args)?;
    let bundle = build_proxy_configuration(&profile);
    let rendered = bundle.to_json_string(!args.compact)?;
    tracing::debug!(
        server = %profile.address,
        transport = profile.transport.kind(),
        "bundle rendered"
    );
    println!("{rendered}");
    Ok(())
}
