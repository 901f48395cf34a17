pub mod build;
pub mod output;
pub mod probe;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "tunbridge", version)]
#[command(about = "Build tunnel configurations and measure proxy latency", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the outbound/routing/DNS bundle for a profile
    Build(build::BuildArgs),
    /// Measure latency through a running SOCKS5 endpoint
    Probe(probe::ProbeArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Human,
    Json,
}
