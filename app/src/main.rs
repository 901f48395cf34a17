//! tunbridge entrypoint
//! - tracing 初始化
//! - build: 由代理配置生成隧道核心配置
//! - probe: 通过本地 SOCKS 端点测量延迟

mod cli;
mod tracing_init;

use clap::Parser;
use cli::{Args, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_init::init_tracing_once();

    match args.command {
        Commands::Build(a) => cli::build::main(a),
        Commands::Probe(a) => cli::probe::main(a).await,
    }
}
