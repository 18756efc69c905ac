//! wgl-bundle: bundles WGLScript entry files into single source-mapped scripts.

mod cli;
mod config;
mod logging;
mod orchestrator;
mod output;

use clap::Parser;
use cli::Args;
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_level, args.log_format);

    let summary = orchestrator::run(args).await?;
    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
