#![doc = include_str!("../README.md")]

mod cli;
mod config;
mod copy;
mod error;
mod locate;
mod logging;
mod pbxproj;
mod substitute;

pub(crate) use cli::*;
pub(crate) use error::*;
pub(crate) use logging::*;

use clap::Parser;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    TraceController::initialize(&args);

    let result = match args.action {
        Commands::AndroidPackage(opts) => opts.run().await,
        Commands::IosAddTarget(opts) => opts.run().await,
        Commands::IosCopyFiles(opts) => opts.run().await,
    };

    if let Err(err) = result {
        eprintln!("[openwith] Failed: {err}");
        std::process::exit(1);
    }
}
