mod bins;
mod compare;
mod interval;
mod island;
mod reads;
mod stats;
mod util;

use anyhow;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about, long_about=None)]
#[command(propagate_version = true)]
///
/// epidiff
///
struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Call enriched islands of one ChIP library against its input
    Islands(island::IslandArgs),
    /// Differential islands between knockout and wildtype libraries
    Compare(compare::CompareArgs),
}

/// main CLI for epidiff
///
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &cli.commands {
        Commands::Islands(args) => {
            island::run(args)?;
        }
        Commands::Compare(args) => {
            compare::run(args)?;
        }
    }
    Ok(())
}
