use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    generate::{self, GenerateArgs},
    grid::{self, GridArgs},
    inject::{self, InjectArgs},
    lookup::{self, LookupArgs},
};

mod commands;
mod config;

#[derive(Parser, Debug)]
#[command(name = "tmd-sim", about = "TMD spin-injection study driver", version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run injection jobs over a grid built from the amplitude table.
    Inject(InjectArgs),
    /// Print the grid built from the amplitude table.
    Grid(GridArgs),
    /// Look up the amplitude at one kinematic point.
    Lookup(LookupArgs),
    /// Generate a pseudo-data event sample as CSV.
    Generate(GenerateArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .init();

    match cli.command {
        Command::Inject(args) => inject::run(&args),
        Command::Grid(args) => grid::run(&args),
        Command::Lookup(args) => lookup::run(&args),
        Command::Generate(args) => generate::run(&args),
    }
}
