use clap::Parser;
use subcommands::Subcommand;

mod apis;
mod backend;
mod calculators;
mod date_range;
mod errors;
mod header_map;
mod ledger;
mod loaders;
mod model;
mod orchestrator;
mod parsing;
mod roster;
mod subcommands;
mod utils;

#[derive(Parser, Debug)]
pub struct CliArgs {
    /// The command to perform.
    #[command(subcommand)]
    command: Subcommand,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let CliArgs { command } = CliArgs::parse();

    let exit_code = match command {
        Subcommand::RunAll(args) => subcommands::run::run_all(args)?,
        Subcommand::RunTech(args) => subcommands::run::run_tech(args)?,
        Subcommand::PrintSummary(args) => subcommands::run::print_summary(args)?,
    };

    std::process::exit(exit_code);
}
