pub mod run;

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Runs every category for every technician on the roster and writes
    /// their ledgers and roster pay back to the backend.
    RunAll(run::RunAllArgs),
    /// Runs every category for a single named technician.
    RunTech(run::RunTechArgs),
    /// Prints a summary of the most recent run without recomputing it.
    PrintSummary(run::PrintSummaryArgs),
}
