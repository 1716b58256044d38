use clap::Parser;
use ledgerbook::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
