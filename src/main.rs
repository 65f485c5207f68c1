use clap::Parser;
use options_trader::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
