use clap::Parser;
use salestrack::cli::{run, Cli};
use salestrack::logging::init_cli_logger;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_cli_logger(cli.verbose);
    run(cli)
}
