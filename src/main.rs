//! tea - command line client for Gitea

use std::process::ExitCode;

use clap::Parser;
use tea_cli::cli::{init_tracing, run, Cli, Output};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = Output::new(cli.output, cli.verbose);

    if let Err(e) = run(cli, &output) {
        output.error(&format!("{:#}", e));
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
