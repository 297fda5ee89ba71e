//! smokehouse - smoke tests for the Lighthouse CLI
//!
//! Runs Lighthouse once per expectation and checks each result against a
//! partial expected result and a stderr snapshot.

use clap::Parser;
use smokehouse::commands::SmokeArgs;
use smokehouse::common::logging;
use smokehouse::cli;

#[tokio::main]
async fn main() {
    logging::init_cli();

    let args = SmokeArgs::parse();

    match cli::smoke(args).await {
        Ok(tally) => std::process::exit(tally.exit_code()),
        Err(e) => {
            cli::report_fatal(&e);
            std::process::exit(e.exit_code());
        }
    }
}
