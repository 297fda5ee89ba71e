//! compare-timings - collect and summarize Lighthouse timing measurements

use clap::Parser;
use smokehouse::cli;
use smokehouse::commands::TimingArgs;
use smokehouse::common::logging;

#[tokio::main]
async fn main() {
    logging::init_cli();

    let args = TimingArgs::parse();

    if let Err(e) = cli::timings(args).await {
        cli::report_fatal(&e);
        std::process::exit(e.exit_code());
    }
}
