use clap::Parser;

use wheelhouse::adapter::inbound::cli::command::Cli;
use wheelhouse::adapter::inbound::cli::output::{self, OutputConfig};
use wheelhouse::adapter::inbound::cli::run;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    if let Err(e) = run::run(cli).await {
        std::process::exit(run::report_error(&e));
    }
}
