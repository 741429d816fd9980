use clap::Parser;

use mortgage_sim::api::cli::{Cli, run};
use mortgage_sim::config::Settings;
use mortgage_sim::logging::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let settings = Settings::resolve(cli.store.clone(), cli.log_level.clone());
    init_logging(&settings.log_level);

    if let Err(e) = run(cli.command, &settings).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
