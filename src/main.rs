use clap::Parser;
use oddsync::cli::{self, Cli};
use tracing::info;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let config = match args.load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let _ = config.init_logging();
    info!(scope = %config.sync.scope, "oddsync starting");

    cli::run(config, args.stats_interval()).await;

    info!("oddsync stopped");
}
