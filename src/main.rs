use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use scout::config::{Config, ConfigError};

/// Runs the scout bot.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Config file name
    #[arg(short, long, default_value = "scout.json")]
    config: PathBuf,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _guard = scout::logging::init(&args.config, args.debug);

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e @ ConfigError::ReadFile { .. }) => {
            error!("Unable to find {}: {e}", args.config.display());
            std::process::exit(2);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    info!("Successfully loaded config file {}!", args.config.display());

    scout::bot::run(config).await;
}
