use std::env;

use clap::Parser as _;
use districtmap::DistrictMapResult;
use districtmap::args::Args;
use districtmap::config::{Config, read_config};
use districtmap::srv::new_server;
use log::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

async fn start(args: Args) -> DistrictMapResult<()> {
    info!("Starting districtmap v{VERSION}");

    let mut config = if let Some(ref cfg_filename) = args.meta.config {
        info!("Using {}", cfg_filename.display());
        read_config(cfg_filename)?
    } else {
        info!("Config file is not specified, using defaults");
        Config::default()
    };

    args.merge_into_config(&mut config, env::var("DATABASE_URL").ok());
    config.finalize()?;
    let state = config.resolve().await?;

    let (server, listen_addresses) = new_server(config.srv, state)?;
    info!("districtmap has been started on {listen_addresses}.");
    info!("Use http://{listen_addresses}/catalog to get the list of available sources.");

    server.await
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("districtmap=info,districtmap_core=info"),
    )
    .init();

    let args = Args::parse();
    if let Err(e) = start(args).await {
        // Ensure the message is printed, even if the logging is disabled
        if log::log_enabled!(log::Level::Error) {
            error!("{e}");
        } else {
            eprintln!("{e}");
        }
        std::process::exit(1);
    }
}
