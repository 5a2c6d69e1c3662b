use base_camp_deploy::{cli::Cli, errors::DeployError};
use clap::Parser;
use dotenv::dotenv;
use tracing::{warn, Level};

#[tokio::main]
async fn main() -> Result<(), DeployError> {
    dotenv().ok();

    let Cli {
        priv_key,
        network,
        rpc_url,
        deployments_dir,
        verbose,
        command,
    } = Cli::parse();

    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .pretty()
        .with_max_level(level)
        .init();

    if priv_key.is_none() {
        warn!("PRIVATE_KEY is not set");
    }
    let rpc_url = match rpc_url {
        Some(url) => url,
        None => network.default_rpc_url().to_string(),
    };

    command
        .run(network, priv_key.as_deref(), &rpc_url, &deployments_dir)
        .await
}
