//! Definitions of CLI arguments and commands for deploy scripts

use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::{
    commands::{clear_progress, deploy_all, deploy_register, status},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_DIR, DEFAULT_OVERRIDES_PATH,
        DEFAULT_PROGRESS_PATH, DEFAULT_TX_DELAY_MS, TX_DELAY_ENV_VAR,
    },
    errors::DeployError,
    types::Network,
};

/// Deploy the Base Camp exercise contracts and register them with their registries
#[derive(Parser)]
#[command(version)]
pub struct Cli {
    /// Private key of the deployer
    #[arg(short, long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub priv_key: Option<String>,

    /// The network to target
    #[arg(
        short,
        long,
        env = "DEPLOY_NETWORK",
        value_enum,
        default_value_t = Network::BaseSepolia
    )]
    pub network: Network,

    /// Network RPC URL, defaulting to the network's public endpoint
    #[arg(short, long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Directory holding run records and deployment reports
    #[arg(short, long, default_value = DEFAULT_DEPLOYMENTS_DIR)]
    pub deployments_dir: PathBuf,

    /// Increase log verbosity; repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    DeployRegister(DeployRegisterArgs),
    DeployAll(DeployAllArgs),
    Status(StatusArgs),
    ClearProgress(ClearProgressArgs),
}

impl Command {
    pub async fn run(
        self,
        network: Network,
        priv_key: Option<&str>,
        rpc_url: &str,
        deployments_dir: &Path,
    ) -> Result<(), DeployError> {
        match self {
            Command::DeployRegister(args) => {
                deploy_register(args, network, priv_key, rpc_url, deployments_dir)
                    .await
            }
            Command::DeployAll(args) => {
                deploy_all(args, network, priv_key, rpc_url, deployments_dir)
                    .await
            }
            Command::Status(args) => status(args, network, priv_key),
            Command::ClearProgress(args) => clear_progress(args, network, priv_key),
        }
    }
}

/// Deploy every exercise contract and register it with its registry.
///
/// Contracts whose registry already lists the deployer are skipped, so an
/// interrupted run can simply be repeated.
#[derive(Args)]
pub struct DeployRegisterArgs {
    /// Constructor argument overrides, keyed by contract name
    #[arg(short, long, default_value = DEFAULT_OVERRIDES_PATH)]
    pub overrides: PathBuf,

    /// Root of the Hardhat compilation artifacts
    #[arg(short, long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// Pause after every mined transaction, in milliseconds
    #[arg(long, env = TX_DELAY_ENV_VAR, default_value_t = DEFAULT_TX_DELAY_MS)]
    pub tx_delay_ms: u64,

    /// Local progress file updated with the run's results
    #[arg(long, default_value = DEFAULT_PROGRESS_PATH)]
    pub progress_file: PathBuf,
}

/// Deploy every exercise contract without registering, and write a report
#[derive(Args)]
pub struct DeployAllArgs {
    /// Constructor argument overrides, keyed by contract name
    #[arg(short, long, default_value = DEFAULT_OVERRIDES_PATH)]
    pub overrides: PathBuf,

    /// Root of the Hardhat compilation artifacts
    #[arg(short, long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,
}

/// Show recorded progress for an account, grouped by learning module
#[derive(Args)]
pub struct StatusArgs {
    /// The account to show; defaults to the deployer
    #[arg(short, long)]
    pub account: Option<String>,

    /// Local progress file
    #[arg(long, default_value = DEFAULT_PROGRESS_PATH)]
    pub progress_file: PathBuf,
}

/// Forget recorded progress for an account
#[derive(Args)]
pub struct ClearProgressArgs {
    /// The account to clear; defaults to the deployer
    #[arg(short, long)]
    pub account: Option<String>,

    /// Only forget this task; otherwise the whole profile is cleared
    #[arg(short, long)]
    pub task: Option<String>,

    /// Local progress file
    #[arg(long, default_value = DEFAULT_PROGRESS_PATH)]
    pub progress_file: PathBuf,
}
