//! Implementations of the various deploy scripts

use std::{path::Path, str::FromStr, time::Duration};

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use tracing::{info, warn};

use crate::{
    artifacts::ArtifactStore,
    cli::{ClearProgressArgs, DeployAllArgs, DeployRegisterArgs, StatusArgs},
    client::AlloyClient,
    errors::DeployError,
    orchestrator::Orchestrator,
    overrides::Overrides,
    progress::{profile_key, ProgressStore, TaskProgress},
    record::{RecordStore, RunRecord},
    registrations::{deploy_all_list, registrations},
    types::{format_address, DeploymentSpec, Network, TaskGroup},
    utils::setup_client,
};

/// Deploy and register every exercise contract, then fold the results into the
/// deployer's progress profile
pub async fn deploy_register(
    args: DeployRegisterArgs,
    network: Network,
    priv_key: Option<&str>,
    rpc_url: &str,
    deployments_dir: &Path,
) -> Result<(), DeployError> {
    let priv_key = require_key(priv_key)?;
    let (provider, deployer) = setup_client(priv_key, rpc_url, network).await?;
    let client = AlloyClient::new(provider, deployer, ArtifactStore::new(&args.artifacts_dir));
    let store = RecordStore::new(deployments_dir);

    let orchestrator = Orchestrator::new(&client, store.clone(), network.to_string())
        .with_overrides(Overrides::load(&args.overrides))
        .with_tx_delay(Duration::from_millis(args.tx_delay_ms));

    let prior = orchestrator.prior_addresses();
    let outcome = orchestrator.run(&registrations(), prior).await;

    // Whatever reached disk, including a partial run, is worth remembering
    let key = profile_key(network.chain_id(), &deployer);
    match store.load_run_record(&network.to_string()) {
        Ok(Some(record)) => save_progress(&args.progress_file, &key, &record),
        Ok(None) => {}
        Err(e) => warn!("Not updating progress: {}", e),
    }

    outcome.map(|_| ())
}

/// Deploy every contract in the deploy-all list and write a deployment report
pub async fn deploy_all(
    args: DeployAllArgs,
    network: Network,
    priv_key: Option<&str>,
    rpc_url: &str,
    deployments_dir: &Path,
) -> Result<(), DeployError> {
    let priv_key = require_key(priv_key)?;
    let (provider, deployer) = setup_client(priv_key, rpc_url, network).await?;
    let client = AlloyClient::new(provider, deployer, ArtifactStore::new(&args.artifacts_dir));

    let store = RecordStore::new(deployments_dir);
    let report = Orchestrator::new(&client, store, network.to_string())
        .with_overrides(Overrides::load(&args.overrides))
        .with_tx_delay(Duration::ZERO)
        .deploy_all(&deploy_all_list())
        .await?;

    info!("Deployed {} contracts", report.contracts.len());
    Ok(())
}

/// Print recorded progress for an account, grouped by learning module
pub fn status(
    args: StatusArgs,
    network: Network,
    priv_key: Option<&str>,
) -> Result<(), DeployError> {
    let account = resolve_account(args.account.as_deref(), priv_key)?;
    let key = profile_key(network.chain_id(), &account);
    let progress = ProgressStore::load(&args.progress_file);
    let task = |spec: &DeploymentSpec| progress.task(&key, spec.name);

    println!("Progress for {} on {}", account, network);
    let specs = registrations();
    for group in TaskGroup::ALL {
        let tasks: Vec<&DeploymentSpec> = specs.iter().filter(|spec| spec.group == group).collect();
        let done = tasks
            .iter()
            .filter(|&&spec| task(spec).is_some_and(|done| done.is_complete(spec)))
            .count();

        println!("\n{} ({}/{})", group.title(), done, tasks.len());
        for spec in tasks {
            println!("  {}", describe_task(spec, task(spec), network));
        }
    }

    Ok(())
}

/// Forget one task, or a whole profile, from the progress file
pub fn clear_progress(
    args: ClearProgressArgs,
    network: Network,
    priv_key: Option<&str>,
) -> Result<(), DeployError> {
    let account = resolve_account(args.account.as_deref(), priv_key)?;
    let key = profile_key(network.chain_id(), &account);
    let mut progress = ProgressStore::load(&args.progress_file);

    let (removed, what) = match &args.task {
        Some(task) => {
            let what = format!("{task} for {key}");
            (progress.clear_task(&key, task)?, what)
        }
        None => (progress.clear_profile(&key)?, key.clone()),
    };

    if removed {
        info!("Cleared progress: {}", what);
    } else {
        info!("No progress recorded: {}", what);
    }
    Ok(())
}

// -----------
// | Helpers |
// -----------

/// The private key, which every transacting command needs
fn require_key(priv_key: Option<&str>) -> Result<&str, DeployError> {
    priv_key.ok_or_else(|| {
        DeployError::ClientInitialization(
            "no private key; set PRIVATE_KEY or pass --priv-key".to_string(),
        )
    })
}

/// The account named on the command line, else the one behind the private key
fn resolve_account(account: Option<&str>, priv_key: Option<&str>) -> Result<Address, DeployError> {
    match account {
        Some(account) => Address::from_str(account)
            .map_err(|e| DeployError::ClientInitialization(format!("{account}: {e}"))),
        None => PrivateKeySigner::from_str(require_key(priv_key)?)
            .map(|signer| signer.address())
            .map_err(|_| DeployError::ClientInitialization("invalid private key".to_string())),
    }
}

/// Merge a run record into the progress file, logging rather than failing
fn save_progress(path: &Path, key: &str, record: &RunRecord) {
    let mut progress = ProgressStore::load(path);
    match progress.record_run(key, record) {
        Ok(()) => info!("Updated progress for {} in {}", key, path.display()),
        Err(e) => warn!("Failed to update progress in {}: {}", path.display(), e),
    }
}

/// One status line: completion state, name, and links to whatever is known
fn describe_task(spec: &DeploymentSpec, task: Option<&TaskProgress>, network: Network) -> String {
    let state = match task {
        Some(progress) if progress.is_complete(spec) => "done",
        Some(progress) if progress.is_deployed() => "deployed",
        _ => "todo",
    };
    let mut line = format!("[{state:^8}] {}", spec.name);

    let progress = match task {
        Some(progress) => progress,
        None => return line,
    };
    if let Some(address) = progress.deployed_address {
        let link = network
            .explorer_address_url(&address)
            .unwrap_or_else(|| format_address(&address, 4));
        line.push_str(&format!(" | contract: {link}"));
    }
    if let Some(hash) = progress.registry_tx {
        let hash = format!("{hash:#x}");
        let link = network.explorer_tx_url(&hash).unwrap_or(hash);
        line.push_str(&format!(" | registry tx: {link}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, b256};

    use super::*;

    const CONTRACT: Address = address!("0x00000000000000000000000000000000000000a1");

    #[test]
    fn test_describe_pending_task() {
        let spec = DeploymentSpec::new("Manager", TaskGroup::Supreme);
        assert_eq!(
            describe_task(&spec, None, Network::Base),
            "[  todo  ] Manager"
        );
    }

    #[test]
    fn test_describe_completed_task_links_explorer() {
        let spec = DeploymentSpec::new("BasicMath", TaskGroup::Warmup)
            .with_registry(CONTRACT);
        let progress = TaskProgress {
            deployed_address: Some(CONTRACT),
            registry_tx: Some(b256!(
                "0x00000000000000000000000000000000000000000000000000000000000000ff"
            )),
            ..Default::default()
        };

        let line = describe_task(&spec, Some(&progress), Network::BaseSepolia);
        let line = line.to_lowercase();
        assert!(line.starts_with("[  done  ] basicmath"));
        assert!(line.contains(
            "https://sepolia.basescan.org/address/0x00000000000000000000000000000000000000a1"
        ));
        assert!(line.contains("https://sepolia.basescan.org/tx/0x"));
    }

    #[test]
    fn test_describe_local_task_shortens_address() {
        let spec = DeploymentSpec::new("Manager", TaskGroup::Supreme);
        let progress = TaskProgress {
            deployed_address: Some(CONTRACT),
            ..Default::default()
        };

        let line = describe_task(&spec, Some(&progress), Network::Localhost);
        let line = line.to_lowercase();
        assert_eq!(line, "[  done  ] manager | contract: 0x0000…00a1");
    }

    #[test]
    fn test_resolve_account() {
        let account = "0x00000000000000000000000000000000000000a1";
        assert_eq!(resolve_account(Some(account), None).unwrap(), CONTRACT);
        assert!(resolve_account(None, None).is_err());

        // First default Anvil account
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        assert_eq!(
            resolve_account(None, Some(key)).unwrap(),
            address!("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")
        );
    }
}
