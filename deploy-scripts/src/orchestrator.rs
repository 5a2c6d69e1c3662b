//! Sequential deployment and registration of a fixed contract list.
//!
//! One transaction is in flight at a time: later entries may depend on the
//! addresses of earlier ones, and the signer's nonces must stay ordered. The run
//! record is overwritten after every contract, so an interrupted run loses at
//! most the contract in flight. Re-running skips every contract whose registry
//! already lists the signer.

use std::{collections::HashMap, path::PathBuf, time::Duration};

use alloy::primitives::Address;
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::{
    client::ChainClient,
    constants::DEFAULT_TX_DELAY_MS,
    errors::DeployError,
    fees::{FeeDefaults, FeeOverrides},
    overrides::{Overrides, ResolutionContext},
    record::{DeploymentReport, RecordStore, ReportEntry, ResultEntry, RunRecord, TxOutcome},
    types::{ArgValue, ArgsSource, DeploymentSpec},
    utils::throttle,
};

/// Drives a list of [`DeploymentSpec`]s against a chain
pub struct Orchestrator<'a, C: ChainClient> {
    /// The chain to deploy to
    client: &'a C,
    /// Where run records and reports are persisted
    store: RecordStore,
    /// Constructor overrides, taking precedence over each spec's own arguments
    overrides: Overrides,
    /// The network name, used to key persisted records
    network: String,
    /// The pause after every mined transaction
    tx_delay: Duration,
}

impl<'a, C: ChainClient> Orchestrator<'a, C> {
    /// An orchestrator with no overrides and the default delay
    pub fn new(client: &'a C, store: RecordStore, network: impl Into<String>) -> Self {
        Self {
            client,
            store,
            overrides: Overrides::default(),
            network: network.into(),
            tx_delay: Duration::from_millis(DEFAULT_TX_DELAY_MS),
        }
    }

    /// Use the given constructor overrides
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Pause for `tx_delay` after every mined transaction
    pub fn with_tx_delay(mut self, tx_delay: Duration) -> Self {
        self.tx_delay = tx_delay;
        self
    }

    /// The addresses recorded by the previous run on this network
    pub fn prior_addresses(&self) -> HashMap<String, Address> {
        self.store.prior_addresses(&self.network)
    }

    /// The path the run record is persisted to
    pub fn run_record_path(&self) -> PathBuf {
        self.store.run_record_path(&self.network)
    }

    // ------------------
    // | Register Flow |
    // ------------------

    /// Deploy and register every spec in order, persisting the record after each.
    ///
    /// `prior` seeds dependency resolution with addresses from a previous run.
    /// Any failed transaction or unresolved dependency aborts the run; entries
    /// completed before it remain on disk.
    pub async fn run(
        &self,
        specs: &[DeploymentSpec],
        prior: HashMap<String, Address>,
    ) -> Result<RunRecord, DeployError> {
        let deployer = self.client.deployer();
        let mut ctx = ResolutionContext::new(prior);
        let mut record = RunRecord::new(&self.network, deployer);

        let initial = self.client.fee_snapshot().await?;
        let defaults = FeeDefaults::from_snapshot(&initial);
        debug!("Fee defaults for this run: {:?}", defaults);

        info!("Deployer: {}", deployer);
        info!("Network: {}", self.network);

        for spec in specs {
            let entry = self.process(spec, &mut ctx, &defaults).await?;
            record.contracts.push(entry);
            let path = self.store.save_run_record(&record)?;
            debug!(
                "Saved {} entries to {}",
                record.contracts.len(),
                path.display()
            );
        }

        info!(
            "Saved deployment record to {}",
            self.run_record_path().display()
        );
        log_summary(&record);
        Ok(record)
    }

    /// Handle a single spec, returning its result entry
    async fn process(
        &self,
        spec: &DeploymentSpec,
        ctx: &mut ResolutionContext,
        defaults: &FeeDefaults,
    ) -> Result<ResultEntry, DeployError> {
        if let Some(registry) = spec.registry {
            if self.already_registered(registry).await {
                return Ok(self.skip(spec, registry, ctx));
            }
        }

        info!("Deploying {}...", spec.name);
        let args = self.resolve_args(spec, ctx)?;
        if !args.is_empty() {
            info!("  Using args: [{}]", args.iter().join(", "));
        }

        let fees = self.next_fees(defaults).await?;
        let deployment = self.client.deploy(spec.name, &args, fees).await?;
        ctx.record(spec.name, Some(deployment.address));
        info!("  -> Address: {}", deployment.address);
        throttle(self.tx_delay).await;

        let tx_hash = match spec.registry {
            Some(registry) => {
                let fees = self.next_fees(defaults).await?;
                let gas_limit = spec.registration_gas_limit();
                let hash = self
                    .client
                    .register(registry, deployment.address, fees, gas_limit)
                    .await?;
                info!("  -> testContract tx: {:#x}", hash);
                throttle(self.tx_delay).await;
                TxOutcome::Registered(hash)
            }
            None => TxOutcome::NotApplicable,
        };

        Ok(ResultEntry {
            contract_name: spec.name.to_string(),
            deployed_address: Some(deployment.address),
            registry_address: spec.registry,
            tx_hash,
            deploy_tx_hash: Some(deployment.tx_hash),
        })
    }

    /// Whether `registry` already lists the signer; a failed query counts as no
    async fn already_registered(&self, registry: Address) -> bool {
        let deployer = self.client.deployer();
        match self.client.is_registered(registry, deployer).await {
            Ok(registered) => registered,
            Err(e) => {
                warn!("Could not query registry {}: {}", registry, e);
                false
            }
        }
    }

    /// The entry for a spec whose registry already lists the signer.
    ///
    /// The previous run's address is reused so dependents still resolve. With no
    /// previous address the entry is recorded without one, and any dependent
    /// fails to resolve.
    fn skip(
        &self,
        spec: &DeploymentSpec,
        registry: Address,
        ctx: &mut ResolutionContext,
    ) -> ResultEntry {
        info!(
            "{}: already registered, skipping deploy and test.",
            spec.name
        );
        let known = ctx.previous(spec.name);
        if known.is_none() {
            warn!("{}: no previously deployed address is known", spec.name);
        }
        ctx.record(spec.name, known);

        ResultEntry {
            contract_name: spec.name.to_string(),
            deployed_address: known,
            registry_address: Some(registry),
            tx_hash: TxOutcome::AlreadyRegistered,
            deploy_tx_hash: None,
        }
    }

    /// Constructor arguments: an override if present, else the deployment's resolver or
    /// static list
    fn resolve_args(
        &self,
        spec: &DeploymentSpec,
        ctx: &ResolutionContext,
    ) -> Result<Vec<ArgValue>, DeployError> {
        if let Some(tokens) = self.overrides.get(spec.name) {
            return ctx.resolve_tokens(tokens);
        }

        match &spec.args {
            ArgsSource::Resolver(resolver) => resolver(ctx),
            ArgsSource::Static(args) => Ok(args.clone()),
        }
    }

    /// Fees for the next transaction, from a fresh snapshot
    async fn next_fees(&self, defaults: &FeeDefaults) -> Result<FeeOverrides, DeployError> {
        let snapshot = self.client.fee_snapshot().await?;
        Ok(FeeOverrides::bumped(&snapshot, defaults))
    }

    // --------------------
    // | Deploy-All Flow |
    // --------------------

    /// Deploy every spec in order without registering, then write one report.
    ///
    /// Override placeholders resolve against this run's deployments only.
    pub async fn deploy_all(
        &self,
        specs: &[DeploymentSpec],
    ) -> Result<DeploymentReport, DeployError> {
        let deployer = self.client.deployer();
        let mut ctx = ResolutionContext::default();
        let mut report = DeploymentReport::new(&self.network, deployer);

        let defaults = FeeDefaults::from_snapshot(&self.client.fee_snapshot().await?);
        info!("Deploying with: {}", deployer);
        info!("Network: {}", self.network);

        for spec in specs {
            info!("Deploying {}...", spec.name);
            let args = self.resolve_args(spec, &ctx)?;
            if !args.is_empty() {
                info!("  Using args: [{}]", args.iter().join(", "));
            }

            let fees = self.next_fees(&defaults).await?;
            let deployment = self.client.deploy(spec.name, &args, fees).await?;
            ctx.record(spec.name, Some(deployment.address));
            info!("  Address: {}", deployment.address);
            info!("  Tx Hash: {:#x}", deployment.tx_hash);

            report.contracts.push(ReportEntry {
                name: spec.name.to_string(),
                address: deployment.address,
                tx_hash: deployment.tx_hash,
                args: args.iter().map(ArgValue::to_json).collect(),
            });
        }

        let path = self.store.save_report(&report)?;
        info!("Saved deployment data to {}", path.display());
        Ok(report)
    }
}

/// Log one line per entry of a finished run
fn log_summary(record: &RunRecord) {
    let or_null =
        |addr: Option<Address>| addr.map_or_else(|| "null".to_string(), |a| a.to_string());

    info!("=== Summary ===");
    for entry in &record.contracts {
        info!(
            "{} -> {} | registry: {} | tx: {}",
            entry.contract_name,
            or_null(entry.deployed_address),
            or_null(entry.registry_address),
            entry.tx_hash
        );
    }
}
