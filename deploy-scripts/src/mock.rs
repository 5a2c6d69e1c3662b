//! An in-memory [`ChainClient`] for exercising runs without a node

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;

use crate::{
    client::{ChainClient, Deployment},
    errors::DeployError,
    fees::{FeeOverrides, FeeSnapshot},
    types::ArgValue,
};

/// A chain operation observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// A fee snapshot was requested
    FeeSnapshot,
    /// A registry was asked whether the deployer has passed
    IsRegistered {
        /// The registry queried
        registry: Address,
    },
    /// A contract was deployed
    Deploy {
        /// The contract name
        contract: String,
        /// The constructor arguments
        args: Vec<ArgValue>,
        /// The fees attached to the transaction
        fees: FeeOverrides,
    },
    /// A registration call was sent
    Register {
        /// The registry called
        registry: Address,
        /// The submitted contract
        submission: Address,
        /// The fees attached to the transaction
        fees: FeeOverrides,
        /// The gas ceiling of the call
        gas_limit: u64,
    },
}

/// Mutable state behind the mock
#[derive(Debug, Default)]
struct MockState {
    /// Registries that already list the deployer
    registered: HashSet<Address>,
    /// Registries whose `owners` call fails
    broken_views: HashSet<Address>,
    /// Registries whose `testContract` call reverts, with the reason
    registration_reverts: HashMap<Address, String>,
    /// Contracts whose deployment reverts, with the reason
    deploy_reverts: HashMap<String, String>,
    /// Transactions mined so far
    tx_count: u64,
    /// Every operation, in order
    calls: Vec<MockCall>,
}

/// A chain that mines every transaction instantly at deterministic addresses
#[derive(Debug)]
pub struct MockChain {
    /// The signer
    deployer: Address,
    /// The snapshot returned for every fee query
    snapshot: FeeSnapshot,
    /// See [`MockState`]
    state: Mutex<MockState>,
}

impl MockChain {
    /// A fresh chain where nothing is registered
    pub fn new(deployer: Address) -> Self {
        Self {
            deployer,
            snapshot: FeeSnapshot::default(),
            state: Mutex::default(),
        }
    }

    /// Report `snapshot` for every fee query
    pub fn with_fee_snapshot(mut self, snapshot: FeeSnapshot) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Mark the deployer as already registered with `registry`
    pub fn with_registered(self, registry: Address) -> Self {
        self.state().registered.insert(registry);
        self
    }

    /// Make `owners` calls against `registry` fail
    pub fn with_broken_view(self, registry: Address) -> Self {
        self.state().broken_views.insert(registry);
        self
    }

    /// Revert every registration with `registry`
    pub fn with_registration_revert(self, registry: Address, reason: &str) -> Self {
        self.state()
            .registration_reverts
            .insert(registry, reason.to_string());
        self
    }

    /// Revert every deployment of `contract`
    pub fn with_deploy_revert(self, contract: &str, reason: &str) -> Self {
        self.state()
            .deploy_reverts
            .insert(contract.to_string(), reason.to_string());
        self
    }

    /// Every operation observed so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    /// The number of transactions mined so far
    pub fn tx_count(&self) -> u64 {
        self.state().tx_count
    }

    /// The names of the contracts deployed so far, in order
    pub fn deployed_contracts(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::Deploy { contract, .. } => Some(contract.clone()),
                _ => None,
            })
            .collect()
    }

    /// The address the `n`th mined transaction deploys to, counting from one
    pub fn contract_address(n: u64) -> Address {
        let mut bytes = [0u8; 20];
        bytes[0] = 0xc0;
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Address::from(bytes)
    }

    /// The hash of the `n`th mined transaction, counting from one
    pub fn tx_hash(n: u64) -> TxHash {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        TxHash::from(bytes)
    }

    /// Lock the state, ignoring poisoning from a panicked test thread
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn deployer(&self) -> Address {
        self.deployer
    }

    async fn fee_snapshot(&self) -> Result<FeeSnapshot, DeployError> {
        self.state().calls.push(MockCall::FeeSnapshot);
        Ok(self.snapshot)
    }

    async fn is_registered(&self, registry: Address, owner: Address) -> Result<bool, DeployError> {
        let mut state = self.state();
        state.calls.push(MockCall::IsRegistered { registry });
        if state.broken_views.contains(&registry) {
            return Err(DeployError::ContractInteraction(format!("owners({owner}) failed")));
        }
        Ok(owner == self.deployer && state.registered.contains(&registry))
    }

    async fn deploy(
        &self,
        contract: &str,
        args: &[ArgValue],
        fees: FeeOverrides,
    ) -> Result<Deployment, DeployError> {
        let mut state = self.state();
        state.calls.push(MockCall::Deploy {
            contract: contract.to_string(),
            args: args.to_vec(),
            fees,
        });
        if let Some(reason) = state.deploy_reverts.get(contract) {
            return Err(DeployError::reverted(format!("deploy {contract}"), reason.clone()));
        }

        state.tx_count += 1;
        let n = state.tx_count;
        Ok(Deployment {
            address: Self::contract_address(n),
            tx_hash: Self::tx_hash(n),
        })
    }

    async fn register(
        &self,
        registry: Address,
        submission: Address,
        fees: FeeOverrides,
        gas_limit: u64,
    ) -> Result<TxHash, DeployError> {
        let mut state = self.state();
        state.calls.push(MockCall::Register {
            registry,
            submission,
            fees,
            gas_limit,
        });
        if let Some(reason) = state.registration_reverts.get(&registry) {
            return Err(DeployError::reverted(
                format!("testContract({submission}) on {registry}"),
                reason.clone(),
            ));
        }

        state.tx_count += 1;
        state.registered.insert(registry);
        Ok(Self::tx_hash(state.tx_count))
    }
}
