//! The chain operations a run depends on, and their implementation over an
//! alloy provider

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, TxHash},
    providers::{PendingTransactionError, Provider, WatchTxError},
    rpc::types::{BlockId, BlockNumberOrTag, TransactionReceipt, TransactionRequest},
    sol_types::SolCall,
};
use async_trait::async_trait;
use tracing::debug;

use crate::{
    artifacts::ArtifactStore,
    constants::RECEIPT_TIMEOUT,
    errors::DeployError,
    fees::{FeeOverrides, FeeSnapshot},
    solidity::IRegistry,
    types::ArgValue,
    utils::{revert_reason, Wallet},
};

/// A contract deployed on-chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    /// The address of the new contract
    pub address: Address,
    /// The creation transaction
    pub tx_hash: TxHash,
}

/// The chain operations needed to deploy and register contracts
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The account signing every transaction
    fn deployer(&self) -> Address;

    /// The fee fields the network currently reports
    async fn fee_snapshot(&self) -> Result<FeeSnapshot, DeployError>;

    /// Whether `registry` already lists `owner` as having passed
    async fn is_registered(&self, registry: Address, owner: Address) -> Result<bool, DeployError>;

    /// Deploy the contract called `contract` and wait for it to be mined
    async fn deploy(
        &self,
        contract: &str,
        args: &[ArgValue],
        fees: FeeOverrides,
    ) -> Result<Deployment, DeployError>;

    /// Submit `submission` to `registry` and wait for the call to be mined
    async fn register(
        &self,
        registry: Address,
        submission: Address,
        fees: FeeOverrides,
        gas_limit: u64,
    ) -> Result<TxHash, DeployError>;
}

/// A [`ChainClient`] backed by a signing provider and local compilation artifacts
#[derive(Clone)]
pub struct AlloyClient {
    /// The signing provider
    provider: Wallet,
    /// The signer's address
    deployer: Address,
    /// Where contract bytecode and ABIs are read from
    artifacts: ArtifactStore,
}

impl AlloyClient {
    /// Wrap a provider that signs as `deployer`
    pub fn new(provider: Wallet, deployer: Address, artifacts: ArtifactStore) -> Self {
        Self {
            provider,
            deployer,
            artifacts,
        }
    }

    /// Send a transaction and wait for a successful receipt
    async fn send_and_confirm(
        &self,
        tx: TransactionRequest,
        context: &str,
    ) -> Result<TransactionReceipt, DeployError> {
        let pending = self
            .provider
            .send_transaction(tx.clone())
            .await
            .map_err(|e| DeployError::reverted(context, revert_reason(&e)))?;
        debug!("{}: submitted {:#x}", context, pending.tx_hash());

        let receipt = pending
            .with_timeout(Some(RECEIPT_TIMEOUT))
            .get_receipt()
            .await
            .map_err(|e| DeployError::reverted(context, unconfirmed_reason(&e)))?;
        if receipt.status() {
            return Ok(receipt);
        }

        let reason = self
            .replay_failure(tx, receipt.block_number)
            .await
            .unwrap_or_else(|| format!("transaction {:#x} reverted", receipt.transaction_hash));
        Err(DeployError::reverted(context, reason))
    }

    /// Re-execute a reverted transaction against its block to recover the reason
    async fn replay_failure(&self, tx: TransactionRequest, block: Option<u64>) -> Option<String> {
        let block = block.map(BlockId::number).unwrap_or(BlockId::latest());
        let tx = tx.with_from(self.deployer);
        match self.provider.call(tx).block(block).await {
            Err(e) => Some(revert_reason(&e)),
            Ok(_) => None,
        }
    }
}

/// Why waiting for a receipt failed, naming the timeout when that is the cause
fn unconfirmed_reason(err: &PendingTransactionError) -> String {
    match err {
        PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
            format!("not confirmed within {}s", RECEIPT_TIMEOUT.as_secs())
        }
        other => other.to_string(),
    }
}

#[async_trait]
impl ChainClient for AlloyClient {
    fn deployer(&self) -> Address {
        self.deployer
    }

    async fn fee_snapshot(&self) -> Result<FeeSnapshot, DeployError> {
        let gas_price = self.provider.get_gas_price().await.ok();
        let max_priority_fee_per_gas = self.provider.get_max_priority_fee_per_gas().await.ok();
        let base_fee = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| DeployError::ContractInteraction(e.to_string()))?
            .and_then(|block| block.header.base_fee_per_gas);

        // Same derivation as most wallets: twice the base fee plus the tip
        let max_fee_per_gas = base_fee.map(|base| {
            u128::from(base)
                .saturating_mul(2)
                .saturating_add(max_priority_fee_per_gas.unwrap_or_default())
        });

        Ok(FeeSnapshot {
            max_fee_per_gas,
            max_priority_fee_per_gas,
            gas_price,
        })
    }

    async fn is_registered(&self, registry: Address, owner: Address) -> Result<bool, DeployError> {
        IRegistry::new(registry, &self.provider)
            .owners(owner)
            .call()
            .await
            .map_err(|e| DeployError::ContractInteraction(format!("owners({owner}): {e}")))
    }

    async fn deploy(
        &self,
        contract: &str,
        args: &[ArgValue],
        fees: FeeOverrides,
    ) -> Result<Deployment, DeployError> {
        let context = format!("deploy {contract}");
        let code = self.artifacts.load(contract)?.deploy_code(args)?;
        let tx = TransactionRequest::default().with_deploy_code(code);
        let tx = fees.apply(tx);

        let receipt = self.send_and_confirm(tx, &context).await?;
        let address = receipt
            .contract_address
            .ok_or_else(|| DeployError::reverted(&context, "receipt has no contract address"))?;

        Ok(Deployment {
            address,
            tx_hash: receipt.transaction_hash,
        })
    }

    async fn register(
        &self,
        registry: Address,
        submission: Address,
        fees: FeeOverrides,
        gas_limit: u64,
    ) -> Result<TxHash, DeployError> {
        let context = format!("testContract({submission}) on {registry}");
        let calldata = IRegistry::testContractCall { submission }.abi_encode();
        let tx = TransactionRequest::default()
            .with_to(registry)
            .with_input(calldata)
            .with_gas_limit(gas_limit);

        let receipt = self.send_and_confirm(fees.apply(tx), &context).await?;
        Ok(receipt.transaction_hash)
    }
}
