//! Utilities for the deploy scripts.

use std::{str::FromStr, time::Duration};

use alloy::{
    network::Ethereum,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol_types::decode_revert_reason,
    transports::{http::reqwest::Url, TransportError},
};
use tracing::{info, warn};

use crate::{errors::DeployError, types::Network};

/// The provider type used by the scripts
pub type Wallet = DynProvider<Ethereum>;

/// Sets up a signing provider for the given network, returning it along with the
/// address of the signer.
///
/// A chain id mismatch between the RPC endpoint and the selected network is
/// logged but not fatal, so forks and custom nodes can still be targeted.
pub async fn setup_client(
    priv_key: &str,
    rpc_url: &str,
    network: Network,
) -> Result<(Wallet, Address), DeployError> {
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|_| DeployError::ClientInitialization("invalid private key".to_string()))?;
    let deployer = signer.address();

    let url = Url::parse(rpc_url)
        .map_err(|e| DeployError::ClientInitialization(format!("{rpc_url}: {e}")))?;
    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| DeployError::ClientInitialization(e.to_string()))?;
    if chain_id != network.chain_id() {
        warn!(
            "RPC reports chain id {} but {} expects {}",
            chain_id,
            network,
            network.chain_id()
        );
    }
    info!(
        "Connected to {} (chain id {}) as {}",
        network, chain_id, deployer
    );

    Ok((DynProvider::new(provider), deployer))
}

/// The most specific failure reason available from an RPC error.
///
/// Prefers the decoded revert reason carried in the error data, then the node's
/// error message, then the transport error itself.
pub fn revert_reason(err: &TransportError) -> String {
    match err.as_error_resp() {
        Some(payload) => payload
            .as_revert_data()
            .and_then(|data| decode_revert_reason(&data))
            .unwrap_or_else(|| payload.message.to_string()),
        None => err.to_string(),
    }
}

/// Sleep between transactions, skipping the await entirely for a zero delay
pub async fn throttle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        rpc::json_rpc::ErrorPayload,
        sol_types::{Revert, SolError},
    };

    use super::*;

    #[test]
    fn test_revert_reason_decodes_error_data() {
        let data = Revert {
            reason: "not a submitter".to_string(),
        }
        .abi_encode();
        let data = alloy::hex::encode_prefixed(data);
        let payload = ErrorPayload {
            code: 3,
            message: "execution reverted".into(),
            data: Some(serde_json::value::to_raw_value(&data).unwrap()),
        };
        let err = TransportError::ErrorResp(payload);
        assert_eq!(revert_reason(&err), "not a submitter");
    }

    #[test]
    fn test_revert_reason_falls_back_to_message() {
        let payload = ErrorPayload {
            code: -32000,
            message: "insufficient funds for gas * price + value".into(),
            data: None,
        };
        let err = TransportError::ErrorResp(payload);
        assert_eq!(
            revert_reason(&err),
            "insufficient funds for gas * price + value"
        );
    }

    #[tokio::test]
    async fn test_throttle_zero_returns_immediately() {
        throttle(Duration::ZERO).await;
    }
}
