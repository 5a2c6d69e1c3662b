//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::{Address, I256, U256},
};
use clap::ValueEnum;
use serde_json::Value;

use crate::{
    constants::DEFAULT_REGISTRATION_GAS_LIMIT, errors::DeployError, overrides::ResolutionContext,
};

// -------------------------
// | Constructor Arguments |
// -------------------------

/// A single constructor argument, before it is encoded against the contract's ABI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// An account or contract address
    Address(Address),
    /// An unsigned integer of arbitrary width
    Uint(U256),
    /// A signed integer of arbitrary width
    Int(I256),
    /// A boolean
    Bool(bool),
    /// A string
    Str(String),
}

impl ArgValue {
    /// Convert the argument into a value of the given Solidity type.
    ///
    /// Exact matches are passed through once integers are checked against the
    /// parameter's width; anything else is coerced from the argument's textual
    /// form, so e.g. an integer may feed a `string` parameter.
    pub fn to_sol_value(&self, ty: &DynSolType) -> Result<DynSolValue, DeployError> {
        match (self, ty) {
            (ArgValue::Address(addr), DynSolType::Address) => Ok(DynSolValue::Address(*addr)),
            (ArgValue::Uint(value), DynSolType::Uint(bits)) => {
                self.check_width(ty, value.bit_len(), *bits)?;
                Ok(DynSolValue::Uint(*value, *bits))
            }
            (ArgValue::Int(value), DynSolType::Int(bits)) => {
                self.check_width(ty, value.bits() as usize, *bits)?;
                Ok(DynSolValue::Int(*value, *bits))
            }
            (ArgValue::Bool(value), DynSolType::Bool) => Ok(DynSolValue::Bool(*value)),
            (ArgValue::Str(value), DynSolType::String) => Ok(DynSolValue::String(value.clone())),
            (value, ty) => ty.coerce_str(&value.to_string()).map_err(|e| {
                DeployError::CalldataConstruction(format!("cannot encode `{value}` as {ty}: {e}"))
            }),
        }
    }

    /// Reject an integer that needs more than `bits` bits to represent
    fn check_width(&self, ty: &DynSolType, needed: usize, bits: usize) -> Result<(), DeployError> {
        if needed > bits {
            return Err(DeployError::CalldataConstruction(format!(
                "`{self}` is out of range for {ty}"
            )));
        }
        Ok(())
    }

    /// The JSON form of the argument, as written to deployment reports
    pub fn to_json(&self) -> Value {
        match self {
            ArgValue::Uint(value) => match u64::try_from(*value) {
                Ok(small) => Value::from(small),
                Err(_) => Value::String(value.to_string()),
            },
            ArgValue::Bool(value) => Value::Bool(*value),
            other => Value::String(other.to_string()),
        }
    }
}

impl Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Address(addr) => write!(f, "{}", addr),
            ArgValue::Uint(value) => write!(f, "{}", value),
            ArgValue::Int(value) => write!(f, "{}", value),
            ArgValue::Bool(value) => write!(f, "{}", value),
            ArgValue::Str(value) => write!(f, "{}", value),
        }
    }
}

impl From<Address> for ArgValue {
    fn from(value: Address) -> Self {
        ArgValue::Address(value)
    }
}

impl From<U256> for ArgValue {
    fn from(value: U256) -> Self {
        ArgValue::Uint(value)
    }
}

impl From<u64> for ArgValue {
    fn from(value: u64) -> Self {
        ArgValue::Uint(U256::from(value))
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Str(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Str(value)
    }
}

// ---------------
// | Deployments |
// ---------------

/// Computes constructor arguments from the addresses deployed so far
pub type ArgsResolver = fn(&ResolutionContext) -> Result<Vec<ArgValue>, DeployError>;

/// Where a deployment's constructor arguments come from
#[derive(Debug, Clone)]
pub enum ArgsSource {
    /// A fixed argument list
    Static(Vec<ArgValue>),
    /// Arguments computed from earlier deployments at run time
    Resolver(ArgsResolver),
}

/// One entry in a fixed processing list
#[derive(Debug, Clone)]
pub struct DeploymentSpec {
    /// The artifact name of the contract, unique within a list
    pub name: &'static str,
    /// The constructor arguments
    pub args: ArgsSource,
    /// The registry to notify once the contract is live
    pub registry: Option<Address>,
    /// The gas ceiling for the registration call
    pub gas_limit: Option<u64>,
    /// The learning module this contract belongs to
    pub group: TaskGroup,
}

impl DeploymentSpec {
    /// A spec with no constructor arguments and no registry
    pub fn new(name: &'static str, group: TaskGroup) -> Self {
        Self {
            name,
            args: ArgsSource::Static(Vec::new()),
            registry: None,
            gas_limit: None,
            group,
        }
    }

    /// Set a fixed constructor argument list
    pub fn with_args(mut self, args: Vec<ArgValue>) -> Self {
        self.args = ArgsSource::Static(args);
        self
    }

    /// Compute constructor arguments from earlier deployments
    pub fn with_resolver(mut self, resolver: ArgsResolver) -> Self {
        self.args = ArgsSource::Resolver(resolver);
        self
    }

    /// Register the deployed contract with the given registry
    pub fn with_registry(mut self, registry: Address) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Override the registration call's gas ceiling
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// The gas ceiling to use for the registration call
    pub fn registration_gas_limit(&self) -> u64 {
        self.gas_limit.unwrap_or(DEFAULT_REGISTRATION_GAS_LIMIT)
    }
}

/// The learning modules the contracts are grouped into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskGroup {
    /// Deploying to the right network at all
    Warmup,
    /// Arrays, mappings, and structs
    Newcomer,
    /// Control flow and errors
    Acolyte,
    /// Tokens and voting
    Prefect,
    /// NFTs, imports, factories, and inheritance
    Supreme,
}

impl TaskGroup {
    /// Every group, in display order
    pub const ALL: [TaskGroup; 5] = [
        TaskGroup::Warmup,
        TaskGroup::Newcomer,
        TaskGroup::Acolyte,
        TaskGroup::Prefect,
        TaskGroup::Supreme,
    ];

    /// The heading shown for the group
    pub fn title(&self) -> &'static str {
        match self {
            TaskGroup::Warmup => "Kickoff",
            TaskGroup::Newcomer => "Newcomer Badge",
            TaskGroup::Acolyte => "Acolyte Badge",
            TaskGroup::Prefect => "Prefect Badge",
            TaskGroup::Supreme => "Supreme Badge",
        }
    }
}

// ------------
// | Networks |
// ------------

/// The networks the scripts know how to target
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Network {
    /// Base mainnet
    #[value(name = "base")]
    Base,
    /// Base Sepolia testnet
    #[value(name = "baseSepolia", alias = "base-sepolia")]
    BaseSepolia,
    /// A local development node
    #[value(name = "localhost")]
    Localhost,
}

impl Network {
    /// The chain id the network is expected to report
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Base => 8453,
            Network::BaseSepolia => 84532,
            Network::Localhost => 31337,
        }
    }

    /// The public RPC endpoint used when none is configured
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Base => "https://mainnet.base.org",
            Network::BaseSepolia => "https://sepolia.base.org",
            Network::Localhost => "http://127.0.0.1:8545",
        }
    }

    /// The block explorer for the network, if it has one
    pub fn explorer_url(&self) -> Option<&'static str> {
        match self {
            Network::Base => Some("https://basescan.org"),
            Network::BaseSepolia => Some("https://sepolia.basescan.org"),
            Network::Localhost => None,
        }
    }

    /// A link to a transaction on the network's explorer
    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url()
            .map(|base| format!("{base}/tx/{tx_hash}"))
    }

    /// A link to an address on the network's explorer
    pub fn explorer_address_url(&self, address: &Address) -> Option<String> {
        self.explorer_url()
            .map(|base| format!("{base}/address/{address}"))
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Base => write!(f, "base"),
            Network::BaseSepolia => write!(f, "baseSepolia"),
            Network::Localhost => write!(f, "localhost"),
        }
    }
}

/// Shorten an address for display, keeping `size` hex characters at each end
pub fn format_address(address: &Address, size: usize) -> String {
    let full = address.to_string();
    let tail_start = full.len().saturating_sub(size);
    if size + 2 >= tail_start {
        return full;
    }
    format!("{}…{}", &full[..size + 2], &full[tail_start..])
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    #[test]
    fn test_explorer_links() {
        let addr = address!("0x075eb9dc52177aa3492e1d26f0fde3d729625d2f");
        assert_eq!(
            Network::Base.explorer_tx_url("0xabc").as_deref(),
            Some("https://basescan.org/tx/0xabc")
        );
        let url = Network::BaseSepolia.explorer_address_url(&addr).unwrap();
        assert_eq!(
            url.to_lowercase(),
            "https://sepolia.basescan.org/address/0x075eb9dc52177aa3492e1d26f0fde3d729625d2f"
        );
        assert!(Network::Localhost.explorer_tx_url("0xabc").is_none());
    }

    #[test]
    fn test_format_address() {
        let addr = address!("0x075eb9dc52177aa3492e1d26f0fde3d729625d2f");
        let short = format_address(&addr, 4);
        assert_eq!(short.to_lowercase(), "0x075e…5d2f");
    }

    #[test]
    fn test_coerce_uint_into_string_param() {
        let value = ArgValue::Uint(U256::from(1234u64));
        let encoded = value.to_sol_value(&DynSolType::String).unwrap();
        assert_eq!(encoded, DynSolValue::String("1234".to_string()));
    }

    #[test]
    fn test_coerce_rejects_bad_address() {
        let value = ArgValue::from("not an address");
        assert!(matches!(
            value.to_sol_value(&DynSolType::Address),
            Err(DeployError::CalldataConstruction(_))
        ));
    }

    #[test]
    fn test_uint_wider_than_param_is_rejected() {
        let too_wide = ArgValue::Uint(U256::from(70_000u64));
        assert!(matches!(
            too_wide.to_sol_value(&DynSolType::Uint(16)),
            Err(DeployError::CalldataConstruction(_))
        ));

        let max = ArgValue::Uint(U256::from(u16::MAX));
        let encoded = max.to_sol_value(&DynSolType::Uint(16)).unwrap();
        assert_eq!(encoded, DynSolValue::Uint(U256::from(u16::MAX), 16));
    }

    #[test]
    fn test_int_wider_than_param_is_rejected() {
        let int8 = DynSolType::Int(8);
        let int = |value: i64| ArgValue::Int(I256::try_from(value).unwrap());

        assert!(int(-128).to_sol_value(&int8).is_ok());
        assert!(int(127).to_sol_value(&int8).is_ok());
        assert!(matches!(
            int(128).to_sol_value(&int8),
            Err(DeployError::CalldataConstruction(_))
        ));
        assert!(matches!(
            int(-129).to_sol_value(&int8),
            Err(DeployError::CalldataConstruction(_))
        ));
    }

    #[test]
    fn test_large_uint_reported_as_string() {
        let value = ArgValue::Uint(U256::MAX);
        assert!(value.to_json().is_string());
        assert_eq!(ArgValue::from(1000u64).to_json(), Value::from(1000u64));
    }
}
