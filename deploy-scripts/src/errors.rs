//! Definitions of errors that can occur while deploying and registering the contracts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur while deploying and registering the contracts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    /// An argument resolver or override referenced a contract with no known address
    DependencyUnresolved(String),
    /// A transaction was mined but reverted, or never confirmed
    TransactionReverted {
        /// What the transaction was doing, e.g. `deploy BasicMath`
        context: String,
        /// The most specific human-readable reason available
        reason: String,
    },
    /// The constructor override file could not be parsed
    MalformedOverrideFile(String),
    /// A previous run's record could not be parsed
    MalformedPriorRecord(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error reading or parsing a compilation artifact
    ArtifactParsing(String),
    /// Error encoding constructor arguments or calldata
    CalldataConstruction(String),
    /// Error calling a contract method or querying the node
    ContractInteraction(String),
    /// Error reading a file
    ReadFile(String),
    /// Error writing a file
    WriteFile(String),
}

impl DeployError {
    /// Shorthand for a [`DeployError::TransactionReverted`]
    pub fn reverted(context: impl Into<String>, reason: impl Into<String>) -> Self {
        DeployError::TransactionReverted {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

impl Display for DeployError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::DependencyUnresolved(name) => {
                write!(f, "dependency address for \"{}\" not found", name)
            }
            DeployError::TransactionReverted { context, reason } => {
                write!(f, "transaction reverted ({}): {}", context, reason)
            }
            DeployError::MalformedOverrideFile(s) => write!(f, "malformed override file: {}", s),
            DeployError::MalformedPriorRecord(s) => write!(f, "malformed prior record: {}", s),
            DeployError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            DeployError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            DeployError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            DeployError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            DeployError::ReadFile(s) => write!(f, "error reading file: {}", s),
            DeployError::WriteFile(s) => write!(f, "error writing file: {}", s),
        }
    }
}

impl Error for DeployError {}
