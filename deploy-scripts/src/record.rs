//! Persisted outcomes of deployment runs, one file per network

use std::{
    collections::HashMap,
    fmt::{self, Display},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::primitives::{Address, TxHash};
use chrono::{SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{
    constants::{
        ALREADY_REGISTERED_SENTINEL, DEPLOYMENT_REPORT_SUFFIX, NOT_APPLICABLE_SENTINEL,
        RUN_RECORD_SUFFIX, TEMP_FILE_EXTENSION,
    },
    errors::DeployError,
};

// ---------------
// | Run Records |
// ---------------

/// What happened on the registry side for one contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TxOutcome {
    /// The registration call was mined in this transaction
    Registered(TxHash),
    /// The registry already listed the deployer, so nothing was sent
    AlreadyRegistered,
    /// The contract has no registry
    NotApplicable,
}

impl Display for TxOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxOutcome::Registered(hash) => write!(f, "{hash:#x}"),
            TxOutcome::AlreadyRegistered => write!(f, "{ALREADY_REGISTERED_SENTINEL}"),
            TxOutcome::NotApplicable => write!(f, "{NOT_APPLICABLE_SENTINEL}"),
        }
    }
}

impl From<TxOutcome> for String {
    fn from(outcome: TxOutcome) -> Self {
        outcome.to_string()
    }
}

impl TryFrom<String> for TxOutcome {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            ALREADY_REGISTERED_SENTINEL => Ok(TxOutcome::AlreadyRegistered),
            NOT_APPLICABLE_SENTINEL => Ok(TxOutcome::NotApplicable),
            hash => TxHash::from_str(hash)
                .map(TxOutcome::Registered)
                .map_err(|e| format!("invalid txHash {hash}: {e}")),
        }
    }
}

/// The outcome of one contract within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    /// The contract's artifact name
    #[serde(alias = "name")]
    pub contract_name: String,
    /// Where the contract lives; `None` if it was skipped with no known address
    pub deployed_address: Option<Address>,
    /// The registry notified about the contract
    #[serde(rename = "registry")]
    pub registry_address: Option<Address>,
    /// The registration transaction, or why there is none
    pub tx_hash: TxOutcome,
    /// The deployment transaction, absent for skipped contracts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_tx_hash: Option<TxHash>,
}

/// The persisted outcome of a register run on one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// The network name
    pub network: String,
    /// When the run started, as an ISO-8601 timestamp
    pub deployed_at: String,
    /// The account that signed every transaction in the run
    pub deployer: Address,
    /// One entry per completed contract, in processing order
    pub contracts: Vec<ResultEntry>,
}

impl RunRecord {
    /// An empty record for a run starting now
    pub fn new(network: impl Into<String>, deployer: Address) -> Self {
        Self {
            network: network.into(),
            deployed_at: now_iso8601(),
            deployer,
            contracts: Vec::new(),
        }
    }
}

/// The subset of a previous run record needed to resume.
///
/// Parsed leniently, so records written by older tooling still seed addresses.
#[derive(Debug, Default, Deserialize)]
struct PriorRecord {
    /// The previous run's entries
    #[serde(default)]
    contracts: Vec<PriorEntry>,
}

/// See [`PriorRecord`]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriorEntry {
    #[serde(default, alias = "name")]
    contract_name: Option<String>,
    #[serde(default)]
    deployed_address: Option<Address>,
}

// ----------------------
// | Deployment Reports |
// ----------------------

/// One contract deployed by the deploy-all flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// The contract's artifact name
    pub name: String,
    /// Where the contract was deployed
    pub address: Address,
    /// The deployment transaction
    pub tx_hash: TxHash,
    /// The constructor arguments used
    pub args: Vec<Value>,
}

/// The persisted outcome of a deploy-all run on one network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReport {
    /// The network name
    pub network: String,
    /// When the run started, as an ISO-8601 timestamp
    pub deployed_at: String,
    /// The account that deployed every contract
    pub deployer: Address,
    /// The deployed contracts, in order
    pub contracts: Vec<ReportEntry>,
}

impl DeploymentReport {
    /// An empty report for a run starting now
    pub fn new(network: impl Into<String>, deployer: Address) -> Self {
        Self {
            network: network.into(),
            deployed_at: now_iso8601(),
            deployer,
            contracts: Vec::new(),
        }
    }
}

// ----------------
// | Record Store |
// ----------------

/// Reads and writes the per-network records under a single directory
#[derive(Debug, Clone)]
pub struct RecordStore {
    /// The directory holding the records
    dir: PathBuf,
}

impl RecordStore {
    /// A store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The path of the run record for `network`
    pub fn run_record_path(&self, network: &str) -> PathBuf {
        self.dir.join(format!("{network}-{RUN_RECORD_SUFFIX}"))
    }

    /// The path of the deploy-all report for `network`
    pub fn report_path(&self, network: &str) -> PathBuf {
        self.dir.join(format!("{network}-{DEPLOYMENT_REPORT_SUFFIX}"))
    }

    /// Read the run record for `network`, if one exists
    pub fn load_run_record(&self, network: &str) -> Result<Option<RunRecord>, DeployError> {
        let path = self.run_record_path(network);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path)
            .map(Some)
            .map_err(|e| DeployError::MalformedPriorRecord(format!("{}: {}", path.display(), e)))
    }

    /// The addresses recorded by the previous run on `network`.
    ///
    /// Entries without an address are skipped. A malformed record is logged and
    /// treated as empty.
    pub fn prior_addresses(&self, network: &str) -> HashMap<String, Address> {
        let path = self.run_record_path(network);
        if !path.exists() {
            return HashMap::new();
        }

        let prior: PriorRecord = match read_json(&path) {
            Ok(prior) => prior,
            Err(e) => {
                let err = DeployError::MalformedPriorRecord(e.to_string());
                warn!(
                    "Failed to load previous deployments from {}: {}",
                    path.display(),
                    err
                );
                return HashMap::new();
            }
        };

        prior
            .contracts
            .into_iter()
            .filter_map(|entry| Some((entry.contract_name?, entry.deployed_address?)))
            .collect()
    }

    /// Overwrite the run record for the record's network
    pub fn save_run_record(&self, record: &RunRecord) -> Result<PathBuf, DeployError> {
        let path = self.run_record_path(&record.network);
        write_json_atomic(&path, record)?;
        Ok(path)
    }

    /// Overwrite the deploy-all report for the report's network
    pub fn save_report(&self, report: &DeploymentReport) -> Result<PathBuf, DeployError> {
        let path = self.report_path(&report.network);
        write_json_atomic(&path, report)?;
        Ok(path)
    }
}

// -----------
// | Helpers |
// -----------

/// The current time in the format JavaScript's `toISOString` produces
fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read and deserialize a JSON file
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DeployError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| DeployError::ReadFile(e.to_string()))?;
    serde_json::from_str(&contents)
        .map_err(|e| DeployError::ReadFile(e.to_string()))
}

/// Serialize `value` to `path`, replacing any existing file in one step.
///
/// The JSON is written to a sibling temporary file and renamed over the target,
/// so a crash mid-write never leaves a truncated record behind.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), DeployError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| DeployError::WriteFile(e.to_string()))?;
    }

    let contents = serde_json::to_string_pretty(value)
        .map_err(|e| DeployError::WriteFile(e.to_string()))?;
    let temp_path = path.with_extension(TEMP_FILE_EXTENSION);
    fs::write(&temp_path, contents)
        .map_err(|e| DeployError::WriteFile(e.to_string()))?;
    fs::rename(&temp_path, path)
        .map_err(|e| DeployError::WriteFile(e.to_string()))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, b256};

    use super::*;

    const DEPLOYER: Address = address!("0x00000000000000000000000000000000000000d1");
    const BASIC_MATH: Address = address!("0x00000000000000000000000000000000000000a1");
    const REGISTRY: Address = address!("0x075eb9dc52177aa3492e1d26f0fde3d729625d2f");

    fn sample_record() -> RunRecord {
        let mut record = RunRecord::new("baseSepolia", DEPLOYER);
        record.contracts.push(ResultEntry {
            contract_name: "BasicMath".to_string(),
            deployed_address: Some(BASIC_MATH),
            registry_address: Some(REGISTRY),
            tx_hash: TxOutcome::Registered(b256!(
                "0x00000000000000000000000000000000000000000000000000000000000000ff"
            )),
            deploy_tx_hash: None,
        });
        record.contracts.push(ResultEntry {
            contract_name: "Manager".to_string(),
            deployed_address: None,
            registry_address: None,
            tx_hash: TxOutcome::AlreadyRegistered,
            deploy_tx_hash: None,
        });
        record
    }

    #[test]
    fn test_record_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("deployments"));

        let path = store.save_run_record(&sample_record()).unwrap();
        assert_eq!(
            path.file_name().unwrap(),
            "baseSepolia-deploy-register.json"
        );

        let contents = fs::read_to_string(&path).unwrap();
        let json: Value = serde_json::from_str(&contents).unwrap();
        let first = &json["contracts"][0];
        assert_eq!(first["contractName"], "BasicMath");
        assert!(first["registry"].is_string());
        assert!(first.get("deployTxHash").is_none());
        assert_eq!(json["contracts"][1]["txHash"], "already-registered");
        assert!(json["contracts"][1]["deployedAddress"].is_null());
        assert!(json["deployedAt"].as_str().unwrap().ends_with('Z'));

        let loaded = store.load_run_record("baseSepolia").unwrap().unwrap();
        assert_eq!(loaded, sample_record_with_time(&loaded.deployed_at));
    }

    fn sample_record_with_time(deployed_at: &str) -> RunRecord {
        RunRecord {
            deployed_at: deployed_at.to_string(),
            ..sample_record()
        }
    }

    #[test]
    fn test_prior_addresses_skip_null_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        store.save_run_record(&sample_record()).unwrap();

        let prior = store.prior_addresses("baseSepolia");
        let expected = HashMap::from([("BasicMath".to_string(), BASIC_MATH)]);
        assert_eq!(prior, expected);
    }

    #[test]
    fn test_prior_addresses_accept_legacy_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        fs::write(
            store.run_record_path("base"),
            r#"{ "contracts": [ { "name": "Salesperson",
                 "deployedAddress": "0x00000000000000000000000000000000000000a1" } ] }"#,
        )
        .unwrap();

        let prior = store.prior_addresses("base");
        assert_eq!(prior.get("Salesperson"), Some(&BASIC_MATH));
    }

    #[test]
    fn test_malformed_prior_record_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        fs::write(store.run_record_path("base"), "{ not json")
            .unwrap();

        assert!(store.prior_addresses("base").is_empty());
        assert!(matches!(
            store.load_run_record("base"),
            Err(DeployError::MalformedPriorRecord(_))
        ));
    }

    #[test]
    fn test_missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        assert!(store.load_run_record("base").unwrap().is_none());
        assert!(store.prior_addresses("base").is_empty());
    }

    #[test]
    fn test_tx_outcome_rejects_garbage() {
        assert!(TxOutcome::try_from("pending".to_string()).is_err());
        assert_eq!(
            TxOutcome::try_from("not-applicable".to_string()),
            Ok(TxOutcome::NotApplicable)
        );
    }

    #[test]
    fn test_report_path() {
        let store = RecordStore::new("deployments");
        assert_eq!(
            store.report_path("base"),
            PathBuf::from("deployments").join("base-deployments.json")
        );
    }
}
