//! A local cache of per-account task progress.
//!
//! Profiles are keyed by chain id and account, and map a task (a contract name)
//! to what is known about it. The cache holds no authority over on-chain state;
//! it only remembers past results for display.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use alloy::primitives::{Address, TxHash};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    errors::DeployError,
    record::{read_json, write_json_atomic, RunRecord, TxOutcome},
    types::DeploymentSpec,
};

/// What is known about one task for one account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    /// Where the task's contract was deployed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_address: Option<Address>,
    /// The deployment transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_tx: Option<TxHash>,
    /// The registration transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_tx: Option<TxHash>,
    /// When the entry last changed, in unix milliseconds
    #[serde(default)]
    pub updated_at: i64,
}

impl TaskProgress {
    /// Whether the task's contract has an address
    pub fn is_deployed(&self) -> bool {
        self.deployed_address.is_some()
    }

    /// Whether the task is done: registered if it has a registry, else deployed
    pub fn is_complete(&self, spec: &DeploymentSpec) -> bool {
        match spec.registry {
            Some(_) => self.registry_tx.is_some(),
            None => self.is_deployed(),
        }
    }

    /// Overwrite every field set in `update`
    fn merge(&mut self, update: TaskProgress) {
        self.deployed_address = update.deployed_address.or(self.deployed_address);
        self.deploy_tx = update.deploy_tx.or(self.deploy_tx);
        self.registry_tx = update.registry_tx.or(self.registry_tx);
    }
}

/// The tasks of a single profile, by task id
pub type Profile = BTreeMap<String, TaskProgress>;

/// The key of the profile for `account` on `chain_id`
pub fn profile_key(chain_id: u64, account: &Address) -> String {
    format!("{}:{}", chain_id, account.to_string().to_lowercase())
}

/// Every profile, backed by a JSON file
#[derive(Debug, Clone)]
pub struct ProgressStore {
    /// The backing file
    path: PathBuf,
    /// The profiles, by profile key
    profiles: BTreeMap<String, Profile>,
}

impl ProgressStore {
    /// Load the store at `path`; a missing or malformed file yields an empty store
    pub fn load(path: &Path) -> Self {
        let profiles = if path.exists() {
            read_json(path).unwrap_or_else(|e| {
                warn!(
                    "Ignoring unreadable progress file {}: {}",
                    path.display(),
                    e
                );
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        Self {
            path: path.to_path_buf(),
            profiles,
        }
    }

    /// The tasks recorded for `key`
    pub fn profile(&self, key: &str) -> Option<&Profile> {
        self.profiles.get(key)
    }

    /// The progress recorded for `task` under `key`
    pub fn task(&self, key: &str, task: &str) -> Option<&TaskProgress> {
        self.profiles.get(key)?.get(task)
    }

    /// Merge `update` into the entry for `task`, stamp it, and persist
    pub fn upsert(
        &mut self,
        key: &str,
        task: &str,
        update: TaskProgress,
    ) -> Result<(), DeployError> {
        let profile = self.profiles.entry(key.to_string()).or_default();
        let entry = profile.entry(task.to_string()).or_default();
        entry.merge(update);
        entry.updated_at = Utc::now().timestamp_millis();
        self.save()
    }

    /// Forget `task` under `key`, returning whether it was present
    pub fn clear_task(&mut self, key: &str, task: &str) -> Result<bool, DeployError> {
        let removed = self
            .profiles
            .get_mut(key)
            .and_then(|profile| profile.remove(task))
            .is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Forget every task under `key`, returning whether the profile existed
    pub fn clear_profile(&mut self, key: &str) -> Result<bool, DeployError> {
        let removed = self.profiles.remove(key).is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Merge the outcome of a register run into the profile under `key`.
    ///
    /// Skipped entries carry no transactions, so they only refresh a known address.
    pub fn record_run(&mut self, key: &str, record: &RunRecord) -> Result<(), DeployError> {
        let profile = self.profiles.entry(key.to_string()).or_default();
        let now = Utc::now().timestamp_millis();

        for entry in &record.contracts {
            let registry_tx = match entry.tx_hash {
                TxOutcome::Registered(hash) => Some(hash),
                TxOutcome::AlreadyRegistered | TxOutcome::NotApplicable => None,
            };
            let update = TaskProgress {
                deployed_address: entry.deployed_address,
                deploy_tx: entry.deploy_tx_hash,
                registry_tx,
                updated_at: now,
            };

            let task = profile.entry(entry.contract_name.clone()).or_default();
            task.merge(update);
            task.updated_at = now;
        }

        self.save()
    }

    /// Write every profile back to the backing file
    fn save(&self) -> Result<(), DeployError> {
        write_json_atomic(&self.path, &self.profiles)
    }
}
