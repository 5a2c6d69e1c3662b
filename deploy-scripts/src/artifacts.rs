//! Lookup of Hardhat compilation artifacts and encoding of deployment code

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{DynSolValue, Specifier},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use serde::Deserialize;

use crate::{constants::ARTIFACT_EXTENSION, errors::DeployError, types::ArgValue};

/// The parts of a Hardhat artifact needed to deploy a contract
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    /// The contract's name
    pub contract_name: String,
    /// The contract's ABI
    pub abi: JsonAbi,
    /// The creation bytecode
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Parse an artifact from its JSON form
    pub fn from_json(contents: &str) -> Result<Self, DeployError> {
        serde_json::from_str(contents)
            .map_err(|e| DeployError::ArtifactParsing(e.to_string()))
    }

    /// ABI-encode `args` against the contract's constructor
    pub fn encode_constructor_args(&self, args: &[ArgValue]) -> Result<Vec<u8>, DeployError> {
        let params = self
            .abi
            .constructor
            .as_ref()
            .map(|c| c.inputs.as_slice())
            .unwrap_or_default();
        if params.len() != args.len() {
            return Err(DeployError::CalldataConstruction(format!(
                "{} expects {} constructor arguments, got {}",
                self.contract_name,
                params.len(),
                args.len()
            )));
        }

        let values = params
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty = param
                    .resolve()
                    .map_err(|e| DeployError::ArtifactParsing(format!("{}: {}", param.ty, e)))?;
                arg.to_sol_value(&ty)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DynSolValue::Tuple(values).abi_encode_params())
    }

    /// The creation bytecode followed by the encoded constructor arguments
    pub fn deploy_code(&self, args: &[ArgValue]) -> Result<Bytes, DeployError> {
        if self.bytecode.is_empty() {
            return Err(DeployError::ArtifactParsing(format!(
                "{} has no creation bytecode (abstract contract or interface?)",
                self.contract_name
            )));
        }

        let mut code = self.bytecode.to_vec();
        code.extend(self.encode_constructor_args(args)?);
        Ok(code.into())
    }
}

/// Finds artifacts by contract name under a Hardhat `artifacts/` directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// The artifacts root
    root: PathBuf,
}

impl ArtifactStore {
    /// A store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load the artifact for the contract called `name`
    pub fn load(&self, name: &str) -> Result<ContractArtifact, DeployError> {
        let path = self.find(name)?;
        let contents = fs::read_to_string(&path)
            .map_err(|e| DeployError::ArtifactParsing(e.to_string()))?;
        ContractArtifact::from_json(&contents)
    }

    /// Locate the single artifact file for `name`
    pub fn find(&self, name: &str) -> Result<PathBuf, DeployError> {
        let file_name = format!("{name}.{ARTIFACT_EXTENSION}");
        let mut matches = Vec::new();
        collect_matches(&self.root, &file_name, &mut matches)?;

        match matches.len() {
            0 => Err(DeployError::ArtifactParsing(format!(
                "no artifact for {} under {}",
                name,
                self.root.display()
            ))),
            1 => Ok(matches.remove(0)),
            _ => Err(DeployError::ArtifactParsing(format!(
                "multiple artifacts for {}: {:?}",
                name, matches
            ))),
        }
    }
}

/// Recursively collect files under `dir` named `file_name`
fn collect_matches(dir: &Path, file_name: &str, out: &mut Vec<PathBuf>) -> Result<(), DeployError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| DeployError::ArtifactParsing(format!("{}: {}", dir.display(), e)))?;

    for entry in entries {
        let path = entry
            .map_err(|e| DeployError::ArtifactParsing(e.to_string()))?
            .path();
        if path.is_dir() {
            collect_matches(&path, file_name, out)?;
        } else if path.file_name().is_some_and(|f| f == file_name) {
            out.push(path);
        }
    }
    Ok(())
}
