//! Constants used in the deploy scripts

use std::time::Duration;

/// The default pause between consecutive transactions, in milliseconds
pub const DEFAULT_TX_DELAY_MS: u64 = 3000;

/// The environment variable overriding the inter-transaction pause
pub const TX_DELAY_ENV_VAR: &str = "DEPLOY_TX_DELAY_MS";

/// The gas ceiling for a registration call when the deployment does not set one
pub const DEFAULT_REGISTRATION_GAS_LIMIT: u64 = 900_000;

/// How long to wait for a submitted transaction to be mined
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// One gwei, in wei
pub const GWEI: u128 = 1_000_000_000;

/// The absolute amount added to every fee field before submitting a transaction
pub const FEE_BUMP: u128 = GWEI;

/// The multiplicative bump applied to the run-start fee snapshot when deriving
/// fallback fees, expressed as a fraction
pub const FALLBACK_FEE_NUMERATOR: u128 = 12;
/// See [`FALLBACK_FEE_NUMERATOR`]
pub const FALLBACK_FEE_DENOMINATOR: u128 = 10;

/// The priority fee used when the network reports none at run start
pub const FLOOR_PRIORITY_FEE_PER_GAS: u128 = GWEI / 10;

/// The legacy gas price used when the network reports none at run start
pub const FLOOR_GAS_PRICE: u128 = GWEI;

/// The `txHash` sentinel for a contract whose registry already lists the deployer
pub const ALREADY_REGISTERED_SENTINEL: &str = "already-registered";

/// The `txHash` sentinel for a contract that has no registry
pub const NOT_APPLICABLE_SENTINEL: &str = "not-applicable";

/// The suffix of the per-network run record written by the register flow
pub const RUN_RECORD_SUFFIX: &str = "deploy-register.json";

/// The suffix of the per-network report written by the deploy-all flow
pub const DEPLOYMENT_REPORT_SUFFIX: &str = "deployments.json";

/// The default directory holding run records and reports
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// The default path of the constructor override file
pub const DEFAULT_OVERRIDES_PATH: &str = "deploy-config.json";

/// The default root of the Hardhat compilation artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The default path of the local progress profile store
pub const DEFAULT_PROGRESS_PATH: &str = "deployments/progress.json";

/// The prefix marking an override token as a reference to a deployed contract
pub const PLACEHOLDER_PREFIX: char = '$';

/// The suffix marking a digit string as an arbitrary-precision integer
pub const BIG_INT_SUFFIX: char = 'n';

/// The extension of a Hardhat artifact file
pub const ARTIFACT_EXTENSION: &str = "json";

/// The extension used for a record while it is being written
pub const TEMP_FILE_EXTENSION: &str = "tmp";
