//! Definitions of Solidity interfaces called during registration

use alloy::sol;

sol! {
    /// A learning-module registry that records which accounts submitted a working contract
    #[sol(rpc)]
    interface IRegistry {
        /// Run the registry's checks against `submission` and mark the caller as having passed
        function testContract(address submission) external;
        /// Whether `owner` has already passed this registry's checks
        function owners(address owner) external view returns (bool);
    }
}
