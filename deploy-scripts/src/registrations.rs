//! The fixed contract lists processed by the register and deploy-all flows

use alloy::primitives::{address, Address};

use crate::{
    errors::DeployError,
    overrides::ResolutionContext,
    types::{ArgValue, DeploymentSpec, TaskGroup},
};

/// The `BasicMath` registry
pub const BASIC_MATH_REGISTRY: Address = address!("0x075Eb9dc52177aA3492e1d26F0fde3D729625d2f");
/// The `EmployeeStorage` registry
pub const EMPLOYEE_STORAGE_REGISTRY: Address =
    address!("0x567452C6638C0d2D9778c20a3D59749fDcaa7aB3");
/// The `ControlStructures` registry
pub const CONTROL_STRUCTURES_REGISTRY: Address =
    address!("0xF4d953a3976F392AA5509612Deff395983F22a84");
/// The `ArraysExercise` registry
pub const ARRAYS_EXERCISE_REGISTRY: Address =
    address!("0x5B0f80cA6f5BD60cC3b64F0377f336B2b2A56cdf");
/// The `FavoriteRecords` registry
pub const FAVORITE_RECORDS_REGISTRY: Address =
    address!("0xD32E3aCe3272E2037003Ca54ca7E5676F9B8d06c");
/// The `GarageManager` registry
pub const GARAGE_MANAGER_REGISTRY: Address = address!("0x9Eb1fA4cD9bd29ca2c8e72217a642811c1f6176d");
/// The `ErrorTriageExercise` registry
pub const ERROR_TRIAGE_REGISTRY: Address = address!("0xC1bD0d9a8863F2318001bC5024c7F5f58A2236f7");
/// The `ImportsExercise` registry
pub const IMPORTS_EXERCISE_REGISTRY: Address =
    address!("0x8Dd188Ec36084D59948F90213aFCD04429e33C0c");
/// The `HaikuNFT` registry
pub const HAIKU_NFT_REGISTRY: Address = address!("0x15534ED3D1DbA55148695b2bA4164f147e47a10c");
/// The `UnburnableToken` registry
pub const UNBURNABLE_TOKEN_REGISTRY: Address =
    address!("0x10cE928030E136ecc74D4a4416Db9B533E3C694d");
/// The `WeightedVoting` registry
pub const WEIGHTED_VOTING_REGISTRY: Address =
    address!("0x4F333c49B820013E5e6fE86634dC4DA88039cE50");
/// The `AddressBookFactory` registry
pub const ADDRESS_BOOK_FACTORY_REGISTRY: Address =
    address!("0x4F21e69D0cDE8C21cF82a6b37dDA5444716AFA46");
/// The `InheritanceSubmission` registry
pub const INHERITANCE_REGISTRY: Address = address!("0xF90dA05E77A33fE6D64bc2df84E7dD0069A2111c");

/// Constructor arguments for `InheritanceSubmission`: the two employees it wraps
fn inheritance_submission_args(ctx: &ResolutionContext) -> Result<Vec<ArgValue>, DeployError> {
    Ok(vec![
        ArgValue::Address(ctx.get_address("Salesperson")?),
        ArgValue::Address(ctx.get_address("EngineeringManager")?),
    ])
}

/// The contracts deployed and registered by the register flow, in order
pub fn registrations() -> Vec<DeploymentSpec> {
    use TaskGroup::*;

    vec![
        DeploymentSpec::new("BasicMath", Warmup)
            .with_registry(BASIC_MATH_REGISTRY),
        DeploymentSpec::new("EmployeeStorage", Warmup)
            .with_args(vec![
                1000u64.into(),
                "Pat".into(),
                50000u64.into(),
                112358132134u64.into(),
            ])
            .with_registry(EMPLOYEE_STORAGE_REGISTRY),
        DeploymentSpec::new("ControlStructures", Acolyte)
            .with_registry(CONTROL_STRUCTURES_REGISTRY),
        DeploymentSpec::new("ArraysExercise", Newcomer)
            .with_registry(ARRAYS_EXERCISE_REGISTRY),
        DeploymentSpec::new("FavoriteRecords", Newcomer)
            .with_registry(FAVORITE_RECORDS_REGISTRY),
        DeploymentSpec::new("GarageManager", Newcomer)
            .with_registry(GARAGE_MANAGER_REGISTRY),
        DeploymentSpec::new("ErrorTriageExercise", Acolyte)
            .with_registry(ERROR_TRIAGE_REGISTRY),
        DeploymentSpec::new("ImportsExercise", Supreme)
            .with_registry(IMPORTS_EXERCISE_REGISTRY),
        DeploymentSpec::new("HaikuNFT", Supreme)
            .with_registry(HAIKU_NFT_REGISTRY)
            .with_gas_limit(1_800_000),
        DeploymentSpec::new("UnburnableToken", Prefect)
            .with_registry(UNBURNABLE_TOKEN_REGISTRY),
        DeploymentSpec::new("WeightedVoting", Prefect)
            .with_args(vec!["Weighted Voting Token".into(), "WVT".into()])
            .with_registry(WEIGHTED_VOTING_REGISTRY)
            .with_gas_limit(1_500_000),
        DeploymentSpec::new("AddressBook", Supreme),
        DeploymentSpec::new("AddressBookFactory", Supreme)
            .with_registry(ADDRESS_BOOK_FACTORY_REGISTRY)
            .with_gas_limit(1_200_000),
        // Inheritance flow
        DeploymentSpec::new("Salesperson", Supreme)
            .with_args(vec![55555u64.into(), 12345u64.into(), 20u64.into()]),
        DeploymentSpec::new("EngineeringManager", Supreme)
            .with_args(vec![54321u64.into(), 11111u64.into(), 200000u64.into()]),
        DeploymentSpec::new("Manager", Supreme),
        DeploymentSpec::new("InheritanceSubmission", Supreme)
            .with_resolver(inheritance_submission_args)
            .with_registry(INHERITANCE_REGISTRY)
            .with_gas_limit(1_600_000),
    ]
}

/// The contracts deployed by the deploy-all flow, in order
pub fn deploy_all_list() -> Vec<DeploymentSpec> {
    use TaskGroup::*;

    vec![
        DeploymentSpec::new("AddressBook", Supreme),
        DeploymentSpec::new("ArraysExercise", Newcomer),
        DeploymentSpec::new("ControlStructures", Acolyte),
        DeploymentSpec::new("WeightedVoting", Prefect)
            .with_args(vec!["Weighted Voting Token".into(), "WVT".into()]),
        DeploymentSpec::new("HaikuNFT", Supreme),
        DeploymentSpec::new("ErrorTriageExercise", Acolyte),
        DeploymentSpec::new("Salaried", Supreme)
            .with_args(vec![1u64.into(), 101u64.into(), 120000u64.into()]),
        DeploymentSpec::new("Hourly", Supreme)
            .with_args(vec![2u64.into(), 101u64.into(), 60u64.into()]),
        DeploymentSpec::new("FavoriteRecords", Newcomer),
        DeploymentSpec::new("UnburnableToken", Prefect),
        DeploymentSpec::new("AddressBookFactory", Supreme),
        DeploymentSpec::new("EmployeeStorage", Warmup)
            .with_args(vec![
                1000u64.into(),
                "Alice".into(),
                120000u64.into(),
                1u64.into(),
            ]),
        DeploymentSpec::new("GarageManager", Newcomer),
        DeploymentSpec::new("BasicMath", Warmup),
        DeploymentSpec::new("ImportsExercise", Supreme),
    ]
}

/// The register-flow spec called `name`
pub fn find_registration(name: &str) -> Option<DeploymentSpec> {
    registrations().into_iter().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;

    #[test]
    fn test_names_are_unique() {
        for list in [registrations(), deploy_all_list()] {
            let names: HashSet<_> = list.iter().map(|spec| spec.name).collect();
            assert_eq!(names.len(), list.len());
        }
    }

    #[test]
    fn test_resolver_dependencies_come_first() {
        let specs = registrations();
        let position = |name: &str| specs.iter().position(|spec| spec.name == name).unwrap();
        assert!(position("Salesperson") < position("InheritanceSubmission"));
        assert!(position("EngineeringManager") < position("InheritanceSubmission"));
    }

    #[test]
    fn test_inheritance_resolver() {
        let sales = address!("0x00000000000000000000000000000000000000a1");
        let manager = address!("0x00000000000000000000000000000000000000a2");
        let mut ctx = ResolutionContext::new(HashMap::from([("Salesperson".to_string(), sales)]));
        ctx.record("EngineeringManager", Some(manager));

        let args = inheritance_submission_args(&ctx).unwrap();
        let expected = vec![ArgValue::Address(sales), ArgValue::Address(manager)];
        assert_eq!(args, expected);

        let empty = ResolutionContext::default();
        assert_eq!(
            inheritance_submission_args(&empty),
            Err(DeployError::DependencyUnresolved("Salesperson".to_string()))
        );
    }

    #[test]
    fn test_gas_limit_overrides() {
        let limit = |name: &str| find_registration(name).unwrap().registration_gas_limit();
        assert_eq!(limit("BasicMath"), 900_000);
        assert_eq!(limit("HaikuNFT"), 1_800_000);
        assert_eq!(limit("WeightedVoting"), 1_500_000);
        assert_eq!(limit("AddressBookFactory"), 1_200_000);
        assert_eq!(limit("InheritanceSubmission"), 1_600_000);
    }

    #[test]
    fn test_registry_free_contracts() {
        let free: Vec<_> = registrations()
            .into_iter()
            .filter(|s| s.registry.is_none())
            .map(|s| s.name)
            .collect();
        let expected = vec![
            "AddressBook",
            "Salesperson",
            "EngineeringManager",
            "Manager",
        ];
        assert_eq!(free, expected);
    }
}
