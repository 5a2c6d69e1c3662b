//! Fee selection for submitted transactions.
//!
//! Every transaction is priced from a fresh fee snapshot plus a fixed absolute
//! bump, so it is not left pending under a rising base fee. Which fields are
//! set depends on what the network reports:
//!
//! 1. max fee and priority fee: both bumped
//! 2. max fee only: max fee bumped, priority fee taken from the run-start default and bumped
//! 3. neither: a legacy gas price, from the snapshot or the run-start default, bumped

use alloy::{network::TransactionBuilder, rpc::types::TransactionRequest};

use crate::constants::{
    FALLBACK_FEE_DENOMINATOR, FALLBACK_FEE_NUMERATOR, FEE_BUMP, FLOOR_GAS_PRICE,
    FLOOR_PRIORITY_FEE_PER_GAS,
};

/// The fee fields a network reported at a point in time, in wei
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeSnapshot {
    /// The EIP-1559 max fee per gas
    pub max_fee_per_gas: Option<u128>,
    /// The EIP-1559 priority fee per gas
    pub max_priority_fee_per_gas: Option<u128>,
    /// The legacy gas price
    pub gas_price: Option<u128>,
}

/// Fallback fees, derived once from the snapshot taken at the start of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeDefaults {
    /// Used when the network reports a max fee but no priority fee
    pub max_priority_fee_per_gas: u128,
    /// Used when the network reports no EIP-1559 fields and no gas price
    pub gas_price: u128,
}

impl FeeDefaults {
    /// 120% of each reported field, or a fixed floor where the field is absent
    pub fn from_snapshot(initial: &FeeSnapshot) -> Self {
        let scale =
            |fee: u128| fee.saturating_mul(FALLBACK_FEE_NUMERATOR) / FALLBACK_FEE_DENOMINATOR;
        Self {
            max_priority_fee_per_gas: initial
                .max_priority_fee_per_gas
                .map(scale)
                .unwrap_or(FLOOR_PRIORITY_FEE_PER_GAS),
            gas_price: initial.gas_price.map(scale).unwrap_or(FLOOR_GAS_PRICE),
        }
    }
}

/// The fee fields to set on an outgoing transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeOverrides {
    /// An EIP-1559 transaction
    Eip1559 {
        /// The max fee per gas
        max_fee_per_gas: u128,
        /// The priority fee per gas
        max_priority_fee_per_gas: u128,
    },
    /// A legacy transaction
    Legacy {
        /// The gas price
        gas_price: u128,
    },
}

impl FeeOverrides {
    /// Compute the overrides for a fresh snapshot
    pub fn bumped(snapshot: &FeeSnapshot, defaults: &FeeDefaults) -> Self {
        let bump = |fee: u128| fee.saturating_add(FEE_BUMP);
        match (snapshot.max_fee_per_gas, snapshot.max_priority_fee_per_gas) {
            (Some(max_fee), Some(priority_fee)) => FeeOverrides::Eip1559 {
                max_fee_per_gas: bump(max_fee),
                max_priority_fee_per_gas: bump(priority_fee),
            },
            (Some(max_fee), None) => FeeOverrides::Eip1559 {
                max_fee_per_gas: bump(max_fee),
                max_priority_fee_per_gas: bump(defaults.max_priority_fee_per_gas),
            },
            _ => FeeOverrides::Legacy {
                gas_price: bump(snapshot.gas_price.unwrap_or(defaults.gas_price)),
            },
        }
    }

    /// Set the fee fields on a transaction request
    pub fn apply(&self, tx: TransactionRequest) -> TransactionRequest {
        match *self {
            FeeOverrides::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => tx
                .with_max_fee_per_gas(max_fee_per_gas)
                .with_max_priority_fee_per_gas(max_priority_fee_per_gas),
            FeeOverrides::Legacy { gas_price } => tx.with_gas_price(gas_price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::GWEI;

    fn defaults() -> FeeDefaults {
        FeeDefaults::from_snapshot(&FeeSnapshot::default())
    }

    #[test]
    fn test_full_eip1559_snapshot_is_bumped() {
        let snapshot = FeeSnapshot {
            max_fee_per_gas: Some(3 * GWEI),
            max_priority_fee_per_gas: Some(GWEI / 2),
            gas_price: Some(2 * GWEI),
        };
        let overrides = FeeOverrides::bumped(&snapshot, &defaults());
        assert_eq!(
            overrides,
            FeeOverrides::Eip1559 {
                max_fee_per_gas: 3 * GWEI + FEE_BUMP,
                max_priority_fee_per_gas: GWEI / 2 + FEE_BUMP,
            }
        );
    }

    #[test]
    fn test_max_fee_only_uses_default_priority() {
        let initial = FeeSnapshot {
            max_priority_fee_per_gas: Some(10),
            ..Default::default()
        };
        let defaults = FeeDefaults::from_snapshot(&initial);
        assert_eq!(defaults.max_priority_fee_per_gas, 12);

        let snapshot = FeeSnapshot {
            max_fee_per_gas: Some(5 * GWEI),
            ..Default::default()
        };
        let overrides = FeeOverrides::bumped(&snapshot, &defaults);
        assert_eq!(
            overrides,
            FeeOverrides::Eip1559 {
                max_fee_per_gas: 5 * GWEI + FEE_BUMP,
                max_priority_fee_per_gas: 12 + FEE_BUMP,
            }
        );
    }

    #[test]
    fn test_legacy_gas_price_is_bumped() {
        let snapshot = FeeSnapshot {
            gas_price: Some(7 * GWEI),
            ..Default::default()
        };
        let overrides = FeeOverrides::bumped(&snapshot, &defaults());
        let expected = FeeOverrides::Legacy {
            gas_price: 7 * GWEI + FEE_BUMP,
        };
        assert_eq!(overrides, expected);
    }

    #[test]
    fn test_empty_snapshot_uses_floor() {
        let overrides = FeeOverrides::bumped(&FeeSnapshot::default(), &defaults());
        let expected = FeeOverrides::Legacy {
            gas_price: FLOOR_GAS_PRICE + FEE_BUMP,
        };
        assert_eq!(overrides, expected);
    }

    #[test]
    fn test_bump_is_exact_for_every_reported_field() {
        let snapshots = [
            (Some(1), Some(1), None),
            (Some(40 * GWEI), Some(GWEI), Some(41 * GWEI)),
            (Some(123_456_789), None, None),
            (None, None, Some(999)),
        ];
        for (max_fee, priority, gas_price) in snapshots {
            let snapshot = FeeSnapshot {
                max_fee_per_gas: max_fee,
                max_priority_fee_per_gas: priority,
                gas_price,
            };
            match FeeOverrides::bumped(&snapshot, &defaults()) {
                FeeOverrides::Eip1559 {
                    max_fee_per_gas,
                    max_priority_fee_per_gas,
                } => {
                    assert_eq!(max_fee_per_gas - max_fee.unwrap(), FEE_BUMP);
                    if let Some(priority) = priority {
                        assert_eq!(max_priority_fee_per_gas - priority, FEE_BUMP);
                    }
                }
                FeeOverrides::Legacy { gas_price: bumped } => {
                    assert_eq!(bumped - gas_price.unwrap(), FEE_BUMP);
                }
            }
        }
    }

    #[test]
    fn test_apply_sets_request_fields() {
        let legacy = FeeOverrides::Legacy { gas_price: 5 };
        let tx = legacy.apply(TransactionRequest::default());
        assert_eq!(tx.gas_price, Some(5));
        assert_eq!(tx.max_fee_per_gas, None);

        let eip1559 = FeeOverrides::Eip1559 {
            max_fee_per_gas: 9,
            max_priority_fee_per_gas: 2,
        };
        let tx = eip1559.apply(TransactionRequest::default());
        assert_eq!(tx.max_fee_per_gas, Some(9));
        assert_eq!(tx.max_priority_fee_per_gas, Some(2));
    }
}
