//! Scripts for deploying the Base Camp exercise contracts and registering them
//! with their on-chain registries.

pub mod artifacts;
pub mod cli;
pub mod client;
mod commands;
pub mod constants;
pub mod errors;
pub mod fees;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;
pub mod orchestrator;
pub mod overrides;
pub mod progress;
pub mod record;
pub mod registrations;
pub mod solidity;
pub mod types;
pub mod utils;
