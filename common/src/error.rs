use std::time::Duration;

use alloy_primitives::U256;
use thiserror::Error;

use crate::{chain::ChainId, crypto::Address, registry::RegistryError};

pub type ModulesResult<T> = Result<T, ModulesError>;

/// Errors raised by the modules client
///
/// Local errors (`UnsupportedType`, `Coercion`, `NotFound`, `NotDeployed`,
/// `Validation`, `UnknownFunction`, `Registry`, `Config`) come from caller or
/// registry data defects and are never retried. `Submission` and `Read` are
/// transport failures the caller may retry. `Revert` is terminal for the
/// given inputs. `AmbiguousOutcome` must not be retried blindly since the
/// transaction may still land.
#[derive(Debug, Error)]
pub enum ModulesError {
    #[error("unsupported type descriptor: {descriptor:?}")]
    UnsupportedType { descriptor: String },

    #[error("cannot coerce {value} into {category}: {reason}")]
    Coercion {
        category: String,
        value: String,
        reason: String,
    },

    #[error("module not found: {module_id}")]
    NotFound { module_id: String },

    #[error("module {module_id} has no deployment on chain {chain_id}")]
    NotDeployed { module_id: String, chain_id: ChainId },

    #[error("invalid arguments for module {module_id}: {reason}")]
    Validation { module_id: String, reason: String },

    #[error("function {name} not found in contract interface")]
    UnknownFunction { name: String },

    #[error(
        "submission failed for module {module_id} (hat 0x{hat_id:x}, chain {chain_id}): {reason}"
    )]
    Submission {
        module_id: String,
        hat_id: U256,
        chain_id: ChainId,
        reason: String,
    },

    #[error(
        "transaction reverted for module {module_id} (hat 0x{hat_id:x}, chain {chain_id}): {reason}"
    )]
    Revert {
        module_id: String,
        hat_id: U256,
        chain_id: ChainId,
        reason: String,
    },

    #[error(
        "no confirmation within {timeout:?} for module {module_id} (hat 0x{hat_id:x}, chain {chain_id}); instance may still appear at {predicted}"
    )]
    AmbiguousOutcome {
        module_id: String,
        hat_id: U256,
        chain_id: ChainId,
        predicted: Address,
        timeout: Duration,
    },

    #[error("reading {field} at {address} failed after {attempts} attempt(s): {reason}")]
    Read {
        address: Address,
        field: String,
        reason: String,
        attempts: u32,
        reverted: bool,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ModulesError {
    /// Deterministic errors caused by inputs or registry data
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType { .. }
                | Self::Coercion { .. }
                | Self::NotFound { .. }
                | Self::NotDeployed { .. }
                | Self::Validation { .. }
                | Self::UnknownFunction { .. }
                | Self::Registry(_)
                | Self::Config(_)
        )
    }

    /// Transport failures that are safe to retry with the same inputs
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Submission { .. } => true,
            Self::Read { reverted, .. } => !reverted,
            _ => false,
        }
    }

    // Short tag for logs and reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedType { .. } => "unsupported_type",
            Self::Coercion { .. } => "coercion",
            Self::NotFound { .. } => "not_found",
            Self::NotDeployed { .. } => "not_deployed",
            Self::Validation { .. } => "validation",
            Self::UnknownFunction { .. } => "unknown_function",
            Self::Submission { .. } => "submission",
            Self::Revert { .. } => "revert",
            Self::AmbiguousOutcome { .. } => "ambiguous_outcome",
            Self::Read { .. } => "read",
            Self::Registry(_) => "registry",
            Self::Config(_) => "config",
        }
    }
}
