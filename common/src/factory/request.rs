use std::fmt::{Display, Error, Formatter};

use alloy_primitives::U256;
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    args::NativeValue,
    chain::{ChainId, Receipt},
    crypto::Address,
    error::ModulesError,
};

/// Progress of a single instance creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationStage {
    Requested,
    ArgsValidated,
    AddressComputed,
    Submitted,
    Confirmed,
    Failed,
}

impl CreationStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CreationStage::Confirmed | CreationStage::Failed)
    }

    // Forward-only; any live stage may fail
    fn can_advance_to(&self, next: CreationStage) -> bool {
        use CreationStage::*;
        matches!(
            (self, next),
            (Requested, ArgsValidated)
                | (ArgsValidated, AddressComputed)
                | (AddressComputed, Submitted)
                | (AddressComputed, Confirmed)
                | (Submitted, Confirmed)
        ) || (!self.is_terminal() && next == Failed)
    }
}

impl Display for CreationStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let name = match self {
            CreationStage::Requested => "requested",
            CreationStage::ArgsValidated => "args_validated",
            CreationStage::AddressComputed => "address_computed",
            CreationStage::Submitted => "submitted",
            CreationStage::Confirmed => "confirmed",
            CreationStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Inputs of one `create_instance` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInstanceRequest {
    pub module_id: String,
    pub hat_id: U256,
    pub immutable_args: Vec<NativeValue>,
    pub mutable_args: Vec<NativeValue>,
}

impl CreateInstanceRequest {
    pub fn new(module_id: impl Into<String>, hat_id: U256) -> Self {
        Self {
            module_id: module_id.into(),
            hat_id,
            immutable_args: Vec::new(),
            mutable_args: Vec::new(),
        }
    }

    pub fn with_immutable_args(mut self, args: Vec<NativeValue>) -> Self {
        self.immutable_args = args;
        self
    }

    pub fn with_mutable_args(mut self, args: Vec<NativeValue>) -> Self {
        self.mutable_args = args;
        self
    }
}

/// How the instance came to exist at `new_instance`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationOutcome {
    /// Created by our transaction
    Created(Receipt),
    /// Code was already present at the derived address; nothing was
    /// submitted and the mutable args were not reapplied
    AlreadyDeployed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceResult {
    pub new_instance: Address,
    pub outcome: CreationOutcome,
}

impl InstanceResult {
    pub fn receipt(&self) -> Option<&Receipt> {
        match &self.outcome {
            CreationOutcome::Created(receipt) => Some(receipt),
            CreationOutcome::AlreadyDeployed => None,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self.outcome, CreationOutcome::Created(_))
    }

    /// Whether the request's mutable args became the instance's initial
    /// state. False for an instance that already existed.
    pub fn mutable_args_applied(&self) -> bool {
        self.was_created()
    }
}

// Logs every stage transition of one creation
pub(super) struct StageTracker<'a> {
    module_id: &'a str,
    hat_id: &'a U256,
    chain_id: ChainId,
    stage: CreationStage,
}

impl<'a> StageTracker<'a> {
    pub(super) fn new(module_id: &'a str, hat_id: &'a U256, chain_id: ChainId) -> Self {
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "creation of {} for hat 0x{:x} on chain {}: {}",
                module_id,
                hat_id,
                chain_id,
                CreationStage::Requested
            );
        }
        Self {
            module_id,
            hat_id,
            chain_id,
            stage: CreationStage::Requested,
        }
    }

    #[cfg(test)]
    pub(super) fn stage(&self) -> CreationStage {
        self.stage
    }

    pub(super) fn advance(&mut self, next: CreationStage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "invalid creation transition {} -> {}",
            self.stage,
            next
        );
        if next == CreationStage::Confirmed {
            info!(
                "created {} instance for hat 0x{:x} on chain {}",
                self.module_id, self.hat_id, self.chain_id
            );
        } else if log::log_enabled!(log::Level::Debug) {
            debug!(
                "creation of {} for hat 0x{:x} on chain {}: {} -> {}",
                self.module_id, self.hat_id, self.chain_id, self.stage, next
            );
        }
        self.stage = next;
    }

    /// Mark the creation failed and hand the error back
    pub(super) fn fail(&mut self, error: ModulesError) -> ModulesError {
        warn!(
            "creation of {} for hat 0x{:x} on chain {} failed at {}: {}",
            self.module_id, self.hat_id, self.chain_id, self.stage, error
        );
        self.stage = CreationStage::Failed;
        error
    }
}
