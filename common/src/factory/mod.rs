// Instance Factory Client
//
// Turns a module id, a hat id and typed arguments into one deterministic
// module instance. Immutable args are part of the instance identity and
// the derived address; mutable args only travel as initialization data.

mod address;
mod request;

pub use address::*;
pub use request::*;

use std::sync::Arc;

use alloy_primitives::U256;
use alloy_sol_types::{sol, SolCall};
use log::{debug, trace, warn};

use crate::{
    abi::{encode, encode_packed, ContractInterface},
    args::{coerce_args, NativeValue},
    chain::{AccessError, ChainReader, ChainWriter, TransactionIntent},
    config::ClientConfig,
    crypto::Address,
    error::{ModulesError, ModulesResult},
    registry::{ArgSpec, Deployment, Module, Registry},
    types::ValueCategory,
};

pub const CREATE_HATS_MODULE_SIGNATURE: &str = "createHatsModule(address,uint256,bytes,bytes)";

sol! {
    /// Factory entry point creating one module instance
    function createHatsModule(
        address implementation,
        uint256 hatId,
        bytes otherImmutableArgs,
        bytes initData
    ) external returns (address instance);
}

/// Calldata of `createHatsModule(implementation, hatId, otherImmutableArgs, initData)`
pub fn creation_calldata(
    implementation: &Address,
    hat_id: &U256,
    packed_immutable_args: &[u8],
    init_data: &[u8],
) -> Vec<u8> {
    createHatsModuleCall {
        implementation: *implementation,
        hatId: *hat_id,
        otherImmutableArgs: packed_immutable_args.to_vec().into(),
        initData: init_data.to_vec().into(),
    }
    .abi_encode()
}

// Module resolved against the client chain
struct Target<'a> {
    module: &'a Module,
    deployment: &'a Deployment,
}

/// Validated and encoded creation arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArgs {
    /// `abi.encodePacked(immutableArgs)`
    pub packed_immutable: Vec<u8>,
    /// `abi.encode(mutableArgs)`
    pub init_data: Vec<u8>,
}

/// Client for the Hats module factory on one chain
///
/// Chain access goes through the reader and writer the caller supplies.
pub struct InstanceFactoryClient<R: ChainReader, W: ChainWriter> {
    registry: Arc<Registry>,
    reader: Arc<R>,
    writer: Arc<W>,
    config: ClientConfig,
}

impl<R: ChainReader, W: ChainWriter> InstanceFactoryClient<R, W> {
    pub fn new(
        registry: Arc<Registry>,
        reader: Arc<R>,
        writer: Arc<W>,
        config: ClientConfig,
    ) -> ModulesResult<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            reader,
            writer,
            config,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn target(&self, module_id: &str) -> ModulesResult<Target<'_>> {
        let module = self.registry.get_module(module_id)?;
        let deployment =
            module
                .deployment_on(self.config.chain_id)
                .ok_or_else(|| ModulesError::NotDeployed {
                    module_id: module_id.to_string(),
                    chain_id: self.config.chain_id,
                })?;
        Ok(Target { module, deployment })
    }

    // Per-deployment factory override, else the configured one
    fn factory_for(&self, deployment: &Deployment) -> Address {
        deployment.factory.unwrap_or(self.config.factory_address)
    }

    /// Check both argument sequences against the module's schema and encode them
    ///
    /// Lengths must match exactly and every value must conform to its
    /// declared category. Nothing is coerced at this point.
    pub fn validate_args(
        &self,
        module: &Module,
        immutable_args: &[NativeValue],
        mutable_args: &[NativeValue],
    ) -> ModulesResult<EncodedArgs> {
        let immutable = check_args(
            &module.id,
            "immutable",
            &module.creation_args.immutable,
            immutable_args,
        )?;
        let mutable = check_args(
            &module.id,
            "mutable",
            &module.creation_args.mutable,
            mutable_args,
        )?;

        let packed_immutable =
            encode_packed(&immutable, immutable_args).map_err(|e| ModulesError::Validation {
                module_id: module.id.clone(),
                reason: format!("immutable args: {}", e),
            })?;
        let init_data = encode(&mutable, mutable_args).map_err(|e| ModulesError::Validation {
            module_id: module.id.clone(),
            reason: format!("mutable args: {}", e),
        })?;

        Ok(EncodedArgs {
            packed_immutable,
            init_data,
        })
    }

    /// Address the instance of `module_id` for `hat_id` has, or will have,
    /// on the client chain
    pub fn predict_instance_address(
        &self,
        module_id: &str,
        hat_id: &U256,
        immutable_args: &[NativeValue],
    ) -> ModulesResult<Address> {
        let target = self.target(module_id)?;
        let immutable = check_args(
            module_id,
            "immutable",
            &target.module.creation_args.immutable,
            immutable_args,
        )?;
        let packed =
            encode_packed(&immutable, immutable_args).map_err(|e| ModulesError::Validation {
                module_id: module_id.to_string(),
                reason: format!("immutable args: {}", e),
            })?;
        self.predict_for(&target, hat_id, &packed)
    }

    fn predict_for(
        &self,
        target: &Target<'_>,
        hat_id: &U256,
        packed_immutable: &[u8],
    ) -> ModulesResult<Address> {
        predict_instance_address(
            &self.factory_for(target.deployment),
            self.config.chain_id,
            &target.deployment.address,
            &self.config.hats_address,
            hat_id,
            packed_immutable,
        )
    }

    /// Whether the instance already has code on the client chain
    pub async fn is_instance_deployed(
        &self,
        module_id: &str,
        hat_id: &U256,
        immutable_args: &[NativeValue],
    ) -> ModulesResult<bool> {
        let address = self.predict_instance_address(module_id, hat_id, immutable_args)?;
        self.has_code(&address).await
    }

    async fn has_code(&self, address: &Address) -> ModulesResult<bool> {
        self.reader
            .has_code(address)
            .await
            .map_err(|e| ModulesError::Read {
                address: *address,
                field: "code".to_string(),
                reverted: !e.is_transient(),
                reason: e.reason().to_string(),
                attempts: 1,
            })
    }

    /// Create the instance of a module scoped to a hat
    ///
    /// Arguments are validated before anything touches the chain. When the
    /// derived address already holds code the existing instance is returned
    /// as `CreationOutcome::AlreadyDeployed` without submitting. Otherwise
    /// exactly one creation transaction is submitted. A revert is also
    /// reported as `AlreadyDeployed` when the address holds code afterwards,
    /// which is how a concurrent creation of the same instance shows up.
    /// If the submission is not confirmed within the configured timeout the
    /// call fails with `AmbiguousOutcome` and is not resubmitted.
    ///
    /// Mutable args only reach the chain through a creation. An
    /// `AlreadyDeployed` result keeps the existing instance's state even
    /// when the request carried different mutable args; check
    /// `InstanceResult::mutable_args_applied` and update the instance
    /// through its own setters if needed.
    pub async fn create_instance(
        &self,
        request: CreateInstanceRequest,
        signer: &W::Signer,
    ) -> ModulesResult<InstanceResult> {
        let chain_id = self.config.chain_id;
        let mut tracker = StageTracker::new(&request.module_id, &request.hat_id, chain_id);

        let target = self
            .target(&request.module_id)
            .map_err(|e| tracker.fail(e))?;
        let encoded = self
            .validate_args(target.module, &request.immutable_args, &request.mutable_args)
            .map_err(|e| tracker.fail(e))?;
        tracker.advance(CreationStage::ArgsValidated);

        let predicted = self
            .predict_for(&target, &request.hat_id, &encoded.packed_immutable)
            .map_err(|e| tracker.fail(e))?;
        tracker.advance(CreationStage::AddressComputed);
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "instance of {} for hat 0x{:x} resolves to {}",
                request.module_id, request.hat_id, predicted
            );
        }

        if self.has_code(&predicted).await.map_err(|e| tracker.fail(e))? {
            debug!("{} already has code, skipping submission", predicted);
            return Ok(already_deployed(&mut tracker, &request, predicted));
        }

        let data = creation_calldata(
            &target.deployment.address,
            &request.hat_id,
            &encoded.packed_immutable,
            &encoded.init_data,
        );
        let intent = TransactionIntent {
            chain_id,
            to: self.factory_for(target.deployment),
            data,
            value: U256::ZERO,
            description: format!(
                "create {} instance for hat 0x{:x}",
                request.module_id, request.hat_id
            ),
        };
        if log::log_enabled!(log::Level::Trace) {
            trace!(
                "submitting {} ({} bytes of calldata) to {}",
                intent.description,
                intent.data.len(),
                intent.to
            );
        }

        tracker.advance(CreationStage::Submitted);
        let submission = tokio::time::timeout(
            self.config.submission_timeout,
            self.writer.submit(intent, signer),
        )
        .await;

        let receipt = match submission {
            Err(_) => {
                return Err(tracker.fail(ModulesError::AmbiguousOutcome {
                    module_id: request.module_id.clone(),
                    hat_id: request.hat_id,
                    chain_id,
                    predicted,
                    timeout: self.config.submission_timeout,
                }))
            }
            Ok(Err(AccessError::Transport(reason))) => {
                return Err(tracker.fail(ModulesError::Submission {
                    module_id: request.module_id.clone(),
                    hat_id: request.hat_id,
                    chain_id,
                    reason,
                }))
            }
            Ok(Err(AccessError::Revert(reason))) => {
                // A concurrent creation of the same instance landed between
                // the code check and our submission
                if let Ok(true) = self.has_code(&predicted).await {
                    debug!(
                        "creation of {} reverted ({}) but {} now has code",
                        request.module_id, reason, predicted
                    );
                    return Ok(already_deployed(&mut tracker, &request, predicted));
                }
                return Err(tracker.fail(ModulesError::Revert {
                    module_id: request.module_id.clone(),
                    hat_id: request.hat_id,
                    chain_id,
                    reason,
                }))
            }
            Ok(Ok(receipt)) => receipt,
        };

        tracker.advance(CreationStage::Confirmed);
        Ok(InstanceResult {
            new_instance: predicted,
            outcome: CreationOutcome::Created(receipt),
        })
    }

    /// Coerce the module's registry examples and create an instance from them
    pub async fn create_instance_from_examples(
        &self,
        module_id: &str,
        hat_id: U256,
        signer: &W::Signer,
    ) -> ModulesResult<InstanceResult> {
        let module = self.registry.get_module(module_id)?;
        let request = CreateInstanceRequest::new(module_id, hat_id)
            .with_immutable_args(coerce_args(&module.creation_args.immutable)?)
            .with_mutable_args(coerce_args(&module.creation_args.mutable)?);
        self.create_instance(request, signer).await
    }

    /// Interface of the module behind `module_id`, for reading instance state
    pub fn module_interface(&self, module_id: &str) -> ModulesResult<&ContractInterface> {
        Ok(&self.registry.get_module(module_id)?.abi)
    }
}

fn already_deployed(
    tracker: &mut StageTracker<'_>,
    request: &CreateInstanceRequest,
    instance: Address,
) -> InstanceResult {
    if !request.mutable_args.is_empty() {
        warn!(
            "{} instance {} already exists, its {} mutable args were not reapplied",
            request.module_id,
            instance,
            request.mutable_args.len()
        );
    }
    tracker.advance(CreationStage::Confirmed);
    InstanceResult {
        new_instance: instance,
        outcome: CreationOutcome::AlreadyDeployed,
    }
}

// Length and category check of one argument sequence
fn check_args(
    module_id: &str,
    group: &str,
    specs: &[ArgSpec],
    values: &[NativeValue],
) -> ModulesResult<Vec<ValueCategory>> {
    if specs.len() != values.len() {
        return Err(ModulesError::Validation {
            module_id: module_id.to_string(),
            reason: format!(
                "expected {} {} args, got {}",
                specs.len(),
                group,
                values.len()
            ),
        });
    }

    specs
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (spec, value))| {
            let category = spec.category()?;
            if !value.conforms_to(&category) {
                return Err(ModulesError::Validation {
                    module_id: module_id.to_string(),
                    reason: format!(
                        "{} arg {} ({}) expects {}, got {}",
                        group,
                        index,
                        spec.name,
                        category,
                        value.kind()
                    ),
                });
            }
            Ok(category)
        })
        .collect()
}
