// Batch runner
//
// Creates and verifies one instance per module deployed on the client
// chain, using each module's registry examples. A failing module is
// reported and never stops the others.

use std::sync::Arc;

use alloy_primitives::U256;
use futures::{stream, StreamExt};
use log::{info, warn};

use crate::{
    args::NativeValue,
    chain::{ChainReader, ChainWriter},
    error::ModulesResult,
    factory::{InstanceFactoryClient, InstanceResult},
    registry::Module,
    verifier::{StateVerifier, HAT_ID_FIELD},
};

/// A created (or found) instance and whether its `hatId` matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedInstance {
    pub instance: InstanceResult,
    pub verified: bool,
}

#[derive(Debug)]
pub struct ModuleReport {
    pub module_id: String,
    pub name: String,
    pub result: ModulesResult<DeployedInstance>,
}

impl ModuleReport {
    pub fn is_success(&self) -> bool {
        matches!(&self.result, Ok(deployed) if deployed.verified)
    }
}

/// Outcome of a batch, in registry order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub reports: Vec<ModuleReport>,
    /// Modules with no deployment on the client chain
    pub skipped: Vec<String>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &ModuleReport> {
        self.reports.iter().filter(|report| report.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ModuleReport> {
        self.reports.iter().filter(|report| !report.is_success())
    }

    pub fn is_all_success(&self) -> bool {
        self.reports.iter().all(ModuleReport::is_success)
    }
}

pub struct BatchRunner<R: ChainReader, W: ChainWriter> {
    client: Arc<InstanceFactoryClient<R, W>>,
    verifier: StateVerifier<R>,
}

impl<R: ChainReader, W: ChainWriter> BatchRunner<R, W> {
    pub fn new(client: Arc<InstanceFactoryClient<R, W>>) -> Self {
        let verifier = StateVerifier::new(client.reader().clone(), client.config().read_retry);
        Self { client, verifier }
    }

    /// Run every module deployed on the client chain for `hat_id`
    pub async fn run(&self, hat_id: U256, signer: &W::Signer) -> BatchReport {
        let chain_id = self.client.config().chain_id;
        let registry = self.client.registry();

        let skipped: Vec<String> = registry
            .get_all_modules()
            .values()
            .filter(|module| !module.is_deployed_on(chain_id))
            .map(|module| module.id.clone())
            .collect();

        let reports: Vec<ModuleReport> = stream::iter(
            registry
                .modules_on_chain(chain_id)
                .map(move |module| self.process(module, hat_id, signer)),
        )
        .buffered(self.client.config().max_concurrency)
        .collect()
        .await;

        let report = BatchReport { reports, skipped };
        info!(
            "batch for hat 0x{:x} on chain {}: {} succeeded, {} failed, {} skipped",
            hat_id,
            chain_id,
            report.succeeded().count(),
            report.failed().count(),
            report.skipped.len()
        );
        report
    }

    async fn process(&self, module: &Module, hat_id: U256, signer: &W::Signer) -> ModuleReport {
        let result = self.deploy_and_verify(module, hat_id, signer).await;
        match &result {
            Ok(deployed) if !deployed.verified => warn!(
                "{} instance at {} does not report hat 0x{:x}",
                module.id, deployed.instance.new_instance, hat_id
            ),
            Err(e) => warn!("{} failed ({}): {}", module.id, e.kind(), e),
            Ok(_) => {}
        }
        ModuleReport {
            module_id: module.id.clone(),
            name: module.name.clone(),
            result,
        }
    }

    async fn deploy_and_verify(
        &self,
        module: &Module,
        hat_id: U256,
        signer: &W::Signer,
    ) -> ModulesResult<DeployedInstance> {
        let instance = self
            .client
            .create_instance_from_examples(&module.id, hat_id, signer)
            .await?;
        let verified = self
            .verifier
            .verify_field(
                &instance.new_instance,
                &module.abi,
                HAT_ID_FIELD,
                &NativeValue::Uint(hat_id),
            )
            .await?;
        Ok(DeployedInstance { instance, verified })
    }
}
