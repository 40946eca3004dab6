//! TestHarness - a TestChain with the modules client on top

use std::sync::Arc;

use anyhow::{Context, Result};
use hats_modules_common::{
    batch::BatchRunner,
    chain::ChainId,
    config::ClientConfig,
    factory::InstanceFactoryClient,
    registry::Registry,
    verifier::StateVerifier,
};
use serde_json::Value;

use crate::chain::{TestAccount, TestChain, TestChainBuilder};

/// Label of the account every harness funds
pub const DEPLOYER_LABEL: &str = "deployer";

pub type TestFactoryClient = InstanceFactoryClient<TestChain, TestChain>;

/// One chain, one registry and the clients built over them
///
/// # Example
///
/// ```rust,ignore
/// use hats_modules_testing::prelude::*;
///
/// let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json())?;
/// let result = harness
///     .client
///     .create_instance_from_examples(HATTER_CLONE_ID, top_hat_id(1), &harness.deployer)
///     .await?;
/// ```
pub struct TestHarness {
    pub chain: Arc<TestChain>,
    pub registry: Arc<Registry>,
    pub client: Arc<TestFactoryClient>,
    pub deployer: TestAccount,
}

impl TestHarness {
    /// Harness with the default client configuration for `chain_id`
    pub fn new(chain_id: ChainId, registry: &Value) -> Result<Self> {
        Self::with_config(ClientConfig::for_chain(chain_id), registry)
    }

    /// Harness whose chain deploys every implementation the registry lists
    /// for `config.chain_id`, at the configured factory and Hats addresses
    pub fn with_config(config: ClientConfig, registry: &Value) -> Result<Self> {
        let registry = Arc::new(Registry::build(registry).context("building test registry")?);
        let deployer = TestAccount::new(DEPLOYER_LABEL);
        let chain = Arc::new(
            TestChainBuilder::new(config.chain_id)
                .with_factory(config.factory_address)
                .with_hats(config.hats_address)
                .with_registry_implementations(&registry)
                .with_account(deployer.clone())
                .build(),
        );
        let client = Arc::new(
            InstanceFactoryClient::new(registry.clone(), chain.clone(), chain.clone(), config)
                .context("creating factory client")?,
        );

        Ok(Self {
            chain,
            registry,
            client,
            deployer,
        })
    }

    pub fn verifier(&self) -> StateVerifier<TestChain> {
        StateVerifier::new(self.chain.clone(), self.client.config().read_retry)
    }

    pub fn batch_runner(&self) -> BatchRunner<TestChain, TestChain> {
        BatchRunner::new(self.client.clone())
    }
}
