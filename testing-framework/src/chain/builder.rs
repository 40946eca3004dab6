//! TestChainBuilder - Fluent API for configuring TestChain instances

use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use hats_modules_common::{
    chain::ChainId,
    config::{DEFAULT_FACTORY_ADDRESS, HATS_PROTOCOL_ADDRESS},
    crypto::Address,
    registry::Registry,
};
use log::debug;
use parking_lot::Mutex;

use super::{ChainCounters, ChainState, Contract, Faults, TestAccount, TestChain};

/// Version reported by implementations registered without one
pub const DEFAULT_IMPLEMENTATION_VERSION: &str = "0.1.0";

/// Builder for TestChain instances
///
/// # Example
///
/// ```rust,ignore
/// use hats_modules_testing::prelude::*;
///
/// let deployer = TestAccount::new("deployer");
/// let chain = TestChainBuilder::new(ChainId::GNOSIS)
///     .with_registry_implementations(&registry)
///     .with_account(deployer.clone())
///     .build();
/// ```
pub struct TestChainBuilder {
    chain_id: ChainId,
    factory: Address,
    hats: Address,
    implementations: Vec<(Address, String)>,
    accounts: Vec<TestAccount>,
    submission_delay: Duration,
}

impl TestChainBuilder {
    /// Create a builder for `chain_id`
    ///
    /// Default configuration:
    /// - the production factory and Hats protocol addresses
    /// - no implementations, no accounts
    /// - immediate confirmation
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            factory: DEFAULT_FACTORY_ADDRESS,
            hats: HATS_PROTOCOL_ADDRESS,
            implementations: Vec::new(),
            accounts: Vec::new(),
            submission_delay: Duration::ZERO,
        }
    }

    pub fn with_factory(mut self, factory: Address) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_hats(mut self, hats: Address) -> Self {
        self.hats = hats;
        self
    }

    /// Deploy implementation code at `address`
    pub fn with_implementation(mut self, address: Address, version: &str) -> Self {
        self.implementations.push((address, version.to_string()));
        self
    }

    /// Deploy every implementation the registry lists for this chain
    ///
    /// Modules without a deployment on the chain are left out, so creating
    /// them reverts like it would against a real node.
    pub fn with_registry_implementations(mut self, registry: &Registry) -> Self {
        for module in registry.modules_on_chain(self.chain_id) {
            if let Some(deployment) = module.deployment_on(self.chain_id) {
                self.implementations.push((
                    deployment.address,
                    DEFAULT_IMPLEMENTATION_VERSION.to_string(),
                ));
            }
        }
        self
    }

    /// Accept transactions signed by `account`
    pub fn with_account(mut self, account: TestAccount) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn with_submission_delay(mut self, delay: Duration) -> Self {
        self.submission_delay = delay;
        self
    }

    pub fn build(self) -> TestChain {
        let contracts: HashMap<Address, Contract> = self
            .implementations
            .into_iter()
            .map(|(address, version)| (address, Contract::Implementation { version }))
            .collect();
        let accounts: HashSet<Address> = self
            .accounts
            .iter()
            .map(|account| account.address)
            .collect();

        debug!(
            "test chain {} with {} implementations and {} accounts",
            self.chain_id,
            contracts.len(),
            accounts.len()
        );

        TestChain {
            chain_id: self.chain_id,
            factory: self.factory,
            hats: self.hats,
            state: Mutex::new(ChainState {
                block_number: 0,
                contracts,
                accounts,
                counters: ChainCounters::default(),
                faults: Faults {
                    submission_delay: self.submission_delay,
                    ..Faults::default()
                },
            }),
        }
    }
}
