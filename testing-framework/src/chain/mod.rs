//! In-process EVM-like chain for exercising the modules client
//!
//! `TestChain` implements both [`ChainReader`] and [`ChainWriter`]. It
//! understands a single transaction, the factory's `createHatsModule`, and
//! applies the same CREATE2 derivation the client predicts with, so a
//! wrong prediction shows up as a verification failure.
//!
//! ## Fault injection
//!
//! - failing the next N submissions with a transport error
//! - delaying confirmation after the state change was applied
//! - failing the next N reads with a transport error
//! - reverting every creation for selected hats
//! - yielding before each submission is applied, so concurrent creations
//!   all pass their code check before the first one lands

mod builder;
mod calldata;

pub use builder::TestChainBuilder;
pub use calldata::{decode_create_module, CreateModuleCall};

use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use alloy_primitives::U256;
use async_trait::async_trait;
use hats_modules_common::{
    abi::ContractInterface,
    args::NativeValue,
    chain::{AccessError, ChainId, ChainReader, ChainWriter, Receipt, TransactionIntent},
    crypto::{keccak256, keccak256_concat, Address},
    factory::predict_instance_address,
};
use log::{debug, trace};
use parking_lot::Mutex;

/// Gas charged for every creation
pub const CREATION_GAS: u64 = 180_000;

/// Signing identity accepted by [`TestChain`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestAccount {
    pub label: String,
    pub address: Address,
}

impl TestAccount {
    /// Deterministic account derived from its label
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            address: Address::from_word(keccak256(label.as_bytes())),
        }
    }
}

/// A module instance created through the factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub implementation: Address,
    pub hats: Address,
    pub hat_id: U256,
    pub other_immutable_args: Vec<u8>,
    pub init_data: Vec<u8>,
    pub created_by: Address,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Contract {
    Implementation { version: String },
    Instance(InstanceRecord),
}

/// Operation counters, for asserting how often the client touched the chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainCounters {
    pub submissions: usize,
    pub reverts: usize,
    pub reads: usize,
    pub code_checks: usize,
}

#[derive(Debug, Default)]
struct Faults {
    failing_submissions: usize,
    failing_reads: usize,
    submission_delay: Duration,
    reverting_hats: HashSet<U256>,
    interleaved_submissions: bool,
}

#[derive(Debug)]
struct ChainState {
    block_number: u64,
    contracts: HashMap<Address, Contract>,
    accounts: HashSet<Address>,
    counters: ChainCounters,
    faults: Faults,
}

/// In-memory chain with a Hats module factory deployed
pub struct TestChain {
    chain_id: ChainId,
    factory: Address,
    hats: Address,
    state: Mutex<ChainState>,
}

impl TestChain {
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn factory_address(&self) -> Address {
        self.factory
    }

    pub fn hats_address(&self) -> Address {
        self.hats
    }

    pub fn block_number(&self) -> u64 {
        self.state.lock().block_number
    }

    pub fn counters(&self) -> ChainCounters {
        self.state.lock().counters
    }

    /// Place implementation code at `address`
    pub fn deploy_implementation(&self, address: Address, version: &str) {
        self.state.lock().contracts.insert(
            address,
            Contract::Implementation {
                version: version.to_string(),
            },
        );
    }

    pub fn add_account(&self, account: &TestAccount) {
        self.state.lock().accounts.insert(account.address);
    }

    pub fn instance(&self, address: &Address) -> Option<InstanceRecord> {
        match self.state.lock().contracts.get(address) {
            Some(Contract::Instance(record)) => Some(record.clone()),
            _ => None,
        }
    }

    pub fn instance_count(&self) -> usize {
        self.state
            .lock()
            .contracts
            .values()
            .filter(|contract| matches!(contract, Contract::Instance(_)))
            .count()
    }

    /// Fail the next `count` submissions with a transport error
    pub fn fail_next_submissions(&self, count: usize) {
        self.state.lock().faults.failing_submissions = count;
    }

    /// Fail the next `count` field reads with a transport error
    pub fn fail_next_reads(&self, count: usize) {
        self.state.lock().faults.failing_reads = count;
    }

    /// Confirm submissions only after `delay`; the state change is immediate
    pub fn set_submission_delay(&self, delay: Duration) {
        self.state.lock().faults.submission_delay = delay;
    }

    /// Yield to other tasks before applying each submission
    pub fn set_interleaved_submissions(&self, enabled: bool) {
        self.state.lock().faults.interleaved_submissions = enabled;
    }

    /// Revert every creation scoped to `hat_id`
    pub fn revert_hat(&self, hat_id: U256) {
        self.state.lock().faults.reverting_hats.insert(hat_id);
    }

    // Applies one creation, returning the receipt or the revert reason
    fn apply_creation(
        &self,
        state: &mut ChainState,
        intent: &TransactionIntent,
        sender: &Address,
    ) -> Result<Receipt, String> {
        if intent.to != self.factory {
            return Err(format!("no factory at {}", intent.to));
        }
        let call = decode_create_module(&intent.data)?;

        match state.contracts.get(&call.implementation) {
            Some(Contract::Implementation { .. }) => {}
            _ => {
                return Err(format!(
                    "implementation {} has no code",
                    call.implementation
                ))
            }
        }
        if state.faults.reverting_hats.contains(&call.hat_id) {
            return Err(format!("invalid hat 0x{:x}", call.hat_id));
        }

        let address = predict_instance_address(
            &self.factory,
            self.chain_id,
            &call.implementation,
            &self.hats,
            &call.hat_id,
            &call.other_immutable_args,
        )
        .map_err(|e| e.to_string())?;
        if state.contracts.contains_key(&address) {
            return Err(format!("instance already exists at {}", address));
        }

        state.block_number += 1;
        let block_number = state.block_number;
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "block {}: {} created instance {} of {} for hat 0x{:x}",
                block_number, sender, address, call.implementation, call.hat_id
            );
        }
        state.contracts.insert(
            address,
            Contract::Instance(InstanceRecord {
                implementation: call.implementation,
                hats: self.hats,
                hat_id: call.hat_id,
                other_immutable_args: call.other_immutable_args,
                init_data: call.init_data,
                created_by: *sender,
                block_number,
            }),
        );

        Ok(Receipt {
            transaction_hash: keccak256_concat(&[&intent.data, &block_number.to_be_bytes()]),
            block_number,
            gas_used: CREATION_GAS,
        })
    }
}

#[async_trait]
impl ChainWriter for TestChain {
    type Signer = TestAccount;

    async fn submit(
        &self,
        intent: TransactionIntent,
        signer: &TestAccount,
    ) -> Result<Receipt, AccessError> {
        let interleaved = self.state.lock().faults.interleaved_submissions;
        if interleaved {
            tokio::task::yield_now().await;
        }

        let (result, delay) = {
            let mut state = self.state.lock();
            state.counters.submissions += 1;

            if state.faults.failing_submissions > 0 {
                state.faults.failing_submissions -= 1;
                return Err(AccessError::Transport(
                    "injected submission failure".to_string(),
                ));
            }
            if intent.chain_id != self.chain_id {
                return Err(AccessError::Transport(format!(
                    "connected to chain {}, transaction targets {}",
                    self.chain_id, intent.chain_id
                )));
            }
            if !state.accounts.contains(&signer.address) {
                return Err(AccessError::Transport(format!(
                    "unknown signer {}",
                    signer.label
                )));
            }

            let result = self.apply_creation(&mut state, &intent, &signer.address);
            if result.is_err() {
                state.counters.reverts += 1;
            }
            (result, state.faults.submission_delay)
        };

        if !delay.is_zero() {
            trace!("holding confirmation of {} for {:?}", intent.description, delay);
            tokio::time::sleep(delay).await;
        }
        result.map_err(AccessError::Revert)
    }
}

#[async_trait]
impl ChainReader for TestChain {
    async fn read_field(
        &self,
        address: &Address,
        abi: &ContractInterface,
        field: &str,
        _args: &[NativeValue],
    ) -> Result<NativeValue, AccessError> {
        let mut state = self.state.lock();
        state.counters.reads += 1;

        if state.faults.failing_reads > 0 {
            state.faults.failing_reads -= 1;
            return Err(AccessError::Transport("injected read failure".to_string()));
        }
        if !abi.has_function(field) {
            return Err(AccessError::Revert(format!("function {} not in ABI", field)));
        }

        let value = match (state.contracts.get(address), field) {
            (None, _) => return Err(AccessError::Revert(format!("no code at {}", address))),
            (Some(Contract::Instance(record)), "hatId") => NativeValue::Uint(record.hat_id),
            (Some(Contract::Instance(record)), "IMPLEMENTATION") => {
                NativeValue::Address(record.implementation)
            }
            (Some(Contract::Instance(record)), "HATS") => NativeValue::Address(record.hats),
            (Some(Contract::Instance(record)), "version") => {
                match state.contracts.get(&record.implementation) {
                    Some(Contract::Implementation { version }) => {
                        NativeValue::String(version.clone())
                    }
                    _ => NativeValue::String(String::new()),
                }
            }
            (Some(Contract::Implementation { version }), "version") => {
                NativeValue::String(version.clone())
            }
            _ => {
                return Err(AccessError::Revert(format!(
                    "{} is not readable at {}",
                    field, address
                )))
            }
        };
        Ok(value)
    }

    async fn has_code(&self, address: &Address) -> Result<bool, AccessError> {
        let mut state = self.state.lock();
        state.counters.code_checks += 1;
        Ok(state.contracts.contains_key(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hats_modules_common::{
        config::{DEFAULT_FACTORY_ADDRESS, HATS_PROTOCOL_ADDRESS},
        factory::creation_calldata,
    };
    use serde_json::json;
    use std::str::FromStr;

    fn implementation() -> Address {
        Address::from_str("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap()
    }

    fn hat_id_abi() -> ContractInterface {
        serde_json::from_value(json!([
            { "type": "function", "name": "hatId", "inputs": [], "stateMutability": "pure" }
        ]))
        .unwrap()
    }

    fn intent(chain: &TestChain, hat_id: U256) -> TransactionIntent {
        TransactionIntent {
            chain_id: chain.chain_id(),
            to: chain.factory_address(),
            data: creation_calldata(&implementation(), &hat_id, &[], &[]),
            value: U256::ZERO,
            description: "test creation".to_string(),
        }
    }

    fn chain_with_deployer() -> (TestChain, TestAccount) {
        let deployer = TestAccount::new("deployer");
        let chain = TestChainBuilder::new(ChainId::GNOSIS)
            .with_implementation(implementation(), "0.1.0")
            .with_account(deployer.clone())
            .build();
        (chain, deployer)
    }

    #[tokio::test]
    async fn test_creation_lands_at_predicted_address() {
        let (chain, deployer) = chain_with_deployer();
        let hat_id = U256::from(9u64);
        let receipt = chain.submit(intent(&chain, hat_id), &deployer).await.unwrap();
        assert_eq!(receipt.block_number, 1);

        let predicted = predict_instance_address(
            &DEFAULT_FACTORY_ADDRESS,
            ChainId::GNOSIS,
            &implementation(),
            &HATS_PROTOCOL_ADDRESS,
            &hat_id,
            &[],
        )
        .unwrap();
        let record = chain.instance(&predicted).unwrap();
        assert_eq!(record.hat_id, hat_id);
        assert_eq!(record.created_by, deployer.address);
        assert_eq!(
            chain
                .read_field(&predicted, &hat_id_abi(), "hatId", &[])
                .await
                .unwrap(),
            NativeValue::Uint(hat_id)
        );
    }

    #[tokio::test]
    async fn test_duplicate_creation_reverts() {
        let (chain, deployer) = chain_with_deployer();
        chain.submit(intent(&chain, U256::from(1u64)), &deployer).await.unwrap();
        let err = chain
            .submit(intent(&chain, U256::from(1u64)), &deployer)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Revert(reason) if reason.contains("already exists")));
        assert_eq!(chain.counters().reverts, 1);
        assert_eq!(chain.instance_count(), 1);
    }

    #[tokio::test]
    async fn test_interleaved_submissions_apply_in_turn() {
        let (chain, deployer) = chain_with_deployer();
        chain.set_interleaved_submissions(true);
        let (first, second) = tokio::join!(
            chain.submit(intent(&chain, U256::from(1u64)), &deployer),
            chain.submit(intent(&chain, U256::from(1u64)), &deployer)
        );
        assert!(first.is_ok());
        assert!(matches!(second, Err(AccessError::Revert(reason)) if reason.contains("already exists")));
        assert_eq!(chain.instance_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_signer_is_a_transport_error() {
        let (chain, _) = chain_with_deployer();
        let err = chain
            .submit(intent(&chain, U256::from(1u64)), &TestAccount::new("stranger"))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(chain.instance_count(), 0);
    }

    #[tokio::test]
    async fn test_injected_faults_are_consumed() {
        let (chain, deployer) = chain_with_deployer();
        chain.fail_next_submissions(1);
        assert!(chain
            .submit(intent(&chain, U256::from(1u64)), &deployer)
            .await
            .unwrap_err()
            .is_transient());
        assert!(chain.submit(intent(&chain, U256::from(1u64)), &deployer).await.is_ok());

        chain.revert_hat(U256::from(2u64));
        assert!(matches!(
            chain.submit(intent(&chain, U256::from(2u64)), &deployer).await,
            Err(AccessError::Revert(_))
        ));
        assert_eq!(chain.counters().submissions, 3);
    }

    #[tokio::test]
    async fn test_missing_code_reverts_reads() {
        let (chain, _) = chain_with_deployer();
        let err = chain
            .read_field(&Address::ZERO, &hat_id_abi(), "hatId", &[])
            .await
            .unwrap_err();
        assert!(!err.is_transient());
        assert!(chain.has_code(&implementation()).await.unwrap());
        assert!(!chain.has_code(&Address::ZERO).await.unwrap());
    }
}
