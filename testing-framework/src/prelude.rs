// Prelude for integration tests: `use hats_modules_testing::prelude::*;`

pub use crate::chain::{
    ChainCounters, InstanceRecord, TestAccount, TestChain, TestChainBuilder,
};
pub use crate::fixtures::*;
pub use crate::utilities::{
    child_hat_id, hat_id_from_str, top_hat_id, HatIdGenerator, TestHarness, DEPLOYER_LABEL,
};

pub use hats_modules_common::{
    args::{coerce, coerce_args, NativeValue},
    batch::{BatchReport, BatchRunner, ModuleReport},
    chain::{AccessError, ChainId, ChainReader, ChainWriter},
    config::{ClientConfig, RetryPolicy},
    crypto::Address,
    error::{ModulesError, ModulesResult},
    factory::{CreateInstanceRequest, CreationOutcome, InstanceFactoryClient, InstanceResult},
    registry::Registry,
    types::{map_type, ValueCategory},
    verifier::{StateVerifier, HAT_ID_FIELD},
};

pub use alloy_primitives::U256;
pub use std::str::FromStr;
pub use std::sync::Arc;
pub use std::time::Duration;
