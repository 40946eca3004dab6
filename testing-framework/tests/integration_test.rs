//! Basic integration test to verify framework compilation
//!
//! This smoke test ensures the framework compiles and the harness
//! wires a chain, registry and client together.

use hats_modules_testing::prelude::*;

#[test]
fn test_framework_version() {
    use hats_modules_testing::VERSION;

    assert_eq!(VERSION, "0.1.0");
    assert!(hats_modules_common::config::VERSION.starts_with(VERSION));
}

#[test]
fn test_harness_creation() {
    let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
    assert_eq!(harness.chain.chain_id(), ChainId::GNOSIS);
    assert_eq!(harness.chain.factory_address(), harness.client.config().factory_address);
    assert_eq!(harness.chain.hats_address(), harness.client.config().hats_address);
    assert_eq!(harness.registry.len(), 4);
    assert_eq!(harness.chain.counters(), ChainCounters::default());
}

#[test]
fn test_harness_rejects_invalid_config() {
    let config = ClientConfig::for_chain(ChainId::GNOSIS).with_max_concurrency(0);
    assert!(TestHarness::with_config(config, &sample_registry_json()).is_err());
}

#[test]
fn test_harness_rejects_malformed_registry() {
    let raw = serde_json::json!({ "broken-v1": { "name": "Broken" } });
    assert!(TestHarness::new(ChainId::GNOSIS, &raw).is_err());
}
