//! Reading instance state back through a flaky connection

use hats_modules_testing::prelude::*;

const RETRY: RetryPolicy = RetryPolicy {
    max_attempts: 3,
    initial_backoff: Duration::from_millis(100),
    max_backoff: Duration::from_secs(1),
};

async fn deployed_hatter(harness: &TestHarness, hat_id: U256) -> Address {
    harness
        .client
        .create_instance_from_examples(HATTER_CLONE_ID, hat_id, &harness.deployer)
        .await
        .unwrap()
        .new_instance
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_within_policy_are_absorbed() {
    let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
    let hat_id = top_hat_id(11);
    let instance = deployed_hatter(&harness, hat_id).await;
    let module = harness.registry.get_module(HATTER_CLONE_ID).unwrap();

    harness.chain.fail_next_reads(2);
    let reads_before = harness.chain.counters().reads;
    let verifier = StateVerifier::new(harness.chain.clone(), RETRY);
    let verified = verifier
        .verify_field(&instance, &module.abi, HAT_ID_FIELD, &NativeValue::Uint(hat_id))
        .await
        .unwrap();
    assert!(verified);
    assert_eq!(harness.chain.counters().reads - reads_before, 3);
}

#[tokio::test(start_paused = true)]
async fn test_failures_beyond_policy_report_attempts() {
    let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
    let instance = deployed_hatter(&harness, top_hat_id(12)).await;
    let module = harness.registry.get_module(HATTER_CLONE_ID).unwrap();

    harness.chain.fail_next_reads(5);
    let verifier = StateVerifier::new(harness.chain.clone(), RETRY);
    let err = verifier
        .read_field(&instance, &module.abi, HAT_ID_FIELD)
        .await
        .unwrap_err();
    match &err {
        ModulesError::Read {
            address,
            field,
            attempts,
            reverted,
            ..
        } => {
            assert_eq!(*address, instance);
            assert_eq!(field, HAT_ID_FIELD);
            assert_eq!(*attempts, 3);
            assert!(!reverted);
        }
        other => panic!("expected read error, got {:?}", other),
    }
    assert!(err.is_retryable());

    // Two injected failures remain for the next caller
    let value = verifier
        .read_field(&instance, &module.abi, HAT_ID_FIELD)
        .await
        .unwrap();
    assert_eq!(value, NativeValue::Uint(top_hat_id(12)));
}

#[tokio::test(start_paused = true)]
async fn test_revert_is_not_retried() {
    let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
    let module = harness.registry.get_module(HATTER_CLONE_ID).unwrap();
    let nowhere = Address::from_str("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();

    let verifier = StateVerifier::new(harness.chain.clone(), RETRY);
    let err = verifier
        .read_field(&nowhere, &module.abi, HAT_ID_FIELD)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ModulesError::Read {
            attempts: 1,
            reverted: true,
            ..
        }
    ));
    assert!(!err.is_retryable());
    assert_eq!(harness.chain.counters().reads, 1);
}

#[tokio::test]
async fn test_unknown_field_never_reaches_the_chain() {
    let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
    let instance = deployed_hatter(&harness, top_hat_id(13)).await;
    let module = harness.registry.get_module(HATTER_CLONE_ID).unwrap();

    let err = harness
        .verifier()
        .read_field(&instance, &module.abi, "wearer")
        .await
        .unwrap_err();
    assert!(matches!(err, ModulesError::UnknownFunction { name } if name == "wearer"));
    assert_eq!(harness.chain.counters().reads, 0);
}

#[tokio::test]
async fn test_mismatch_is_not_an_error() {
    let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
    let instance = deployed_hatter(&harness, top_hat_id(14)).await;
    let module = harness.registry.get_module(HATTER_CLONE_ID).unwrap();

    let verified = harness
        .verifier()
        .verify_field(
            &instance,
            &module.abi,
            HAT_ID_FIELD,
            &NativeValue::Uint(top_hat_id(15)),
        )
        .await
        .unwrap();
    assert!(!verified);
}
