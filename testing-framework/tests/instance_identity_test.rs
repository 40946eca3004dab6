//! Instance identity: immutable args and the hat decide the address,
//! mutable args never do.

use futures::future::join_all;
use hats_modules_testing::prelude::*;
use proptest::prelude::*;

fn owner_hat() -> NativeValue {
    NativeValue::Uint(child_hat_id(top_hat_id(1), 1, 1).unwrap())
}

fn arbitrator_hat() -> NativeValue {
    NativeValue::Uint(child_hat_id(top_hat_id(1), 1, 2).unwrap())
}

fn accounts(addresses: &[&str]) -> NativeValue {
    NativeValue::Array(
        addresses
            .iter()
            .map(|a| NativeValue::Address(Address::from_str(a).unwrap()))
            .collect(),
    )
}

fn allowlist_request(hat_id: U256, initial_accounts: NativeValue) -> CreateInstanceRequest {
    CreateInstanceRequest::new(ALLOWLIST_ID, hat_id)
        .with_immutable_args(vec![owner_hat(), arbitrator_hat()])
        .with_mutable_args(vec![initial_accounts])
}

#[tokio::test]
async fn test_mutable_args_do_not_change_the_instance() {
    let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
    let hat_id = top_hat_id(7);

    let first = harness
        .client
        .create_instance(
            allowlist_request(hat_id, accounts(&["0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"])),
            &harness.deployer,
        )
        .await
        .unwrap();
    assert!(first.was_created());

    let second = harness
        .client
        .create_instance(
            allowlist_request(hat_id, accounts(&["0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"])),
            &harness.deployer,
        )
        .await
        .unwrap();
    assert_eq!(second.new_instance, first.new_instance);
    assert_eq!(second.outcome, CreationOutcome::AlreadyDeployed);
    assert!(!second.mutable_args_applied());

    // Only the first call reached the chain; the stored configuration is the first one
    assert_eq!(harness.chain.counters().submissions, 1);
    let record = harness.chain.instance(&first.new_instance).unwrap();
    let first_address = Address::from_str("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
    assert!(record
        .init_data
        .windows(20)
        .any(|window| window == first_address.as_slice()));
}

#[tokio::test]
async fn test_prediction_matches_creation() {
    let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
    let hat_id = top_hat_id(3);
    let immutable = vec![owner_hat(), arbitrator_hat()];

    let predicted = harness
        .client
        .predict_instance_address(ALLOWLIST_ID, &hat_id, &immutable)
        .unwrap();
    assert!(!harness
        .client
        .is_instance_deployed(ALLOWLIST_ID, &hat_id, &immutable)
        .await
        .unwrap());

    let result = harness
        .client
        .create_instance(allowlist_request(hat_id, accounts(&[])), &harness.deployer)
        .await
        .unwrap();
    assert_eq!(result.new_instance, predicted);
    assert!(harness
        .client
        .is_instance_deployed(ALLOWLIST_ID, &hat_id, &immutable)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_distinct_hats_get_distinct_instances() {
    let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
    let mut generator = HatIdGenerator::with_seed(0x5eed);
    let mut seen = std::collections::HashSet::new();

    for _ in 0..8 {
        let hat_id = generator.next_hat_id();
        let result = harness
            .client
            .create_instance_from_examples(HATTER_CLONE_ID, hat_id, &harness.deployer)
            .await
            .unwrap_or_else(|e| panic!("seed {}: {}", generator.seed(), e));
        assert!(seen.insert(result.new_instance));
    }
    assert_eq!(harness.chain.instance_count(), 8);
}

#[tokio::test]
async fn test_concurrent_creations_for_one_hat_create_once() {
    let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
    let hat_id = top_hat_id(9);

    let results = join_all((0..4).map(|_| {
        harness
            .client
            .create_instance_from_examples(HATTER_CLONE_ID, hat_id, &harness.deployer)
    }))
    .await;

    let results: Vec<InstanceResult> = results.into_iter().map(Result::unwrap).collect();
    assert!(results
        .iter()
        .all(|result| result.new_instance == results[0].new_instance));
    assert_eq!(results.iter().filter(|result| result.was_created()).count(), 1);
    assert_eq!(harness.chain.counters().submissions, 1);
    assert_eq!(harness.chain.instance_count(), 1);
}

#[tokio::test]
async fn test_interleaved_concurrent_creations_resolve_to_one_instance() {
    let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
    harness.chain.set_interleaved_submissions(true);
    let hat_id = top_hat_id(10);

    // Every call passes its code check before the first submission lands
    let results = join_all((0..4).map(|_| {
        harness
            .client
            .create_instance_from_examples(HATTER_CLONE_ID, hat_id, &harness.deployer)
    }))
    .await;

    let results: Vec<InstanceResult> = results.into_iter().map(Result::unwrap).collect();
    assert!(results
        .iter()
        .all(|result| result.new_instance == results[0].new_instance));
    assert_eq!(results.iter().filter(|result| result.was_created()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|result| result.outcome == CreationOutcome::AlreadyDeployed)
            .count(),
        3
    );

    let counters = harness.chain.counters();
    assert_eq!(counters.submissions, 4);
    assert_eq!(counters.reverts, 3);
    assert_eq!(harness.chain.instance_count(), 1);
}

#[tokio::test]
async fn test_swapped_immutable_args_are_a_different_instance() {
    let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
    let hat_id = top_hat_id(1);
    let straight = harness
        .client
        .predict_instance_address(ALLOWLIST_ID, &hat_id, &[owner_hat(), arbitrator_hat()])
        .unwrap();
    let swapped = harness
        .client
        .predict_instance_address(ALLOWLIST_ID, &hat_id, &[arbitrator_hat(), owner_hat()])
        .unwrap();
    assert_ne!(straight, swapped);
}

proptest! {
    #[test]
    fn test_mutable_args_only_change_init_data(
        season in any::<u64>(),
        other_season in any::<u64>(),
        delay in any::<u64>(),
    ) {
        prop_assume!(season != other_season);
        let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
        let module = harness.registry.get_module(SEASON_TOGGLE_ID).unwrap();
        let first = harness
            .client
            .validate_args(module, &[], &[NativeValue::from(season), NativeValue::from(delay)])
            .unwrap();
        let second = harness
            .client
            .validate_args(module, &[], &[NativeValue::from(other_season), NativeValue::from(delay)])
            .unwrap();
        prop_assert_eq!(first.packed_immutable, second.packed_immutable);
        prop_assert_ne!(first.init_data, second.init_data);
    }
}
