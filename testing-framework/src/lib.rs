//! # Hats Modules Testing
//!
//! In-process chain, registry fixtures and helpers for exercising the
//! Hats modules client without a node.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hats_modules_testing::prelude::*;
//!
//! #[tokio::test]
//! async fn test_hatter_clone() {
//!     let harness = TestHarness::new(ChainId::GNOSIS, &sample_registry_json()).unwrap();
//!     let hat_id = top_hat_id(1);
//!     let result = harness
//!         .client
//!         .create_instance_from_examples(HATTER_CLONE_ID, hat_id, &harness.deployer)
//!         .await
//!         .unwrap();
//!
//!     let module = harness.registry.get_module(HATTER_CLONE_ID).unwrap();
//!     assert!(harness
//!         .verifier()
//!         .verify_field(&result.new_instance, &module.abi, "hatId", &NativeValue::Uint(hat_id))
//!         .await
//!         .unwrap());
//! }
//! ```
//!
//! ## Components
//!
//! - [`chain::TestChain`]: reader and writer with fault injection
//! - [`fixtures`]: a registry covering every argument shape
//! - [`utilities`]: hat id helpers and [`utilities::TestHarness`]

#![warn(clippy::all)]

/// In-process chain implementing the client's reader and writer traits
pub mod chain;

/// Registry documents used across the integration tests
pub mod fixtures;

/// Shared helpers
pub mod utilities;

// Convenient re-exports for common usage
pub mod prelude;

pub use chain::{TestAccount, TestChain, TestChainBuilder};
pub use utilities::TestHarness;

/// Framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
