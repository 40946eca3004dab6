// Testing Utilities
//
// Hat id helpers and the harness that wires a TestChain to the client.

/// Hat id construction and seeded generation
pub mod hats;

/// Client, verifier and batch runner wired to one TestChain
pub mod harness;

pub use harness::{TestHarness, DEPLOYER_LABEL};
pub use hats::{child_hat_id, hat_id_from_str, top_hat_id, HatIdGenerator};
