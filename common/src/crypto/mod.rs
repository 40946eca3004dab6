mod address;
mod hash;

pub use address::{parse_address, AddressError, ADDRESS_SIZE};
pub use alloy_primitives::{keccak256, Address, B256 as Hash};
pub use hash::{function_selector, keccak256_concat, HASH_SIZE, SELECTOR_SIZE};
