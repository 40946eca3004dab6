use alloy_primitives::{keccak256, Keccak256, B256};

pub const HASH_SIZE: usize = 32; // 32 bytes / 256 bits

// Length of an ABI function selector
pub const SELECTOR_SIZE: usize = 4;

// Hash the concatenation of several byte slices without building the joined buffer
pub fn keccak256_concat(parts: &[&[u8]]) -> B256 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}

/// Compute the 4-byte function selector of a canonical signature
/// such as `createHatsModule(address,uint256,bytes,bytes)`
pub fn function_selector(signature: &str) -> [u8; SELECTOR_SIZE] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; SELECTOR_SIZE];
    selector.copy_from_slice(&hash[..SELECTOR_SIZE]);
    selector
}
