// Strict address parsing for registry documents and argument examples.
//
// `Address::from_str` accepts any casing and an optional prefix. Inputs
// coming from registry data must carry the `0x` prefix, and mixed-case
// input must satisfy its EIP-55 checksum.

use std::str::FromStr;

use alloy_primitives::Address;
use thiserror::Error;

pub const ADDRESS_SIZE: usize = 20; // 20 bytes / 160 bits

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,

    #[error("address must contain 40 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("address contains non-hex characters")]
    InvalidHex,

    #[error("address does not match its EIP-55 checksum")]
    BadChecksum,
}

/// Parse a `0x`-prefixed address
///
/// All-lowercase and all-uppercase hex are accepted as-is; mixed case
/// must match the EIP-55 checksum.
pub fn parse_address(input: &str) -> Result<Address, AddressError> {
    let body = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;

    if body.len() != ADDRESS_SIZE * 2 {
        return Err(AddressError::InvalidLength(body.len()));
    }
    if !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidHex);
    }
    let address = Address::from_str(body).map_err(|_| AddressError::InvalidHex)?;

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None)[2..] != *body {
        return Err(AddressError::BadChecksum);
    }

    Ok(address)
}
