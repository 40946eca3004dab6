// Width checks and string parsing for the EVM integer categories.
//
// Values are carried as `U256` and `I256` whatever the declared width;
// the width only bounds the range.

pub use alloy_primitives::{Sign, I256, U256};

pub const MAX_INTEGER_BITS: usize = 256;

/// Whether `bits` names a Solidity integer width (8..=256, multiple of 8)
pub fn valid_integer_width(bits: usize) -> bool {
    (8..=MAX_INTEGER_BITS).contains(&bits) && bits % 8 == 0
}

/// Whether an unsigned value is representable as a `uintN`
pub fn uint_fits_bits(value: &U256, bits: usize) -> bool {
    bits >= MAX_INTEGER_BITS || value.bit_len() <= bits
}

/// Whether a signed value is representable as an `intN`
pub fn int_fits_bits(value: &I256, bits: usize) -> bool {
    if bits == 0 {
        return false;
    }
    if bits >= MAX_INTEGER_BITS {
        return true;
    }
    let limit = U256::from(1u64) << (bits - 1);
    let magnitude = value.unsigned_abs();
    if value.is_negative() {
        magnitude <= limit
    } else {
        magnitude < limit
    }
}

/// Parse a decimal or `0x`-prefixed hex string into a `U256`
///
/// Returns `None` for empty input, stray characters or values above 2^256 - 1.
pub fn parse_u256(input: &str) -> Option<U256> {
    if let Some(hex_digits) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        if hex_digits.is_empty() || !hex_digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return U256::from_str_radix(hex_digits, 16).ok();
    }

    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(input, 10).ok()
}

/// Parse a signed decimal or hex string (`-0x10` is accepted) into an `I256`
pub fn parse_i256(input: &str) -> Option<I256> {
    let (sign, body) = match input.strip_prefix('-') {
        Some(rest) => (Sign::Negative, rest),
        None => (Sign::Positive, input),
    };
    let magnitude = parse_u256(body)?;
    I256::checked_from_sign_and_abs(sign, magnitude)
}
