// Hat id construction
//
// A hat id is 32 bytes: a 4-byte top hat domain followed by fourteen
// 2-byte levels, most significant first.

use alloy_primitives::U256;
use hats_modules_common::types::parse_u256;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Bits used by the top hat domain
pub const TOP_HAT_BITS: usize = 32;
/// Bits per level below the top hat
pub const LEVEL_BITS: usize = 16;
/// Levels below the top hat
pub const MAX_LEVELS: usize = 14;

/// Id of the top hat of `domain`
pub fn top_hat_id(domain: u32) -> U256 {
    U256::from(domain) << (256 - TOP_HAT_BITS)
}

/// Id of child `index` of `parent` at `level` (1 for direct children of a top hat)
pub fn child_hat_id(parent: U256, level: usize, index: u16) -> Option<U256> {
    if level == 0 || level > MAX_LEVELS || index == 0 {
        return None;
    }
    let shift = 256 - TOP_HAT_BITS - level * LEVEL_BITS;
    Some(parent | (U256::from(index) << shift))
}

/// Parse a hat id written as decimal or 0x hex
pub fn hat_id_from_str(value: &str) -> Option<U256> {
    parse_u256(value)
}

/// Reproducible hat ids for tests that need many distinct hats
pub struct HatIdGenerator {
    seed: u64,
    rng: StdRng,
}

impl HatIdGenerator {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Next top hat or first-level child, never zero
    pub fn next_hat_id(&mut self) -> U256 {
        let domain = self.rng.gen_range(1..=u32::MAX);
        let top = top_hat_id(domain);
        if self.rng.gen_bool(0.5) {
            let index = self.rng.gen_range(1..=u16::MAX);
            child_hat_id(top, 1, index).unwrap_or(top)
        } else {
            top
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_hat_layout() {
        assert_eq!(
            top_hat_id(1),
            hat_id_from_str("0x0000000100000000000000000000000000000000000000000000000000000000")
                .unwrap()
        );
    }

    #[test]
    fn test_child_hat_layout() {
        let child = child_hat_id(top_hat_id(1), 1, 2).unwrap();
        assert_eq!(
            child,
            hat_id_from_str("0x0000000100020000000000000000000000000000000000000000000000000000")
                .unwrap()
        );
        let deepest = child_hat_id(top_hat_id(1), MAX_LEVELS, 1).unwrap();
        assert_eq!(deepest & U256::from(0xffffu64), U256::from(1u64));
        assert!(child_hat_id(top_hat_id(1), 0, 1).is_none());
        assert!(child_hat_id(top_hat_id(1), 15, 1).is_none());
        assert!(child_hat_id(top_hat_id(1), 1, 0).is_none());
    }

    #[test]
    fn test_generator_is_reproducible() {
        let mut first = HatIdGenerator::with_seed(7);
        let mut second = HatIdGenerator::with_seed(7);
        for _ in 0..16 {
            let id = first.next_hat_id();
            assert!(!id.is_zero());
            assert_eq!(id, second.next_hat_id());
        }
    }
}
