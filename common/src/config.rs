use std::time::Duration;

use alloy_primitives::address;
use serde::{Deserialize, Serialize};

use crate::{
    chain::ChainId,
    crypto::Address,
    error::{ModulesError, ModulesResult},
};

pub const VERSION: &str = env!("BUILD_VERSION");

// Hats module factory, same address on every supported chain
pub const DEFAULT_FACTORY_ADDRESS: Address = address!("fE661c01891172046feE16D3a57c3Cf456729efA");

// Hats protocol contract, returned by `HATS()` on every module instance
pub const HATS_PROTOCOL_ADDRESS: Address = address!("3bc1A0Ad72417f2d411118085256fC53CBdDd137");

pub const DEFAULT_CHAIN_ID: ChainId = ChainId::MAINNET;

// A creation call that is not confirmed within this window is reported
// as ambiguous, never resubmitted
pub const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(60);

// Modules processed concurrently by the batch runner
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

// State reads
pub const DEFAULT_READ_ATTEMPTS: u32 = 3;
pub const DEFAULT_READ_INITIAL_BACKOFF: Duration = Duration::from_millis(200);
pub const DEFAULT_READ_MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Exponential backoff for transient read failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    #[serde(with = "duration_millis")]
    pub initial_backoff: Duration,
    #[serde(with = "duration_millis")]
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1 for the first retry)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_READ_ATTEMPTS,
            initial_backoff: DEFAULT_READ_INITIAL_BACKOFF,
            max_backoff: DEFAULT_READ_MAX_BACKOFF,
        }
    }
}

/// Client settings shared by the factory, the verifier and the batch runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Chain every instance is created on
    pub chain_id: ChainId,
    pub factory_address: Address,
    /// Hats protocol contract baked into every instance's immutable args
    pub hats_address: Address,
    #[serde(with = "duration_millis")]
    pub submission_timeout: Duration,
    pub max_concurrency: usize,
    pub read_retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            factory_address: DEFAULT_FACTORY_ADDRESS,
            hats_address: HATS_PROTOCOL_ADDRESS,
            submission_timeout: DEFAULT_SUBMISSION_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            read_retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn for_chain(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            ..Self::default()
        }
    }

    pub fn with_factory_address(mut self, factory_address: Address) -> Self {
        self.factory_address = factory_address;
        self
    }

    pub fn with_hats_address(mut self, hats_address: Address) -> Self {
        self.hats_address = hats_address;
        self
    }

    pub fn with_submission_timeout(mut self, timeout: Duration) -> Self {
        self.submission_timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_read_retry(mut self, read_retry: RetryPolicy) -> Self {
        self.read_retry = read_retry;
        self
    }

    pub fn validate(&self) -> ModulesResult<()> {
        if self.max_concurrency == 0 {
            return Err(ModulesError::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.read_retry.max_attempts == 0 {
            return Err(ModulesError::Config(
                "read_retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.submission_timeout.is_zero() {
            return Err(ModulesError::Config(
                "submission_timeout must be positive".to_string(),
            ));
        }
        if self.factory_address.is_zero() || self.hats_address.is_zero() {
            return Err(ModulesError::Config(
                "factory_address and hats_address must not be the zero address".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'a, D: Deserializer<'a>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_default_addresses() {
        assert_eq!(
            DEFAULT_FACTORY_ADDRESS,
            Address::from_str("0xfE661c01891172046feE16D3a57c3Cf456729efA").unwrap()
        );
        assert_eq!(
            HATS_PROTOCOL_ADDRESS,
            Address::from_str("0x3bc1A0Ad72417f2d411118085256fC53CBdDd137").unwrap()
        );
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(1000),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(5), Duration::from_millis(1000));
        assert_eq!(policy.backoff(64), Duration::from_millis(1000));
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(matches!(
            ClientConfig::default().with_max_concurrency(0).validate(),
            Err(ModulesError::Config(_))
        ));
        assert!(ClientConfig::default()
            .with_read_retry(RetryPolicy {
                max_attempts: 0,
                ..RetryPolicy::default()
            })
            .validate()
            .is_err());
        assert!(ClientConfig::default()
            .with_submission_timeout(Duration::ZERO)
            .validate()
            .is_err());
        assert!(ClientConfig::default()
            .with_factory_address(Address::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_serde_uses_millis_and_defaults() {
        let config: ClientConfig = serde_json::from_str(
            r#"{ "chainId": "100", "submissionTimeout": 1500, "readRetry": { "maxAttempts": 5 } }"#,
        )
        .unwrap();
        assert_eq!(config.chain_id, ChainId::GNOSIS);
        assert_eq!(config.submission_timeout, Duration::from_millis(1500));
        assert_eq!(config.read_retry.max_attempts, 5);
        assert_eq!(config.read_retry.initial_backoff, DEFAULT_READ_INITIAL_BACKOFF);
        assert_eq!(config.factory_address, DEFAULT_FACTORY_ADDRESS);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["submissionTimeout"], 1500);
        assert_eq!(json["chainId"], 100);
    }
}
