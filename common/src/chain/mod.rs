// Chain access seams
//
// The client never talks to a node directly. Reads and transaction
// submission go through the two traits below so the transport, signing
// and fork orchestration stay with the caller.

use std::{
    fmt::{Display, Error, Formatter},
    str::FromStr,
};

use alloy_primitives::U256;
use async_trait::async_trait;
use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    abi::ContractInterface,
    args::NativeValue,
    crypto::{Address, Hash},
};

/// EVM chain identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChainId(u64);

impl ChainId {
    pub const MAINNET: ChainId = ChainId(1);
    pub const GOERLI: ChainId = ChainId(5);
    pub const GNOSIS: ChainId = ChainId(100);
    pub const POLYGON: ChainId = ChainId(137);
    pub const SEPOLIA: ChainId = ChainId(11155111);

    pub const fn new(id: u64) -> Self {
        ChainId(id)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    // ABI word used in salt derivation
    pub fn to_word(&self) -> [u8; 32] {
        U256::from(self.0).to_be_bytes::<32>()
    }

    /// Registry documents carry chain ids as decimal strings, sometimes as numbers
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64().map(ChainId),
            _ => None,
        }
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        ChainId(value)
    }
}

impl FromStr for ChainId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(ChainId)
    }
}

impl Display for ChainId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ChainId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'a> Deserialize<'a> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let value = Value::deserialize(deserializer)?;
        ChainId::from_json(&value)
            .ok_or_else(|| SerdeError::custom(format!("invalid chain id: {}", value)))
    }
}

/// Failure reported by a chain accessor
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    /// Network, node or signing failure; the request may be retried
    #[error("transport error: {0}")]
    Transport(String),

    /// The chain executed and rejected the call
    #[error("execution reverted: {0}")]
    Revert(String),
}

impl AccessError {
    pub fn is_transient(&self) -> bool {
        matches!(self, AccessError::Transport(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            AccessError::Transport(reason) | AccessError::Revert(reason) => reason,
        }
    }
}

/// A call to submit, independent of how it gets signed and sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub chain_id: ChainId,
    pub to: Address,
    pub data: Vec<u8>,
    pub value: U256,
    // Human readable summary for logs and signer prompts
    pub description: String,
}

/// Confirmation of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: Hash,
    pub block_number: u64,
    pub gas_used: u64,
}

/// Read-only view of the chain
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Call a view function and decode its single return value
    async fn read_field(
        &self,
        address: &Address,
        abi: &ContractInterface,
        field: &str,
        args: &[NativeValue],
    ) -> Result<NativeValue, AccessError>;

    /// Whether any contract code lives at `address`
    async fn has_code(&self, address: &Address) -> Result<bool, AccessError>;
}

/// Transaction submission
///
/// Resolves once the transaction is confirmed, or with `AccessError::Revert`
/// when it was mined but failed.
#[async_trait]
pub trait ChainWriter: Send + Sync {
    /// Opaque credential handed through untouched
    type Signer: Send + Sync;

    async fn submit(
        &self,
        intent: TransactionIntent,
        signer: &Self::Signer,
    ) -> Result<Receipt, AccessError>;
}
