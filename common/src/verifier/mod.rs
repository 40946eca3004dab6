// State Verifier
//
// Reads a field back from a deployed instance and compares it with the
// value that was supplied at creation.

use std::sync::Arc;

use log::{debug, warn};

use crate::{
    abi::ContractInterface,
    args::NativeValue,
    chain::{AccessError, ChainReader},
    config::RetryPolicy,
    crypto::Address,
    error::{ModulesError, ModulesResult},
};

/// Field every Hats module instance exposes
pub const HAT_ID_FIELD: &str = "hatId";

pub struct StateVerifier<R: ChainReader> {
    reader: Arc<R>,
    retry: RetryPolicy,
}

impl<R: ChainReader> StateVerifier<R> {
    pub fn new(reader: Arc<R>, retry: RetryPolicy) -> Self {
        Self { reader, retry }
    }

    /// Read a no-argument view function, retrying transport failures
    ///
    /// Fails with `UnknownFunction` when `field` is not a function of `abi`.
    /// A revert is reported after the first attempt.
    pub async fn read_field(
        &self,
        address: &Address,
        abi: &ContractInterface,
        field: &str,
    ) -> ModulesResult<NativeValue> {
        if !abi.has_function(field) {
            return Err(ModulesError::UnknownFunction {
                name: field.to_string(),
            });
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.reader.read_field(address, abi, field, &[]).await {
                Ok(value) => return Ok(value),
                Err(AccessError::Transport(reason)) if attempt < max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    if log::log_enabled!(log::Level::Debug) {
                        debug!(
                            "reading {} at {} failed (attempt {}/{}): {}, retrying in {:?}",
                            field, address, attempt, max_attempts, reason, delay
                        );
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!("reading {} at {} failed: {}", field, address, e);
                    return Err(ModulesError::Read {
                        address: *address,
                        field: field.to_string(),
                        reverted: !e.is_transient(),
                        reason: e.reason().to_string(),
                        attempts: attempt,
                    });
                }
            }
        }
    }

    /// Whether `field` at `address` equals `expected`
    ///
    /// A mismatch is `Ok(false)`; read failures are errors.
    pub async fn verify_field(
        &self,
        address: &Address,
        abi: &ContractInterface,
        field: &str,
        expected: &NativeValue,
    ) -> ModulesResult<bool> {
        let actual = self.read_field(address, abi, field).await?;
        let matches = actual == *expected;
        if !matches {
            debug!(
                "{} at {} is {}, expected {}",
                field, address, actual, expected
            );
        }
        Ok(matches)
    }
}
