// Registry construction errors

use thiserror::Error;

/// Structural defects found while building a registry
///
/// Any of these fails the whole build; a partial registry is never returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The document is not valid JSON
    #[error("invalid registry document: {0}")]
    Json(String),

    /// The document root is not a mapping of module id to module
    #[error("registry document must be an object keyed by module id")]
    NotAnObject,

    /// A required field is absent
    #[error("module {module_id}: missing field {field}")]
    MissingField { module_id: String, field: String },

    /// A field is present with the wrong shape
    #[error("module {module_id}: field {field} must be {expected}")]
    InvalidField {
        module_id: String,
        field: String,
        expected: String,
    },

    /// The entry's own `id` disagrees with its key
    #[error("module {module_id}: id field {found:?} does not match its key")]
    IdMismatch { module_id: String, found: String },

    /// An address field failed validation
    #[error("module {module_id}: {field} has invalid address {value:?}: {reason}")]
    InvalidAddress {
        module_id: String,
        field: String,
        value: String,
        reason: String,
    },

    /// A deployment carries a chain id that is not an unsigned integer
    #[error("module {module_id}: invalid chain id {value}")]
    InvalidChainId { module_id: String, value: String },

    /// Two deployments of the same module target one chain
    #[error("module {module_id}: more than one deployment on chain {chain_id}")]
    DuplicateDeployment { module_id: String, chain_id: String },

    /// Neither the deployment nor the module provides an implementation address
    #[error("module {module_id}: deployment on chain {chain_id} has no address and the module has no implementationAddress")]
    MissingDeploymentAddress { module_id: String, chain_id: String },
}
