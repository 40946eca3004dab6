#![allow(clippy::module_inception)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::type_complexity)]

pub mod abi;
pub mod args;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod registry;
pub mod types;

// Instance creation, verification and batch processing
pub mod batch;
pub mod factory;
pub mod verifier;

pub use error::{ModulesError, ModulesResult};
